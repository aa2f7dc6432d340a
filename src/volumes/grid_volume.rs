// Copyright @yucwang 2026

use crate::core::volume::{Volume, VolumeAccessor};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::volumes::{wrap_coord3, VolumeFilterMode, VolumeLoadError, VolumeWrapMode};
use std::fs;
use std::path::Path;

/// Dense scalar grid in Mitsuba's `.vol` layout (x fastest, then y, then z).
/// Only the first channel is used as density.
pub struct GridVolume {
    data: Vec<Float>,
    xres: usize,
    yres: usize,
    zres: usize,
    channels: usize,
    bbox: AABB,
    use_grid_bbox: bool,
    max_value: Float,
    filter_mode: VolumeFilterMode,
    wrap_mode: VolumeWrapMode,
}

impl GridVolume {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, VolumeLoadError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| VolumeLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let grid = Self::from_bytes(&bytes)?;
        log::info!(
            "Loaded grid volume {} ({}x{}x{}, {} channels, max {}).",
            path.display(),
            grid.xres,
            grid.yres,
            grid.zres,
            grid.channels,
            grid.max_value
        );
        Ok(grid)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VolumeLoadError> {
        if bytes.len() < 4 {
            return Err(VolumeLoadError::InvalidHeader);
        }
        if &bytes[0..3] != b"VOL" {
            return Err(VolumeLoadError::InvalidHeader);
        }
        let version = bytes[3];
        if version != 3 {
            return Err(VolumeLoadError::UnsupportedVersion(version));
        }

        let mut cursor = 4usize;
        let encoding = read_i32(bytes, &mut cursor)?;
        let xres = read_i32(bytes, &mut cursor)?;
        let yres = read_i32(bytes, &mut cursor)?;
        let zres = read_i32(bytes, &mut cursor)?;
        let channels = read_i32(bytes, &mut cursor)?;

        if encoding != 1 {
            return Err(VolumeLoadError::UnsupportedEncoding(encoding));
        }
        if xres <= 0 || yres <= 0 || zres <= 0 || channels <= 0 {
            return Err(VolumeLoadError::InvalidDimensions);
        }
        if channels != 1 && channels != 3 && channels != 6 {
            return Err(VolumeLoadError::UnsupportedChannels(channels));
        }

        let min_x = read_f32(bytes, &mut cursor)?;
        let min_y = read_f32(bytes, &mut cursor)?;
        let min_z = read_f32(bytes, &mut cursor)?;
        let max_x = read_f32(bytes, &mut cursor)?;
        let max_y = read_f32(bytes, &mut cursor)?;
        let max_z = read_f32(bytes, &mut cursor)?;
        let bbox = AABB::new(
            Vector3f::new(min_x, min_y, min_z),
            Vector3f::new(max_x, max_y, max_z),
        );

        let (xres, yres, zres) = (xres as usize, yres as usize, zres as usize);
        let channels = channels as usize;
        let expected = voxel_count(xres, yres, zres, channels)?;
        let mut data = Vec::with_capacity(expected);
        for _ in 0..expected {
            data.push(read_f32(bytes, &mut cursor)?);
        }

        Self::from_data(data, xres, yres, zres, channels, bbox)
    }

    pub fn from_data(
        data: Vec<Float>,
        xres: usize,
        yres: usize,
        zres: usize,
        channels: usize,
        bbox: AABB,
    ) -> Result<Self, VolumeLoadError> {
        if xres == 0 || yres == 0 || zres == 0 || channels == 0 {
            return Err(VolumeLoadError::InvalidDimensions);
        }
        let expected = voxel_count(xres, yres, zres, channels)?;
        if data.len() != expected {
            return Err(VolumeLoadError::SizeMismatch { expected, got: data.len() });
        }

        let max_value = data
            .iter()
            .step_by(channels)
            .fold(0.0 as Float, |acc, &v| acc.max(v));

        Ok(Self {
            data,
            xres,
            yres,
            zres,
            channels,
            bbox,
            use_grid_bbox: true,
            max_value,
            filter_mode: VolumeFilterMode::Trilinear,
            wrap_mode: VolumeWrapMode::Clamp,
        })
    }

    pub fn set_filter_mode(&mut self, filter_mode: VolumeFilterMode) {
        self.filter_mode = filter_mode;
    }

    pub fn set_wrap_mode(&mut self, wrap_mode: VolumeWrapMode) {
        self.wrap_mode = wrap_mode;
    }

    pub fn set_use_grid_bbox(&mut self, use_grid_bbox: bool) {
        self.use_grid_bbox = use_grid_bbox;
    }

    pub fn resolution(&self) -> (usize, usize, usize) {
        (self.xres, self.yres, self.zres)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn mean_value(&self) -> Float {
        let count = self.xres * self.yres * self.zres;
        let sum: f64 = self.data.iter().step_by(self.channels).map(|&v| v as f64).sum();
        (sum / count as f64) as Float
    }

    fn fetch(&self, x: usize, y: usize, z: usize) -> Float {
        let idx = ((z * self.yres + y) * self.xres + x) * self.channels;
        self.data[idx]
    }

    fn local_bbox(&self) -> AABB {
        if self.use_grid_bbox {
            self.bbox
        } else {
            AABB::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(1.0, 1.0, 1.0))
        }
    }

    /// Continuous voxel coordinates of `p_local`; voxel centers sit on integers.
    /// `None` when the grid bbox is in use and `p_local` lies outside it.
    fn voxel_coords(&self, p_local: Vector3f) -> Option<Vector3f> {
        let mut p = p_local;
        if self.use_grid_bbox {
            let diag = self.bbox.diagnal();
            if diag.x.abs() < 1e-8 || diag.y.abs() < 1e-8 || diag.z.abs() < 1e-8 {
                return None;
            }
            p = Vector3f::new(
                (p.x - self.bbox.p_min.x) / diag.x,
                (p.y - self.bbox.p_min.y) / diag.y,
                (p.z - self.bbox.p_min.z) / diag.z,
            );
            // No density outside the grid's own bounds.
            if p.iter().any(|&c| !(0.0..=1.0).contains(&c)) {
                return None;
            }
        }

        let p = wrap_coord3(p, self.wrap_mode);
        Some(Vector3f::new(
            p.x * (self.xres as Float - 1.0),
            p.y * (self.yres as Float - 1.0),
            p.z * (self.zres as Float - 1.0),
        ))
    }

    fn clamp_index(&self, x: Float, y: Float, z: Float) -> [usize; 3] {
        [
            (x as isize).clamp(0, self.xres as isize - 1) as usize,
            (y as isize).clamp(0, self.yres as isize - 1) as usize,
            (z as isize).clamp(0, self.zres as isize - 1) as usize,
        ]
    }

    fn sample_nearest(&self, v: Vector3f) -> Float {
        let [x, y, z] = self.clamp_index((v.x + 0.5).floor(), (v.y + 0.5).floor(), (v.z + 0.5).floor());
        self.fetch(x, y, z)
    }

    fn sample_trilinear(&self, v: Vector3f) -> Float {
        let x0 = v.x.floor();
        let y0 = v.y.floor();
        let z0 = v.z.floor();

        let tx = v.x - x0;
        let ty = v.y - y0;
        let tz = v.z - z0;

        let [x0u, y0u, z0u] = self.clamp_index(x0, y0, z0);
        let [x1u, y1u, z1u] = self.clamp_index(x0 + 1.0, y0 + 1.0, z0 + 1.0);

        let c000 = self.fetch(x0u, y0u, z0u);
        let c100 = self.fetch(x1u, y0u, z0u);
        let c010 = self.fetch(x0u, y1u, z0u);
        let c110 = self.fetch(x1u, y1u, z0u);
        let c001 = self.fetch(x0u, y0u, z1u);
        let c101 = self.fetch(x1u, y0u, z1u);
        let c011 = self.fetch(x0u, y1u, z1u);
        let c111 = self.fetch(x1u, y1u, z1u);

        let c00 = c000 * (1.0 - tx) + c100 * tx;
        let c10 = c010 * (1.0 - tx) + c110 * tx;
        let c01 = c001 * (1.0 - tx) + c101 * tx;
        let c11 = c011 * (1.0 - tx) + c111 * tx;

        let c0 = c00 * (1.0 - ty) + c10 * ty;
        let c1 = c01 * (1.0 - ty) + c11 * ty;

        c0 * (1.0 - tz) + c1 * tz
    }

    /// Picks one of the eight trilinear neighbours with probability equal to
    /// its interpolation weight.
    fn stochastic_index(&self, v: Vector3f, u: Vector3f) -> [usize; 3] {
        match self.filter_mode {
            VolumeFilterMode::Nearest => {
                self.clamp_index((v.x + 0.5).floor(), (v.y + 0.5).floor(), (v.z + 0.5).floor())
            }
            VolumeFilterMode::Trilinear => {
                self.clamp_index((v.x + u.x).floor(), (v.y + u.y).floor(), (v.z + u.z).floor())
            }
        }
    }
}

/// Lookup state for one traversal; remembers the last voxel it fetched.
pub struct GridAccessor<'a> {
    grid: &'a GridVolume,
    cached: Option<([usize; 3], Float)>,
    lookups: usize,
}

impl Volume for GridVolume {
    type Accessor<'a> = GridAccessor<'a>;

    fn accessor(&self) -> GridAccessor<'_> {
        GridAccessor { grid: self, cached: None, lookups: 0 }
    }

    fn max_value(&self) -> Float {
        self.max_value
    }

    fn eval(&self, p_local: Vector3f) -> Float {
        let v = match self.voxel_coords(p_local) {
            Some(v) => v,
            None => return 0.0,
        };

        match self.filter_mode {
            VolumeFilterMode::Nearest => self.sample_nearest(v),
            VolumeFilterMode::Trilinear => self.sample_trilinear(v),
        }
    }

    fn bbox(&self) -> Option<AABB> {
        Some(self.local_bbox())
    }
}

impl<'a> VolumeAccessor for GridAccessor<'a> {
    fn lookup_stochastic(&mut self, p_local: Vector3f, u: Vector3f) -> Float {
        self.lookups += 1;
        let v = match self.grid.voxel_coords(p_local) {
            Some(v) => v,
            None => return 0.0,
        };

        let idx = self.grid.stochastic_index(v, u);
        if let Some((cached_idx, value)) = self.cached {
            if cached_idx == idx {
                return value;
            }
        }
        let value = self.grid.fetch(idx[0], idx[1], idx[2]);
        self.cached = Some((idx, value));
        value
    }

    fn lookups(&self) -> usize {
        self.lookups
    }
}

fn voxel_count(xres: usize, yres: usize, zres: usize, channels: usize) -> Result<usize, VolumeLoadError> {
    xres.checked_mul(yres)
        .and_then(|v| v.checked_mul(zres))
        .and_then(|v| v.checked_mul(channels))
        .ok_or(VolumeLoadError::Overflow)
}

fn read_i32(bytes: &[u8], cursor: &mut usize) -> Result<i32, VolumeLoadError> {
    if *cursor + 4 > bytes.len() {
        return Err(VolumeLoadError::UnexpectedEof("i32"));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(i32::from_le_bytes(buf))
}

fn read_f32(bytes: &[u8], cursor: &mut usize) -> Result<Float, VolumeLoadError> {
    if *cursor + 4 > bytes.len() {
        return Err(VolumeLoadError::UnexpectedEof("f32"));
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[*cursor..*cursor + 4]);
    *cursor += 4;
    Ok(Float::from_le_bytes(buf))
}
