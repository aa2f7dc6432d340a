// Copyright @yucwang 2026

pub mod const_volume;
pub mod grid_volume;

use crate::core::volume::{Volume, VolumeAccessor};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use thiserror::Error;

use self::const_volume::{ConstantAccessor, ConstantVolume};
use self::grid_volume::{GridAccessor, GridVolume};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeFilterMode {
    Nearest,
    Trilinear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeWrapMode {
    Repeat,
    Mirror,
    Clamp,
}

#[derive(Debug, Error)]
pub enum VolumeLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid vol header")]
    InvalidHeader,
    #[error("unsupported vol version: {0}")]
    UnsupportedVersion(u8),
    #[error("unsupported vol encoding: {0}")]
    UnsupportedEncoding(i32),
    #[error("unsupported vol channels: {0}")]
    UnsupportedChannels(i32),
    #[error("vol dimensions must be positive")]
    InvalidDimensions,
    #[error("vol dimensions overflow")]
    Overflow,
    #[error("unexpected eof while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("grid holds {got} values, expected {expected}")]
    SizeMismatch { expected: usize, got: usize },
}

/// Either kind of density field a scene file can reference.
pub enum SceneVolume {
    Constant(ConstantVolume),
    Grid(GridVolume),
}

pub enum SceneVolumeAccessor<'a> {
    Constant(ConstantAccessor),
    Grid(GridAccessor<'a>),
}

impl Volume for SceneVolume {
    type Accessor<'a> = SceneVolumeAccessor<'a>;

    fn accessor(&self) -> SceneVolumeAccessor<'_> {
        match self {
            SceneVolume::Constant(v) => SceneVolumeAccessor::Constant(v.accessor()),
            SceneVolume::Grid(v) => SceneVolumeAccessor::Grid(v.accessor()),
        }
    }

    fn max_value(&self) -> Float {
        match self {
            SceneVolume::Constant(v) => v.max_value(),
            SceneVolume::Grid(v) => v.max_value(),
        }
    }

    fn eval(&self, p_local: Vector3f) -> Float {
        match self {
            SceneVolume::Constant(v) => v.eval(p_local),
            SceneVolume::Grid(v) => v.eval(p_local),
        }
    }

    fn bbox(&self) -> Option<AABB> {
        match self {
            SceneVolume::Constant(v) => v.bbox(),
            SceneVolume::Grid(v) => v.bbox(),
        }
    }
}

impl<'a> VolumeAccessor for SceneVolumeAccessor<'a> {
    fn lookup_stochastic(&mut self, p_local: Vector3f, u: Vector3f) -> Float {
        match self {
            SceneVolumeAccessor::Constant(a) => a.lookup_stochastic(p_local, u),
            SceneVolumeAccessor::Grid(a) => a.lookup_stochastic(p_local, u),
        }
    }

    fn lookups(&self) -> usize {
        match self {
            SceneVolumeAccessor::Constant(a) => a.lookups(),
            SceneVolumeAccessor::Grid(a) => a.lookups(),
        }
    }
}

impl From<ConstantVolume> for SceneVolume {
    fn from(v: ConstantVolume) -> Self {
        SceneVolume::Constant(v)
    }
}

impl From<GridVolume> for SceneVolume {
    fn from(v: GridVolume) -> Self {
        SceneVolume::Grid(v)
    }
}

fn wrap_coord(value: Float, mode: VolumeWrapMode) -> Float {
    match mode {
        VolumeWrapMode::Clamp => value.clamp(0.0, 1.0),
        VolumeWrapMode::Repeat => {
            let mut v = value - value.floor();
            if v < 0.0 {
                v += 1.0;
            }
            v
        }
        VolumeWrapMode::Mirror => {
            let mut v = value % 2.0;
            if v < 0.0 {
                v += 2.0;
            }
            if v > 1.0 {
                2.0 - v
            } else {
                v
            }
        }
    }
}

pub(crate) fn wrap_coord3(value: Vector3f, mode: VolumeWrapMode) -> Vector3f {
    Vector3f::new(
        wrap_coord(value.x, mode),
        wrap_coord(value.y, mode),
        wrap_coord(value.z, mode),
    )
}
