// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use crate::core::medium::Medium;
use crate::core::scene::Scene;
use crate::core::volume::Volume;
use crate::emitters::directional::DirectionalEmitter;
use crate::integrators::IntegratorKind;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::transform::Transform;
use crate::sensors::perspective::PerspectiveCamera;
use crate::volumes::const_volume::ConstantVolume;
use crate::volumes::grid_volume::GridVolume;
use crate::volumes::{SceneVolume, VolumeFilterMode, VolumeLoadError, VolumeWrapMode};

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("xml error: {0}")]
    Xml(String),
    #[error("{0}")]
    Parse(String),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("unsupported {0}: {1}")]
    Unsupported(&'static str, String),
    #[error(transparent)]
    Volume(#[from] VolumeLoadError),
}

pub struct SceneLoadResult {
    pub scene: Scene<SceneVolume>,
    pub integrator: Option<IntegratorKind>,
    pub samples_per_pixel: Option<u32>,
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<Scene<SceneVolume>, SceneLoadError> {
    let result = load_scene_with_settings(path)?;
    Ok(result.scene)
}

pub fn load_scene_with_settings<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult, SceneLoadError> {
    let path = path.as_ref();
    log::info!("Loading scene from {}.", path.display());
    let xml = fs::read_to_string(path).map_err(|source| SceneLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_scene(&xml, base_dir)
}

/// Parses a Mitsuba-style scene description. Relative file names are
/// resolved against `base_dir`.
pub fn parse_scene(xml: &str, base_dir: &Path) -> Result<SceneLoadResult, SceneLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut parser = SceneParser::new(base_dir);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => parser.start(&e)?,
            Ok(Event::Empty(e)) => {
                parser.start(&e)?;
                parser.end(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => parser.end(e.name().as_ref())?,
            Err(e) => return Err(SceneLoadError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    let result = parser.finish();
    log::info!(
        "Scene loaded: {} media, {} sensors, {} emitters.",
        result.scene.count(),
        result.scene.sensor_count(),
        result.scene.emitters().len()
    );
    if result.scene.count() > 1 {
        log::warn!("Only the first of {} media takes part in volume sampling.", result.scene.count());
    }
    Ok(result)
}

/// An open XML element and everything collected from its children so far.
struct Element {
    tag: String,
    kind: String,
    name: Option<String>,
    props: HashMap<String, String>,
    to_world: Transform,
    lookat: Option<(Vector3f, Vector3f, Vector3f)>,
    children: Vec<Element>,
}

impl Element {
    fn new(tag: &str, attrs: &HashMap<String, String>) -> Self {
        Self {
            tag: tag.to_string(),
            kind: attrs.get("type").cloned().unwrap_or_default(),
            name: attrs.get("name").cloned(),
            props: HashMap::new(),
            to_world: Transform::default(),
            lookat: None,
            children: Vec::new(),
        }
    }

    fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    fn float(&self, name: &str) -> Result<Option<Float>, SceneLoadError> {
        self.props.get(name).map(|v| parse_float(v)).transpose()
    }

    fn vec3(&self, name: &str) -> Result<Option<Vector3f>, SceneLoadError> {
        self.props.get(name).map(|v| parse_vec3(v)).transpose()
    }

    /// An `rgb` triple or a single `float` broadcast to all channels.
    fn color(&self, name: &str) -> Result<Option<Vector3f>, SceneLoadError> {
        match self.props.get(name) {
            Some(v) if v.contains(',') => parse_vec3(v).map(Some),
            Some(v) => {
                let f = parse_float(v)?;
                Ok(Some(Vector3f::new(f, f, f)))
            }
            None => Ok(None),
        }
    }
}

const CONTAINERS: [&str; 10] = [
    "scene", "integrator", "sensor", "film", "sampler", "emitter", "medium", "phase", "volume", "transform",
];

struct SceneParser {
    base_dir: PathBuf,
    defaults: HashMap<String, String>,
    stack: Vec<Element>,
    scene: Scene<SceneVolume>,
    integrator: Option<IntegratorKind>,
    samples_per_pixel: Option<u32>,
}

impl SceneParser {
    fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            defaults: HashMap::new(),
            stack: Vec::new(),
            scene: Scene::new(),
            integrator: None,
            samples_per_pixel: None,
        }
    }

    fn finish(self) -> SceneLoadResult {
        SceneLoadResult {
            scene: self.scene,
            integrator: self.integrator,
            samples_per_pixel: self.samples_per_pixel,
        }
    }

    fn start(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let attrs = attributes(e, &self.defaults)?;

        if tag == "default" {
            if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                self.defaults.insert(k.clone(), v.clone());
            }
            return Ok(());
        }
        if CONTAINERS.contains(&tag.as_str()) {
            self.stack.push(Element::new(&tag, &attrs));
            return Ok(());
        }

        let top = match self.stack.last_mut() {
            Some(top) => top,
            None => return Ok(()),
        };
        match tag.as_str() {
            "float" | "integer" | "boolean" | "string" | "rgb" | "spectrum" | "vector" | "point" => {
                let name = attrs.get("name").cloned().ok_or(SceneLoadError::MissingField("property.name"))?;
                let value = match attrs.get("value") {
                    Some(v) => v.clone(),
                    None => {
                        let x = attrs.get("x").map(String::as_str).unwrap_or("0");
                        let y = attrs.get("y").map(String::as_str).unwrap_or("0");
                        let z = attrs.get("z").map(String::as_str).unwrap_or("0");
                        format!("{},{},{}", x, y, z)
                    }
                };
                top.props.insert(name, value);
            }
            "translate" if top.tag == "transform" => {
                let t = Vector3f::new(
                    attr_float(&attrs, "x", 0.0)?,
                    attr_float(&attrs, "y", 0.0)?,
                    attr_float(&attrs, "z", 0.0)?,
                );
                top.to_world = Transform::translate(&t).then(&top.to_world);
            }
            "scale" if top.tag == "transform" => {
                let s = match attrs.get("value") {
                    Some(v) => {
                        let u = parse_float(v)?;
                        Vector3f::new(u, u, u)
                    }
                    None => Vector3f::new(
                        attr_float(&attrs, "x", 1.0)?,
                        attr_float(&attrs, "y", 1.0)?,
                        attr_float(&attrs, "z", 1.0)?,
                    ),
                };
                top.to_world = Transform::scale(&s).then(&top.to_world);
            }
            "lookat" if top.tag == "transform" => {
                let origin = parse_vec3(attrs.get("origin").ok_or(SceneLoadError::MissingField("lookat.origin"))?)?;
                let target = parse_vec3(attrs.get("target").ok_or(SceneLoadError::MissingField("lookat.target"))?)?;
                let up = match attrs.get("up") {
                    Some(v) => parse_vec3(v)?,
                    None => Vector3f::new(0.0, 1.0, 0.0),
                };
                top.lookat = Some((origin, target, up));
            }
            other => log::debug!("Ignoring <{}> inside <{}>.", other, top.tag),
        }
        Ok(())
    }

    fn end(&mut self, name: &[u8]) -> Result<(), SceneLoadError> {
        let tag = String::from_utf8_lossy(name).to_string();
        if !CONTAINERS.contains(&tag.as_str()) {
            return Ok(());
        }
        let element = match self.stack.pop() {
            Some(element) => element,
            None => return Err(SceneLoadError::Xml(format!("unbalanced </{}>", tag))),
        };

        match element.tag.as_str() {
            "transform" => {
                if let Some(parent) = self.stack.last_mut() {
                    if element.name.as_deref().unwrap_or("to_world") == "to_world" {
                        parent.to_world = element.to_world;
                        parent.lookat = element.lookat;
                    }
                }
            }
            "film" | "sampler" | "phase" | "volume" => {
                if let Some(parent) = self.stack.last_mut() {
                    parent.children.push(element);
                }
            }
            "integrator" => self.build_integrator(&element)?,
            "sensor" => self.build_sensor(&element)?,
            "emitter" => self.build_emitter(&element)?,
            "medium" => self.build_medium(&element)?,
            _ => {}
        }
        Ok(())
    }

    fn build_integrator(&mut self, element: &Element) -> Result<(), SceneLoadError> {
        let kind = element
            .kind
            .parse::<IntegratorKind>()
            .map_err(|_| SceneLoadError::Unsupported("integrator", element.kind.clone()))?;
        self.integrator = Some(kind);
        if let Some(spp) = element.props.get("sample_count") {
            self.samples_per_pixel = Some(parse_u32(spp)?);
        }
        Ok(())
    }

    fn build_sensor(&mut self, element: &Element) -> Result<(), SceneLoadError> {
        if element.kind != "perspective" {
            return Err(SceneLoadError::Unsupported("sensor", element.kind.clone()));
        }
        let fov_deg = element.float("fov")?.ok_or(SceneLoadError::MissingField("sensor.fov"))?;
        let near_clip = element.float("near_clip")?.unwrap_or(1e-2);
        let far_clip = element.float("far_clip")?.unwrap_or(1e4);

        let (origin, target, up) = match element.lookat {
            Some(lookat) => lookat,
            None => (
                element.to_world.apply_point(Vector3f::zeros()),
                element.to_world.apply_point(Vector3f::new(0.0, 0.0, 1.0)),
                element.to_world.apply_vector(Vector3f::new(0.0, 1.0, 0.0)),
            ),
        };

        let (mut width, mut height) = (768, 576);
        if let Some(film) = element.child("film") {
            if let Some(w) = film.props.get("width") {
                width = parse_usize(w)?;
            }
            if let Some(h) = film.props.get("height") {
                height = parse_usize(h)?;
            }
        }
        if let Some(sampler) = element.child("sampler") {
            if let Some(spp) = sampler.props.get("sample_count") {
                self.samples_per_pixel = Some(parse_u32(spp)?);
            }
        }

        let fov_rad = fov_deg * std::f32::consts::PI / 180.0;
        let camera = PerspectiveCamera::new(origin, target, up, fov_rad, width, height, near_clip, far_clip);
        self.scene.add_sensor(Box::new(camera));
        Ok(())
    }

    fn build_emitter(&mut self, element: &Element) -> Result<(), SceneLoadError> {
        match element.kind.as_str() {
            "directional" => {
                let direction = element.vec3("direction")?.ok_or(SceneLoadError::MissingField("emitter.direction"))?;
                let irradiance = element.color("irradiance")?.ok_or(SceneLoadError::MissingField("emitter.irradiance"))?;
                self.scene.add_emitter(DirectionalEmitter::new(direction, irradiance));
            }
            "constant" => {
                let radiance = element.color("radiance")?.ok_or(SceneLoadError::MissingField("emitter.radiance"))?;
                self.scene.set_background(radiance);
            }
            other => log::warn!("Skipping unsupported emitter type {}.", other),
        }
        Ok(())
    }

    fn build_medium(&mut self, element: &Element) -> Result<(), SceneLoadError> {
        let (volume, volume_to_world) = match element.kind.as_str() {
            "homogeneous" => {
                let sigma_t = element.float("sigma_t")?.unwrap_or(1.0);
                (SceneVolume::from(ConstantVolume::new(sigma_t)), Transform::default())
            }
            "heterogeneous" => {
                let density = element
                    .children
                    .iter()
                    .find(|c| c.tag == "volume" && c.name.as_deref().unwrap_or("density") == "density")
                    .ok_or(SceneLoadError::MissingField("medium.density"))?;
                (self.build_volume(density)?, density.to_world)
            }
            other => return Err(SceneLoadError::Unsupported("medium", other.to_string())),
        };

        let has_local_bbox = volume.bbox().is_some();
        let mut medium = Medium::new(Arc::new(volume)).with_transform(element.to_world.then(&volume_to_world));

        let bbox_min = element.vec3("bbox_min")?;
        let bbox_max = element.vec3("bbox_max")?;
        match (bbox_min, bbox_max) {
            (Some(p_min), Some(p_max)) => medium = medium.with_bbox(AABB::new(p_min, p_max)),
            _ if !has_local_bbox => return Err(SceneLoadError::MissingField("medium.bbox_min/bbox_max")),
            _ => {}
        }

        if let Some(scale) = element.float("scale")? {
            if scale < 0.0 {
                return Err(SceneLoadError::Parse(format!("negative density scale: {}", scale)));
            }
            medium = medium.with_scale(scale);
        }
        let albedo = match element.color("albedo")? {
            Some(albedo) => Some(albedo),
            None => match element.children.iter().find(|c| c.tag == "volume" && c.name.as_deref() == Some("albedo")) {
                Some(v) => v.color("value")?,
                None => None,
            },
        };
        if let Some(albedo) = albedo {
            medium = medium.with_albedo(albedo);
        }
        if let Some(phase) = element.child("phase") {
            match phase.kind.as_str() {
                "hg" => medium = medium.with_anisotropy(phase.float("g")?.unwrap_or(0.0)),
                "isotropic" => {}
                other => return Err(SceneLoadError::Unsupported("phase", other.to_string())),
            }
        }

        log::debug!(
            "Medium bounds {:?} - {:?}, majorant {}.",
            medium.bbox().p_min.as_slice(),
            medium.bbox().p_max.as_slice(),
            medium.majorant()
        );
        self.scene.add_medium(medium);
        Ok(())
    }

    fn build_volume(&self, element: &Element) -> Result<SceneVolume, SceneLoadError> {
        match element.kind.as_str() {
            "constvolume" => {
                let value = element.float("value")?.unwrap_or(1.0);
                let mut volume = ConstantVolume::new(value);
                if let Some(max_value) = element.float("max_value")? {
                    volume = volume.with_max_value(max_value);
                }
                Ok(SceneVolume::from(volume))
            }
            "gridvolume" => {
                let filename = element.props.get("filename").ok_or(SceneLoadError::MissingField("gridvolume.filename"))?;
                let path = if Path::new(filename).is_absolute() {
                    PathBuf::from(filename)
                } else {
                    self.base_dir.join(filename)
                };
                let mut grid = GridVolume::from_file(&path)?;
                if let Some(filter) = element.props.get("filter_type") {
                    grid.set_filter_mode(match filter.as_str() {
                        "nearest" => VolumeFilterMode::Nearest,
                        "trilinear" => VolumeFilterMode::Trilinear,
                        other => return Err(SceneLoadError::Unsupported("filter_type", other.to_string())),
                    });
                }
                if let Some(wrap) = element.props.get("wrap_mode") {
                    grid.set_wrap_mode(match wrap.as_str() {
                        "repeat" => VolumeWrapMode::Repeat,
                        "mirror" => VolumeWrapMode::Mirror,
                        "clamp" => VolumeWrapMode::Clamp,
                        other => return Err(SceneLoadError::Unsupported("wrap_mode", other.to_string())),
                    });
                }
                if let Some(use_bbox) = element.props.get("use_grid_bbox") {
                    grid.set_use_grid_bbox(parse_bool(use_bbox)?);
                }
                Ok(SceneVolume::from(grid))
            }
            other => Err(SceneLoadError::Unsupported("volume", other.to_string())),
        }
    }
}

fn attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> Result<HashMap<String, String>, SceneLoadError> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SceneLoadError::Xml(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value().map_err(|err| SceneLoadError::Xml(err.to_string()))?;
        out.insert(key, resolve_value(&value, defaults));
    }
    Ok(out)
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn attr_float(attrs: &HashMap<String, String>, key: &str, fallback: Float) -> Result<Float, SceneLoadError> {
    attrs.get(key).map(|v| parse_float(v)).unwrap_or(Ok(fallback))
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse::<Float>().map_err(|_| SceneLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_u32(value: &str) -> Result<u32, SceneLoadError> {
    value.trim().parse::<u32>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_usize(value: &str) -> Result<usize, SceneLoadError> {
    value.trim().parse::<usize>().map_err(|_| SceneLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_bool(value: &str) -> Result<bool, SceneLoadError> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(SceneLoadError::Parse(format!("invalid boolean: {}", value))),
    }
}

fn parse_vec3(value: &str) -> Result<Vector3f, SceneLoadError> {
    let mut parts = value.split(|c: char| c == ',' || c.is_whitespace()).filter(|s| !s.is_empty());
    let mut next = || parts.next().ok_or_else(|| SceneLoadError::Parse(format!("invalid vec3: {}", value)));
    let x = parse_float(next()?)?;
    let y = parse_float(next()?)?;
    let z = parse_float(next()?)?;
    Ok(Vector3f::new(x, y, z))
}
