// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::core::sensor::Sensor;
use crate::core::volume::Volume;
use crate::emitters::directional::DirectionalEmitter;
use crate::math::constants::Vector3f;

/// Registry of everything a render needs. Media are kept in registration
/// order; the volume sampler only looks at the first one.
pub struct Scene<V: Volume> {
    media: Vec<Medium<V>>,
    sensors: Vec<Box<dyn Sensor>>,
    emitters: Vec<DirectionalEmitter>,
    background: Vector3f,
}

impl<V: Volume> Default for Scene<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Volume> Scene<V> {
    pub fn new() -> Self {
        Self {
            media: Vec::new(),
            sensors: Vec::new(),
            emitters: Vec::new(),
            background: Vector3f::zeros(),
        }
    }

    pub fn add_medium(&mut self, medium: Medium<V>) {
        self.media.push(medium);
    }

    pub fn count(&self) -> usize {
        self.media.len()
    }

    pub fn get(&self, index: usize) -> Option<&Medium<V>> {
        self.media.get(index)
    }

    pub fn first_medium(&self) -> Option<&Medium<V>> {
        self.media.first()
    }

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn sensor(&self, id: usize) -> Option<&dyn Sensor> {
        self.sensors.get(id).map(|s| s.as_ref())
    }

    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    pub fn add_emitter(&mut self, emitter: DirectionalEmitter) {
        self.emitters.push(emitter);
    }

    pub fn emitters(&self) -> &[DirectionalEmitter] {
        &self.emitters
    }

    pub fn set_background(&mut self, radiance: Vector3f) {
        self.background = radiance;
    }

    pub fn background(&self) -> Vector3f {
        self.background
    }
}
