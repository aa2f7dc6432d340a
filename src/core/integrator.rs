// Copyright @yucwang 2026

use crate::core::sampler::SampleGenerator;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

pub trait Integrator<V: Volume, S: SampleGenerator>: Sync {
    /// One radiance estimate for the pixel at integer coordinates `pixel`.
    fn trace_ray_forward(&self, scene: &Scene<V>, sensor: &dyn Sensor, pixel: Vector2f, sampler: &mut S) -> Vector3f;
    fn samples_per_pixel(&self) -> u32;
    fn describe(&self) -> String;
}

/// Camera ray through a jittered position inside `pixel`, or `None` for an
/// empty film.
pub fn sample_camera_ray<S: SampleGenerator>(sensor: &dyn Sensor, pixel: Vector2f, sampler: &mut S) -> Option<Ray3f> {
    let (width, height) = (sensor.width(), sensor.height());
    if width == 0 || height == 0 {
        return None;
    }
    let jitter = sampler.next_2d();
    let u = (pixel.x + jitter.x) / (width as Float);
    let v = (pixel.y + jitter.y) / (height as Float);
    Some(sensor.sample_ray(&Vector2f::new(u, v)))
}
