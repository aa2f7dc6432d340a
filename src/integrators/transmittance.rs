// Copyright @yucwang 2026

use crate::core::integrator::{sample_camera_ray, Integrator};
use crate::core::sampler::SampleGenerator;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::core::volume::Volume;
use crate::core::volume_sampler::VolumeSampler;
use crate::math::constants::{Vector2f, Vector3f};
use crate::tracking::TransmittanceEstimator;

/// Renders the background seen through the media, attenuated by the
/// transmittance of each camera ray. With a black background the image is
/// the transmittance itself.
pub struct TransmittanceIntegrator {
    pub samples_per_pixel: u32,
    pub estimator: TransmittanceEstimator,
}

impl TransmittanceIntegrator {
    pub fn new(samples_per_pixel: u32, estimator: TransmittanceEstimator) -> Self {
        Self { samples_per_pixel, estimator }
    }
}

impl<V: Volume, S: SampleGenerator> Integrator<V, S> for TransmittanceIntegrator {
    fn trace_ray_forward(&self, scene: &Scene<V>, sensor: &dyn Sensor, pixel: Vector2f, sampler: &mut S) -> Vector3f {
        let ray = match sample_camera_ray(sensor, pixel, sampler) {
            Some(ray) => ray,
            None => return Vector3f::zeros(),
        };

        let volumes = VolumeSampler::new(scene, self.estimator);
        let tr = volumes.eval_transmittance(ray.origin(), ray.dir(), ray.min_t, ray.max_t, sampler);
        let background = scene.background();
        if background == Vector3f::zeros() {
            Vector3f::new(tr, tr, tr)
        } else {
            background * tr
        }
    }

    fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    fn describe(&self) -> String {
        format!("TransmittanceIntegrator (spp: {}, estimator: {})", self.samples_per_pixel, self.estimator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::medium::Medium;
    use crate::core::rng::LcgRng;
    use crate::math::aabb::AABB;
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::volumes::const_volume::ConstantVolume;
    use std::sync::Arc;

    fn scene() -> Scene<ConstantVolume> {
        let mut scene = Scene::new();
        let bbox = AABB::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0));
        scene.add_medium(Medium::new(Arc::new(ConstantVolume::new(1.0).with_bbox(Some(bbox)))));
        scene.add_sensor(Box::new(PerspectiveCamera::new(
            Vector3f::new(0.0, 0.0, -10.0),
            Vector3f::zeros(),
            Vector3f::new(0.0, 1.0, 0.0),
            0.02,
            1,
            1,
            0.01,
            1000.0,
        )));
        scene
    }

    #[test]
    fn test_pixel_through_cube() {
        let scene = scene();
        let sensor = scene.sensor(0).unwrap();
        let integrator = TransmittanceIntegrator::new(1, TransmittanceEstimator::RatioTracking);
        let mut rng = LcgRng::seeded(3);
        let n = 20000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let c: Vector3f =
                Integrator::<ConstantVolume, LcgRng>::trace_ray_forward(&integrator, &scene, sensor, Vector2f::zeros(), &mut rng);
            assert_eq!(c.x, c.y);
            sum += c.x as f64;
        }
        // The film covers a tiny cone around the axis, so every ray crosses ~2 units.
        let mean = sum / n as f64;
        assert!((mean - (-2.0f64).exp()).abs() < 0.0125, "mean {}", mean);
    }

    #[test]
    fn test_background_is_attenuated() {
        let mut scene = scene();
        scene.set_background(Vector3f::new(2.0, 1.0, 0.5));
        let sensor = scene.sensor(0).unwrap();
        let integrator = TransmittanceIntegrator::new(1, TransmittanceEstimator::DeltaTracking);
        let mut rng = LcgRng::seeded(8);
        for _ in 0..200 {
            let c: Vector3f =
                Integrator::<ConstantVolume, LcgRng>::trace_ray_forward(&integrator, &scene, sensor, Vector2f::zeros(), &mut rng);
            assert!(c == Vector3f::zeros() || c == Vector3f::new(2.0, 1.0, 0.5));
        }
    }
}
