// Copyright @yucwang 2026

use crate::core::integrator::{sample_camera_ray, Integrator};
use crate::core::sampler::SampleGenerator;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::core::volume::Volume;
use crate::core::volume_sampler::VolumeSampler;
use crate::math::constants::{Vector2f, Vector3f, FLOAT_MAX};
use crate::tracking::TransmittanceEstimator;

/// Single scattering from the directional emitters and the constant
/// background. Camera rays that escape the media see the background.
pub struct SingleScatterIntegrator {
    pub samples_per_pixel: u32,
    pub estimator: TransmittanceEstimator,
}

impl SingleScatterIntegrator {
    pub fn new(samples_per_pixel: u32, estimator: TransmittanceEstimator) -> Self {
        Self { samples_per_pixel, estimator }
    }
}

impl<V: Volume, S: SampleGenerator> Integrator<V, S> for SingleScatterIntegrator {
    fn trace_ray_forward(&self, scene: &Scene<V>, sensor: &dyn Sensor, pixel: Vector2f, sampler: &mut S) -> Vector3f {
        let ray = match sample_camera_ray(sensor, pixel, sampler) {
            Some(ray) => ray,
            None => return Vector3f::zeros(),
        };

        let background = scene.background();
        let volumes = VolumeSampler::new(scene, self.estimator);
        if !volumes.intersects_volumes(ray.origin(), ray.dir(), ray.min_t, ray.max_t) {
            return background;
        }

        let ds = match volumes.sample_distance(ray.origin(), ray.dir(), ray.min_t, ray.max_t, sampler) {
            Some(ds) => ds,
            None => return background,
        };
        let p = ray.at(ds.t);

        let mut radiance = Vector3f::zeros();
        for emitter in scene.emitters() {
            let wi = emitter.to_light();
            let phase = volumes.eval_phase_function(ray.dir(), wi);
            if phase <= 0.0 {
                continue;
            }
            let tr = volumes.eval_transmittance(p, wi, 0.0, FLOAT_MAX, sampler);
            radiance += emitter.irradiance() * (phase * tr);
        }

        // Background in-scattering; the phase pdf cancels the phase value.
        if background != Vector3f::zeros() {
            let wo = volumes.sample_phase_function(ray.dir(), sampler);
            let tr = volumes.eval_transmittance(p, wo, 0.0, FLOAT_MAX, sampler);
            radiance += background * tr;
        }

        ds.throughput.component_mul(&radiance)
    }

    fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    fn describe(&self) -> String {
        format!("SingleScatterIntegrator (spp: {}, estimator: {})", self.samples_per_pixel, self.estimator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::medium::Medium;
    use crate::core::rng::LcgRng;
    use crate::emitters::directional::DirectionalEmitter;
    use crate::math::aabb::AABB;
    use crate::math::constants::{Float, INV_FOUR_PI};
    use crate::sensors::perspective::PerspectiveCamera;
    use crate::volumes::const_volume::ConstantVolume;
    use std::sync::Arc;

    fn camera(origin: Vector3f) -> PerspectiveCamera {
        PerspectiveCamera::new(origin, Vector3f::zeros(), Vector3f::new(0.0, 1.0, 0.0), 0.01, 1, 1, 0.01, 1000.0)
    }

    fn slab_scene(density: Float) -> Scene<ConstantVolume> {
        // Thin slab so the light path inside it is short and easy to bound.
        let bbox = AABB::new(Vector3f::new(-5.0, -5.0, -0.5), Vector3f::new(5.0, 5.0, 0.5));
        let mut scene = Scene::new();
        scene.add_medium(
            Medium::new(Arc::new(ConstantVolume::new(density).with_bbox(Some(bbox))))
                .with_albedo(Vector3f::new(1.0, 0.5, 0.25)),
        );
        scene.add_sensor(Box::new(camera(Vector3f::new(0.0, 0.0, -10.0))));
        scene
    }

    fn trace(scene: &Scene<ConstantVolume>, integrator: &SingleScatterIntegrator, rng: &mut LcgRng) -> Vector3f {
        let sensor = scene.sensor(0).unwrap();
        Integrator::<ConstantVolume, LcgRng>::trace_ray_forward(integrator, scene, sensor, Vector2f::zeros(), rng)
    }

    #[test]
    fn test_escaped_rays_see_background() {
        let mut scene: Scene<ConstantVolume> = Scene::new();
        scene.set_background(Vector3f::new(0.3, 0.2, 0.1));
        scene.add_sensor(Box::new(camera(Vector3f::new(0.0, 0.0, -10.0))));
        let integrator = SingleScatterIntegrator::new(1, TransmittanceEstimator::DeltaTracking);
        let mut rng = LcgRng::seeded(1);
        assert_eq!(trace(&scene, &integrator, &mut rng), Vector3f::new(0.3, 0.2, 0.1));
    }

    #[test]
    fn test_directional_light_single_scatter() {
        // Light travels along -z, i.e. straight towards the camera. Isotropic
        // phase, so the expected radiance is
        //   albedo * E * (1/4pi) * int_0^1 sigma e^{-sigma s} e^{-sigma (1 - s)} ds
        //   = albedo * E * sigma e^{-sigma} / 4pi.
        let sigma = 0.5;
        let mut scene = slab_scene(sigma);
        scene.add_emitter(DirectionalEmitter::new(Vector3f::new(0.0, 0.0, -1.0), Vector3f::new(1.0, 1.0, 1.0)));
        let integrator = SingleScatterIntegrator::new(1, TransmittanceEstimator::RatioTracking);
        let mut rng = LcgRng::seeded(19);
        let n = 40000;
        let mut sum = 0.0f64;
        for _ in 0..n {
            let c = trace(&scene, &integrator, &mut rng);
            assert!((c.y - 0.5 * c.x).abs() < 1e-6);
            sum += c.x as f64;
        }
        let mean = sum / n as f64;
        let expected = (sigma as f64) * (-(sigma as f64)).exp() * INV_FOUR_PI as f64;
        assert!((mean - expected).abs() < 0.1 * expected, "mean {} expected {}", mean, expected);
    }

    #[test]
    fn test_empty_medium_scatters_nothing() {
        let mut scene = slab_scene(0.0);
        scene.add_emitter(DirectionalEmitter::new(Vector3f::new(0.0, 0.0, -1.0), Vector3f::new(1.0, 1.0, 1.0)));
        let integrator = SingleScatterIntegrator::new(1, TransmittanceEstimator::DeltaTracking);
        let mut rng = LcgRng::seeded(4);
        for _ in 0..100 {
            assert_eq!(trace(&scene, &integrator, &mut rng), Vector3f::zeros());
        }
    }
}
