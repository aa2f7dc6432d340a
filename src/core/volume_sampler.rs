// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::core::phase::HenyeyGreenstein;
use crate::core::sampler::SampleGenerator;
use crate::core::scene::Scene;
use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::tracking::distance::{self, DistanceSample};
use crate::tracking::TransmittanceEstimator;

/// Entry point for integrators that need volumetric queries. Only the first
/// medium of the scene is considered.
pub struct VolumeSampler<'a, V: Volume> {
    medium: Option<&'a Medium<V>>,
    estimator: TransmittanceEstimator,
}

impl<'a, V: Volume> VolumeSampler<'a, V> {
    pub fn new(scene: &'a Scene<V>, estimator: TransmittanceEstimator) -> Self {
        if scene.count() > 1 {
            log::debug!(
                "Scene holds {} media, volume queries only use the first one.",
                scene.count()
            );
        }
        Self {
            medium: scene.first_medium(),
            estimator,
        }
    }

    pub fn with_default_estimator(scene: &'a Scene<V>) -> Self {
        Self::new(scene, TransmittanceEstimator::build_default())
    }

    pub fn estimator(&self) -> TransmittanceEstimator {
        self.estimator
    }

    fn clip(&self, origin: Vector3f, dir: Vector3f, min_t: Float, max_t: Float) -> Option<(&'a Medium<V>, Ray3f, Float, Float)> {
        let medium = self.medium?;
        let ray = Ray3f::from_segment(origin, dir, min_t, max_t);
        let (near, far) = medium.bbox().clip_ray(&ray)?;
        Some((medium, ray, near, far))
    }

    /// Bounding-box test only; never touches the density field.
    pub fn intersects_volumes(&self, origin: Vector3f, dir: Vector3f, min_t: Float, max_t: Float) -> bool {
        self.clip(origin, dir, min_t, max_t).is_some()
    }

    /// Unbiased estimate of the transmittance along `[min_t, max_t]`, in `[0, 1]`.
    pub fn eval_transmittance<S: SampleGenerator>(
        &self,
        origin: Vector3f,
        dir: Vector3f,
        min_t: Float,
        max_t: Float,
        sampler: &mut S,
    ) -> Float {
        match self.clip(origin, dir, min_t, max_t) {
            Some((medium, ray, near, far)) => self.estimator.eval(medium, &ray, near, far, sampler),
            None => 1.0,
        }
    }

    pub fn sample_distance<S: SampleGenerator>(
        &self,
        origin: Vector3f,
        dir: Vector3f,
        min_t: Float,
        max_t: Float,
        sampler: &mut S,
    ) -> Option<DistanceSample> {
        let (medium, ray, near, far) = self.clip(origin, dir, min_t, max_t)?;
        distance::sample_distance(medium, &ray, near, far, sampler)
    }

    /// New direction after scattering off the first medium. Without a medium
    /// the incoming direction comes back unchanged.
    pub fn sample_phase_function<S: SampleGenerator>(&self, dir: Vector3f, sampler: &mut S) -> Vector3f {
        match self.medium {
            Some(medium) => HenyeyGreenstein::new(medium.anisotropy()).sample(&dir, sampler.next_2d()),
            None => dir,
        }
    }

    pub fn eval_phase_function(&self, dir_in: Vector3f, dir_out: Vector3f) -> Float {
        match self.medium {
            Some(medium) => HenyeyGreenstein::new(medium.anisotropy()).eval(&dir_in, &dir_out),
            None => 0.0,
        }
    }
}
