// Copyright @yucwang 2026

//! Null-collision estimators over the segment of a ray inside a medium.
//!
//! All trackers sample candidate collisions at the majorant rate and walk
//! the distance `t` relative to the segment start, so `t` keeps full
//! precision even when the segment lies far from the ray origin. The walk
//! accumulates in `f64`: an `f32` sum stops advancing once the step drops
//! below half an ulp of `t`, which stalls dense, long segments forever.

pub mod delta_tracking;
pub mod distance;
pub mod ratio_tracking;

use crate::core::medium::Medium;
use crate::core::sampler::SampleGenerator;
use crate::core::volume::{Volume, VolumeAccessor};
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use std::fmt;
use std::str::FromStr;

pub use self::distance::DistanceSample;

/// Transmittance below which ratio tracking starts playing Russian roulette.
pub const RR_THRESHOLD: Float = 0.1;

/// Transmittance estimator shared by a whole run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransmittanceEstimator {
    DeltaTracking,
    RatioTracking,
}

impl TransmittanceEstimator {
    /// Estimator picked at build time through the `ratio_tracking` feature.
    pub const fn build_default() -> Self {
        if cfg!(feature = "ratio_tracking") {
            TransmittanceEstimator::RatioTracking
        } else {
            TransmittanceEstimator::DeltaTracking
        }
    }

    pub fn eval<V: Volume, S: SampleGenerator>(
        self,
        medium: &Medium<V>,
        ray: &Ray3f,
        near: Float,
        far: Float,
        sampler: &mut S,
    ) -> Float {
        match self {
            TransmittanceEstimator::DeltaTracking => {
                delta_tracking::eval_transmittance(medium, ray, near, far, sampler)
            }
            TransmittanceEstimator::RatioTracking => {
                ratio_tracking::eval_transmittance(medium, ray, near, far, sampler)
            }
        }
    }
}

impl Default for TransmittanceEstimator {
    fn default() -> Self {
        Self::build_default()
    }
}

impl fmt::Display for TransmittanceEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmittanceEstimator::DeltaTracking => write!(f, "delta"),
            TransmittanceEstimator::RatioTracking => write!(f, "ratio"),
        }
    }
}

impl FromStr for TransmittanceEstimator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delta" | "delta_tracking" => Ok(TransmittanceEstimator::DeltaTracking),
            "ratio" | "ratio_tracking" => Ok(TransmittanceEstimator::RatioTracking),
            _ => Err(format!("unknown transmittance estimator: {}", s)),
        }
    }
}

/// Density field and inverse majorant of `medium`, or `None` when the medium
/// cannot attenuate (no field, zero or non-finite majorant).
///
/// The expected number of candidate collisions is `majorant * length`, so a
/// huge majorant still costs that many iterations even though it terminates.
pub(crate) fn tracking_setup<V: Volume>(medium: &Medium<V>) -> Option<(&V, Float)> {
    let volume = medium.volume()?;
    let majorant = medium.majorant();
    if majorant > 0.0 && majorant.is_finite() {
        Some((volume, 1.0 / majorant))
    } else {
        None
    }
}

/// Exponential free flight at the majorant rate, accumulated in `f64`.
#[inline]
pub(crate) fn free_flight<S: SampleGenerator>(t: f64, inv_majorant: Float, sampler: &mut S) -> f64 {
    t - (1.0 - sampler.next_1d() as f64).ln() * inv_majorant as f64
}

/// World distance along the ray of the walk position `t` past `near`.
#[inline]
pub(crate) fn walk_position(near: Float, t: f64) -> Float {
    (near as f64 + t) as Float
}

/// Scaled stochastic density at distance `t` along `ray`.
#[inline]
pub(crate) fn density_at<V: Volume, A: VolumeAccessor, S: SampleGenerator>(
    medium: &Medium<V>,
    accessor: &mut A,
    ray: &Ray3f,
    t: Float,
    sampler: &mut S,
) -> Float {
    let p_local = medium.world_to_local(ray.at(t));
    accessor.lookup_stochastic(p_local, sampler.next_3d()) * medium.density_scale()
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::core::medium::Medium;
    use crate::math::aabb::AABB;
    use crate::math::constants::{Float, Vector3f};
    use crate::math::ray::Ray3f;
    use crate::volumes::const_volume::ConstantVolume;
    use std::sync::Arc;

    pub fn unit_bbox() -> AABB {
        AABB::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0))
    }

    /// Constant-density medium over the unit box.
    pub fn homogeneous(density: Float, max_value: Float, scale: Float) -> Medium<ConstantVolume> {
        let volume = ConstantVolume::new(density)
            .with_max_value(max_value)
            .with_bbox(Some(unit_bbox()));
        Medium::new(Arc::new(volume))
            .with_scale(scale)
            .with_albedo(Vector3f::new(0.8, 0.6, 0.4))
    }

    /// The ray from `(0, 0, -10)` along +z; it overlaps the unit box on `[9, 11]`.
    pub fn axis_ray() -> Ray3f {
        Ray3f::from_segment(Vector3f::new(0.0, 0.0, -10.0), Vector3f::new(0.0, 0.0, 1.0), 0.0, 100.0)
    }

    pub fn mean_and_variance(values: &[Float]) -> (f64, f64) {
        let n = values.len() as f64;
        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
        let var = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, var)
    }
}
