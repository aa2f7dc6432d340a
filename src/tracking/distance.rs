// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::core::sampler::SampleGenerator;
use crate::core::volume::Volume;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;
use crate::tracking::{density_at, free_flight, tracking_setup, walk_position};

/// A real scattering collision found by distance sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceSample {
    /// Distance along the ray, inside the clipped segment.
    pub t: Float,
    /// Path weight for the event: the medium's single-scattering albedo.
    pub throughput: Vector3f,
}

/// Delta-tracking free-flight sampling over `[near, far]`. Returns `None`
/// when the ray leaves the segment without a real collision.
pub fn sample_distance<V: Volume, S: SampleGenerator>(
    medium: &Medium<V>,
    ray: &Ray3f,
    near: Float,
    far: Float,
    sampler: &mut S,
) -> Option<DistanceSample> {
    let (volume, inv_majorant) = tracking_setup(medium)?;
    if !(near < far) {
        return None;
    }

    let mut accessor = volume.accessor();
    let length = (far - near) as f64;
    let mut t = 0.0f64;
    loop {
        t = free_flight(t, inv_majorant, sampler);
        if t >= length {
            return None;
        }

        let d = density_at(medium, &mut accessor, ray, walk_position(near, t), sampler);
        if sampler.next_1d() < d * inv_majorant {
            return Some(DistanceSample {
                t: walk_position(near, t),
                throughput: medium.albedo(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::LcgRng;
    use crate::tracking::delta_tracking;
    use crate::tracking::test_util::*;

    #[test]
    fn test_samples_lie_inside_segment() {
        let medium = homogeneous(1.0, 1.0, 1.0);
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(17);
        let mut found = 0;
        for _ in 0..5000 {
            if let Some(ds) = sample_distance(&medium, &ray, 9.0, 11.0, &mut rng) {
                assert!(ds.t >= 9.0 && ds.t <= 11.0);
                assert_eq!(ds.throughput, Vector3f::new(0.8, 0.6, 0.4));
                found += 1;
            }
        }
        // P(collision) = 1 - e^-2 ~ 0.865.
        let p = found as f64 / 5000.0;
        assert!((p - (1.0 - (-2.0f64).exp())).abs() < 0.025, "p = {}", p);
    }

    #[test]
    fn test_distance_follows_exponential() {
        // Truncated exponential with rate 1 on [0, 2]: mean = 1 - 2e^-2 / (1 - e^-2).
        let medium = homogeneous(1.0, 4.0, 1.0);
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(21);
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for _ in 0..20000 {
            if let Some(ds) = sample_distance(&medium, &ray, 9.0, 11.0, &mut rng) {
                sum += (ds.t - 9.0) as f64;
                count += 1;
            }
        }
        let e2 = (-2.0f64).exp();
        let expected = 1.0 - 2.0 * e2 / (1.0 - e2);
        assert!((sum / count as f64 - expected).abs() < 0.02);
    }

    #[test]
    fn test_miss_probability_matches_transmittance() {
        // Both use delta tracking, so an identical stream gives identical outcomes.
        let medium = homogeneous(0.6, 1.0, 1.0);
        let ray = axis_ray();
        let mut a = LcgRng::seeded(4);
        let mut b = LcgRng::seeded(4);
        for _ in 0..1000 {
            let found = sample_distance(&medium, &ray, 9.0, 11.0, &mut a).is_some();
            let tr = delta_tracking::eval_transmittance(&medium, &ray, 9.0, 11.0, &mut b);
            assert_eq!(found, tr == 0.0);
        }
    }

    #[test]
    fn test_same_stream_same_sample() {
        let medium = homogeneous(0.7, 1.0, 1.0);
        let ray = axis_ray();
        let bits = |seed: u64| -> Vec<Option<(u32, [u32; 3])>> {
            let mut rng = LcgRng::seeded(seed);
            (0..500)
                .map(|_| {
                    sample_distance(&medium, &ray, 9.0, 11.0, &mut rng).map(|ds| {
                        let w = ds.throughput;
                        (ds.t.to_bits(), [w.x.to_bits(), w.y.to_bits(), w.z.to_bits()])
                    })
                })
                .collect()
        };
        let first = bits(77);
        assert_eq!(first, bits(77));
        assert!(first.iter().any(|s| s.is_some()));
        assert!(first.iter().any(|s| s.is_none()));
    }

    #[test]
    fn test_zero_density_never_scatters() {
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(9);
        for _ in 0..100 {
            assert!(sample_distance(&homogeneous(1.0, 1.0, 0.0), &ray, 9.0, 11.0, &mut rng).is_none());
            assert!(sample_distance(&homogeneous(0.0, 0.0, 1.0), &ray, 9.0, 11.0, &mut rng).is_none());
        }
    }
}
