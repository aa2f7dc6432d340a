// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::core::sampler::SampleGenerator;
use crate::core::volume::Volume;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::tracking::{density_at, free_flight, tracking_setup, walk_position};

/// Binary transmittance estimate over `[near, far]`: 0 if a real collision
/// is found, 1 otherwise.
pub fn eval_transmittance<V: Volume, S: SampleGenerator>(
    medium: &Medium<V>,
    ray: &Ray3f,
    near: Float,
    far: Float,
    sampler: &mut S,
) -> Float {
    let (volume, inv_majorant) = match tracking_setup(medium) {
        Some(setup) => setup,
        None => return 1.0,
    };
    if !(near < far) {
        return 1.0;
    }

    let mut accessor = volume.accessor();
    let length = (far - near) as f64;
    let mut t = 0.0f64;
    loop {
        t = free_flight(t, inv_majorant, sampler);
        if t >= length {
            return 1.0;
        }

        let d = density_at(medium, &mut accessor, ray, walk_position(near, t), sampler);
        if sampler.next_1d() < d * inv_majorant {
            return 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::{HashRng, LcgRng};
    use crate::tracking::test_util::*;

    #[test]
    fn test_homogeneous_matches_beer_lambert() {
        let medium = homogeneous(1.0, 1.0, 1.0);
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(2024);
        let n = 20000;
        let values: Vec<Float> = (0..n)
            .map(|_| eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng))
            .collect();
        assert!(values.iter().all(|&v| v == 0.0 || v == 1.0));

        let (mean, _) = mean_and_variance(&values);
        let expected = (-2.0f64).exp();
        // Five standard errors of a Bernoulli(0.135) mean.
        assert!((mean - expected).abs() < 0.0125, "mean {} vs {}", mean, expected);
    }

    #[test]
    fn test_loose_majorant_stays_unbiased() {
        let medium = homogeneous(0.5, 3.0, 1.0);
        let ray = axis_ray();
        let mut rng = HashRng::seeded(8);
        let n = 20000;
        let mean = (0..n)
            .map(|_| eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng) as f64)
            .sum::<f64>()
            / n as f64;
        let expected = (-1.0f64).exp();
        assert!((mean - expected).abs() < 0.017, "mean {} vs {}", mean, expected);
    }

    #[test]
    fn test_zero_density_is_transparent() {
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(1);
        for _ in 0..100 {
            assert_eq!(eval_transmittance(&homogeneous(1.0, 1.0, 0.0), &ray, 9.0, 11.0, &mut rng), 1.0);
            assert_eq!(eval_transmittance(&homogeneous(0.0, 0.0, 1.0), &ray, 9.0, 11.0, &mut rng), 1.0);
        }
    }

    #[test]
    fn test_empty_interval_is_transparent() {
        let medium = homogeneous(100.0, 100.0, 1.0);
        let mut rng = LcgRng::seeded(1);
        assert_eq!(eval_transmittance(&medium, &axis_ray(), 10.0, 10.0, &mut rng), 1.0);
        assert_eq!(eval_transmittance(&medium, &axis_ray(), 11.0, 9.0, &mut rng), 1.0);
    }

    #[test]
    fn test_same_stream_same_result() {
        let medium = homogeneous(0.7, 1.0, 1.0);
        let ray = axis_ray();
        let run = |seed: u64| {
            let mut rng = LcgRng::seeded(seed);
            (0..256)
                .map(|_| eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng).to_bits())
                .collect::<Vec<u32>>()
        };
        assert_eq!(run(77), run(77));
    }
}
