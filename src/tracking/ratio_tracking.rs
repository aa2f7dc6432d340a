// Copyright @yucwang 2026

use crate::core::medium::Medium;
use crate::core::sampler::SampleGenerator;
use crate::core::volume::Volume;
use crate::math::constants::Float;
use crate::math::ray::Ray3f;
use crate::tracking::{density_at, free_flight, tracking_setup, walk_position, RR_THRESHOLD};

/// Continuous transmittance estimate over `[near, far]`. Every candidate
/// collision scales the estimate by its null-collision probability; once the
/// estimate drops under `RR_THRESHOLD` Russian roulette decides whether to
/// keep walking.
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
    let mut tr: Float = 1.0;
    let mut t = 0.0f64;
    loop {
        t = free_flight(t, inv_majorant, sampler);
        if t >= length {
            return tr;
        }

        let d = density_at(medium, &mut accessor, ray, walk_position(near, t), sampler);
        tr *= 1.0 - (d * inv_majorant).max(0.0);

        if tr < RR_THRESHOLD {
            let prob = 1.0 - tr;
            if sampler.next_1d() < prob {
                return 0.0;
            }
            tr /= 1.0 - prob;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::{LcgRng, StreamRng};
    use crate::tracking::delta_tracking;
    use crate::tracking::test_util::*;

    #[test]
    fn test_homogeneous_matches_beer_lambert() {
        let medium = homogeneous(1.0, 1.0, 1.0);
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(31);
        let n = 20000;
        let values: Vec<Float> = (0..n)
            .map(|_| eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng))
            .collect();
        let (mean, _) = mean_and_variance(&values);
        assert!((mean - (-2.0f64).exp()).abs() < 0.0125, "mean {}", mean);
    }

    #[test]
    fn test_lower_variance_than_delta_tracking() {
        // A majorant above the true density is where ratio tracking pays off.
        let medium = homogeneous(1.0, 2.0, 1.0);
        let ray = axis_ray();
        let n = 20000;

        let mut rng = StreamRng::seeded(5);
        let ratio: Vec<Float> = (0..n)
            .map(|_| eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng))
            .collect();
        let mut rng = StreamRng::seeded(6);
        let delta: Vec<Float> = (0..n)
            .map(|_| delta_tracking::eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng))
            .collect();

        let (ratio_mean, ratio_var) = mean_and_variance(&ratio);
        let (delta_mean, delta_var) = mean_and_variance(&delta);
        let expected = (-2.0f64).exp();
        assert!((ratio_mean - expected).abs() < 0.01, "ratio mean {}", ratio_mean);
        assert!((delta_mean - expected).abs() < 0.0125, "delta mean {}", delta_mean);
        assert!(ratio_var < delta_var, "ratio var {} >= delta var {}", ratio_var, delta_var);
    }

    #[test]
    fn test_estimates_stay_in_unit_interval() {
        let medium = homogeneous(0.3, 1.0, 2.0);
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(3);
        for _ in 0..2000 {
            let tr = eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng);
            assert!(tr >= 0.0 && tr <= 1.0, "tr = {}", tr);
        }
    }

    #[test]
    fn test_zero_density_is_transparent() {
        let ray = axis_ray();
        let mut rng = LcgRng::seeded(1);
        for _ in 0..100 {
            assert_eq!(eval_transmittance(&homogeneous(1.0, 1.0, 0.0), &ray, 9.0, 11.0, &mut rng), 1.0);
        }
    }

    #[test]
    fn test_same_stream_same_result() {
        let medium = homogeneous(0.4, 1.5, 1.0);
        let ray = axis_ray();
        let run = |seed: u64| {
            let mut rng = LcgRng::seeded(seed);
            (0..256)
                .map(|_| eval_transmittance(&medium, &ray, 9.0, 11.0, &mut rng).to_bits())
                .collect::<Vec<u32>>()
        };
        assert_eq!(run(12), run(12));
    }
}
