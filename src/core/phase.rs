// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f, INV_FOUR_PI, PI};
use crate::math::frame::Frame;

/// Henyey-Greenstein density for the cosine between the reversed incoming
/// direction and the scattered direction.
pub fn phase_hg(cos_theta: Float, g: Float) -> Float {
    let denom = 1.0 + g * g + 2.0 * g * cos_theta;
    INV_FOUR_PI * (1.0 - g * g) / (denom * denom.sqrt())
}

/// Single-lobe Henyey-Greenstein phase function. Positive `g` favours
/// forward scattering, zero is isotropic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HenyeyGreenstein {
    g: Float,
}

impl HenyeyGreenstein {
    pub fn new(g: Float) -> Self {
        Self { g }
    }

    pub fn eval(&self, ray_dir: &Vector3f, scatter_dir: &Vector3f) -> Float {
        phase_hg((-ray_dir).dot(scatter_dir), self.g)
    }

    /// Samples a unit scattering direction for a ray travelling along
    /// `ray_dir`. The pdf of the result equals `eval`.
    pub fn sample(&self, ray_dir: &Vector3f, u: Vector2f) -> Vector3f {
        let g = self.g;
        let cos_theta = if g.abs() < 1e-3 {
            1.0 - 2.0 * u.x
        } else {
            let sqr_term = (1.0 - g * g) / (1.0 + g - 2.0 * g * u.x);
            -(1.0 + g * g - sqr_term * sqr_term) / (2.0 * g)
        };
        let cos_theta = cos_theta.clamp(-1.0, 1.0);
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let (sin_phi, cos_phi) = (2.0 * PI * u.y).sin_cos();

        let frame = Frame::from_z(-ray_dir.normalize());
        frame
            .from_local(Vector3f::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta))
            .normalize()
    }
}
