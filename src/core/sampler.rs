// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};

/// Source of uniform samples in `[0, 1)`.
///
/// Every sampling task owns its generator; nothing here is shared between
/// tasks, so implementations need no synchronization.
pub trait SampleGenerator {
    fn seeded(seed: u64) -> Self where Self: Sized;

    fn next_1d(&mut self) -> Float;

    fn next_2d(&mut self) -> Vector2f {
        let x = self.next_1d();
        let y = self.next_1d();
        Vector2f::new(x, y)
    }

    fn next_3d(&mut self) -> Vector3f {
        let x = self.next_1d();
        let y = self.next_1d();
        let z = self.next_1d();
        Vector3f::new(x, y, z)
    }
}

/// Maps the top 24 bits of `bits` to a float in `[0, 1)`.
pub fn bits_to_unit_float(bits: u32) -> Float {
    (bits >> 8) as Float * (1.0 / 16_777_216.0)
}
