// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

/// Scalar density field addressed in the field's local space.
pub trait Volume: Send + Sync {
    /// Per-traversal lookup state. Created at the start of one transmittance
    /// or distance query and dropped at its end.
    type Accessor<'a>: VolumeAccessor
    where
        Self: 'a;

    fn accessor(&self) -> Self::Accessor<'_>;

    /// Precomputed upper bound of the field over its whole domain.
    fn max_value(&self) -> Float;

    /// Deterministic (filtered) value at `p_local`.
    fn eval(&self, p_local: Vector3f) -> Float;

    fn bbox(&self) -> Option<AABB> {
        None
    }
}

pub trait VolumeAccessor {
    /// Noisy estimate of the density at `p_local` whose expectation over a
    /// uniform `u` in `[0, 1)^3` equals `Volume::eval`.
    fn lookup_stochastic(&mut self, p_local: Vector3f, u: Vector3f) -> Float;

    /// Number of lookups served by this accessor so far.
    fn lookups(&self) -> usize;
}
