// Copyright @yucwang 2026

use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};
use crate::math::transform::Transform;
use std::sync::Arc;

/// Largest magnitude accepted for the phase-function anisotropy.
pub const MAX_ANISOTROPY: Float = 0.999;

/// A participating medium: a density field placed in the world together
/// with the optical properties applied on top of it.
///
/// `density_scale` must be non-negative and `bbox` well formed; neither is
/// checked at sampling time.
pub struct Medium<V: Volume> {
    volume: Option<Arc<V>>,
    to_world: Transform,
    bbox: AABB,
    density_scale: Float,
    albedo: Vector3f,
    anisotropy: Float,
}

impl<V: Volume> Medium<V> {
    /// Medium over `volume`; the world bounds follow from the volume's
    /// local bounds, or stay empty when it has none.
    pub fn new(volume: Arc<V>) -> Self {
        let bbox = volume.bbox().unwrap_or_default();
        Self {
            volume: Some(volume),
            to_world: Transform::default(),
            bbox,
            density_scale: 1.0,
            albedo: Vector3f::new(1.0, 1.0, 1.0),
            anisotropy: 0.0,
        }
    }

    /// Medium without a density field. It scatters nothing and attenuates
    /// nothing but still carries a phase function.
    pub fn empty(bbox: AABB) -> Self {
        Self {
            volume: None,
            to_world: Transform::default(),
            bbox,
            density_scale: 1.0,
            albedo: Vector3f::new(1.0, 1.0, 1.0),
            anisotropy: 0.0,
        }
    }

    /// Places the medium; world bounds are recomputed from the volume's
    /// local bounds when it has any.
    pub fn with_transform(mut self, to_world: Transform) -> Self {
        self.to_world = to_world;
        if let Some(local) = self.volume.as_ref().and_then(|v| v.bbox()) {
            self.bbox = to_world.apply_aabb(&local);
        }
        self
    }

    pub fn with_bbox(mut self, bbox: AABB) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_scale(mut self, density_scale: Float) -> Self {
        self.density_scale = density_scale;
        self
    }

    pub fn with_albedo(mut self, albedo: Vector3f) -> Self {
        self.albedo = Vector3f::new(
            albedo[0].clamp(0.0, 1.0),
            albedo[1].clamp(0.0, 1.0),
            albedo[2].clamp(0.0, 1.0),
        );
        self
    }

    pub fn with_anisotropy(mut self, g: Float) -> Self {
        if g.abs() > MAX_ANISOTROPY {
            log::warn!("Anisotropy {} is outside (-1, 1), clamping to +-{}.", g, MAX_ANISOTROPY);
        }
        self.anisotropy = g.clamp(-MAX_ANISOTROPY, MAX_ANISOTROPY);
        self
    }

    pub fn volume(&self) -> Option<&V> {
        self.volume.as_deref()
    }

    pub fn has_density(&self) -> bool {
        self.volume.is_some()
    }

    pub fn bbox(&self) -> &AABB {
        &self.bbox
    }

    pub fn density_scale(&self) -> Float {
        self.density_scale
    }

    pub fn albedo(&self) -> Vector3f {
        self.albedo
    }

    pub fn anisotropy(&self) -> Float {
        self.anisotropy
    }

    /// Upper bound on the extinction coefficient anywhere in the medium.
    pub fn majorant(&self) -> Float {
        match &self.volume {
            Some(volume) => self.density_scale * volume.max_value(),
            None => 0.0,
        }
    }

    pub fn world_to_local(&self, p_world: Vector3f) -> Vector3f {
        self.to_world.inv_apply_point(p_world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volumes::const_volume::ConstantVolume;

    fn unit_bbox() -> AABB {
        AABB::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_majorant_is_scaled_max() {
        let volume = Arc::new(ConstantVolume::new(0.5).with_max_value(2.0).with_bbox(Some(unit_bbox())));
        let medium = Medium::new(volume).with_scale(3.0);
        assert_eq!(medium.majorant(), 6.0);
        assert!(medium.has_density());

        let zero = Medium::new(Arc::new(ConstantVolume::new(1.0))).with_scale(0.0);
        assert_eq!(zero.majorant(), 0.0);

        let empty: Medium<ConstantVolume> = Medium::empty(unit_bbox());
        assert_eq!(empty.majorant(), 0.0);
        assert!(!empty.has_density());
    }

    #[test]
    fn test_transform_moves_bounds() {
        let volume = Arc::new(ConstantVolume::new(1.0).with_bbox(Some(unit_bbox())));
        let medium = Medium::new(volume)
            .with_transform(Transform::translate(&Vector3f::new(0.0, 0.0, 5.0)));
        assert_eq!(medium.bbox().p_min, Vector3f::new(-1.0, -1.0, 4.0));
        assert_eq!(medium.bbox().p_max, Vector3f::new(1.0, 1.0, 6.0));
        assert!(medium.world_to_local(Vector3f::new(0.0, 0.0, 5.0)).norm() < 1e-6);
    }

    #[test]
    fn test_optical_properties_are_clamped() {
        let medium = Medium::new(Arc::new(ConstantVolume::new(1.0)))
            .with_albedo(Vector3f::new(1.5, 0.5, -0.1))
            .with_anisotropy(1.0);
        assert_eq!(medium.albedo(), Vector3f::new(1.0, 0.5, 0.0));
        assert_eq!(medium.anisotropy(), MAX_ANISOTROPY);
    }
}
