// Copyright @yucwang 2026

use crate::core::volume::{Volume, VolumeAccessor};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f};

/// Spatially constant density. The reported maximum may be raised above the
/// actual value to emulate a loose majorant.
pub struct ConstantVolume {
    value: Float,
    max_value: Float,
    bbox: Option<AABB>,
}

impl ConstantVolume {
    pub fn new(value: Float) -> Self {
        Self {
            value,
            max_value: value.max(0.0),
            bbox: None,
        }
    }

    pub fn with_max_value(mut self, max_value: Float) -> Self {
        self.max_value = max_value.max(self.value);
        self
    }

    pub fn with_bbox(mut self, bbox: Option<AABB>) -> Self {
        self.bbox = bbox;
        self
    }
}

pub struct ConstantAccessor {
    value: Float,
    lookups: usize,
}

impl Volume for ConstantVolume {
    type Accessor<'a> = ConstantAccessor;

    fn accessor(&self) -> ConstantAccessor {
        ConstantAccessor { value: self.value, lookups: 0 }
    }

    fn max_value(&self) -> Float {
        self.max_value
    }

    fn eval(&self, _p_local: Vector3f) -> Float {
        self.value
    }

    fn bbox(&self) -> Option<AABB> {
        self.bbox
    }
}

impl VolumeAccessor for ConstantAccessor {
    fn lookup_stochastic(&mut self, _p_local: Vector3f, _u: Vector3f) -> Float {
        self.lookups += 1;
        self.value
    }

    fn lookups(&self) -> usize {
        self.lookups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_volume_scalar() {
        let vol = ConstantVolume::new(2.0);
        assert!(vol.bbox().is_none());
        assert_eq!(vol.max_value(), 2.0);
        assert_eq!(vol.eval(Vector3f::new(0.1, 0.2, 0.3)), 2.0);
    }

    #[test]
    fn constant_volume_max_never_below_value() {
        let vol = ConstantVolume::new(2.0).with_max_value(1.0);
        assert_eq!(vol.max_value(), 2.0);
        let vol = ConstantVolume::new(-1.0);
        assert_eq!(vol.max_value(), 0.0);
    }

    #[test]
    fn constant_volume_bbox() {
        let bbox = AABB::new(Vector3f::new(-1.0, 0.0, 1.0), Vector3f::new(2.0, 3.0, 4.0));
        let vol = ConstantVolume::new(1.0).with_bbox(Some(bbox));
        let out = vol.bbox().unwrap();
        assert_eq!(out.p_min, Vector3f::new(-1.0, 0.0, 1.0));
        assert_eq!(out.p_max, Vector3f::new(2.0, 3.0, 4.0));
    }
}
