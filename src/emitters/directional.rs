// Copyright @yucwang 2026

use crate::math::constants::Vector3f;

/// Light arriving from infinitely far away along a single direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalEmitter {
    direction: Vector3f,
    irradiance: Vector3f,
}

impl DirectionalEmitter {
    /// `direction` is the direction light travels in; a zero vector points
    /// straight down.
    pub fn new(direction: Vector3f, irradiance: Vector3f) -> Self {
        let len = direction.norm();
        let direction = if len > 0.0 {
            direction / len
        } else {
            Vector3f::new(0.0, -1.0, 0.0)
        };
        Self { direction, irradiance }
    }

    pub fn direction(&self) -> Vector3f {
        self.direction
    }

    /// Unit direction from a shading point towards the emitter.
    pub fn to_light(&self) -> Vector3f {
        -self.direction
    }

    pub fn irradiance(&self) -> Vector3f {
        self.irradiance
    }
}
