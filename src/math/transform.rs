// Copyright 2020 @TwoCookingMice

use super::aabb::AABB;
use super::constants::{ Vector3f, Matrix4f };

/// Affine transform carrying its own inverse. Media store their
/// local-to-world transform here; world-to-local is `inv_apply_*`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    matrix: Matrix4f,
    inv_matrix: Matrix4f
}

impl Default for Transform {
    fn default() -> Self {
        Self { matrix: Matrix4f::identity(),
               inv_matrix: Matrix4f::identity() }
    }
}

impl Transform {
    pub fn new(matrix: Matrix4f) -> Self {
        Self { matrix: matrix,
               inv_matrix: matrix.try_inverse().unwrap_or(Matrix4f::identity())}
    }

    pub fn translate(t: &Vector3f) -> Self {
        Self::new(Matrix4f::new_translation(t))
    }

    pub fn scale(s: &Vector3f) -> Self {
        Self::new(Matrix4f::new_nonuniform_scaling(s))
    }

    /// Returns `self * other`, i.e. `other` is applied first.
    pub fn then(&self, other: &Transform) -> Self {
        Self { matrix: self.matrix * other.matrix,
               inv_matrix: other.inv_matrix * self.inv_matrix }
    }

    pub fn apply_point(&self, p: Vector3f) -> Vector3f {
        transform_point(&self.matrix, p)
    }

    pub fn apply_vector(&self, v: Vector3f) -> Vector3f {
        transform_vector(&self.matrix, v)
    }

    pub fn inv_apply_point(&self, p: Vector3f) -> Vector3f {
        transform_point(&self.inv_matrix, p)
    }

    pub fn apply_aabb(&self, bbox: &AABB) -> AABB {
        let mut out = AABB::default();
        for corner in bbox.corners().iter() {
            out.expand_by_point(&self.apply_point(*corner));
        }
        out
    }
}

fn transform_point(m: &Matrix4f, p: Vector3f) -> Vector3f {
    let x = p[0] * m[(0, 0)] + p[1] * m[(0, 1)] + p[2] * m[(0, 2)] + m[(0, 3)];
    let y = p[0] * m[(1, 0)] + p[1] * m[(1, 1)] + p[2] * m[(1, 2)] + m[(1, 3)];
    let z = p[0] * m[(2, 0)] + p[1] * m[(2, 1)] + p[2] * m[(2, 2)] + m[(2, 3)];
    let w = p[0] * m[(3, 0)] + p[1] * m[(3, 1)] + p[2] * m[(3, 2)] + m[(3, 3)];

    if w == 1.0 {
        Vector3f::new(x, y, z)
    } else {
        Vector3f::new(x / w, y / w, z / w)
    }
}

fn transform_vector(m: &Matrix4f, v: Vector3f) -> Vector3f {
    let x = v[0] * m[(0, 0)] + v[1] * m[(0, 1)] + v[2] * m[(0, 2)];
    let y = v[0] * m[(1, 0)] + v[1] * m[(1, 1)] + v[2] * m[(1, 2)];
    let z = v[0] * m[(2, 0)] + v[1] * m[(2, 1)] + v[2] * m[(2, 2)];

    Vector3f::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: Vector3f, b: Vector3f) {
        assert!((a - b).norm() < 1e-5, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_translate_roundtrip() {
        let t = Transform::translate(&Vector3f::new(1.0, 2.0, 3.0));
        let p = Vector3f::new(0.5, -0.5, 2.0);
        assert_vec_close(t.apply_point(p), Vector3f::new(1.5, 1.5, 5.0));
        assert_vec_close(t.inv_apply_point(t.apply_point(p)), p);
        // Vectors ignore translation.
        assert_vec_close(t.apply_vector(p), p);
    }

    #[test]
    fn test_compose_scale_then_translate() {
        let s = Transform::scale(&Vector3f::new(2.0, 2.0, 2.0));
        let t = Transform::translate(&Vector3f::new(0.0, 0.0, 1.0));
        let m = t.then(&s);
        assert_vec_close(m.apply_point(Vector3f::new(1.0, 1.0, 1.0)), Vector3f::new(2.0, 2.0, 3.0));
        assert_vec_close(m.inv_apply_point(Vector3f::new(2.0, 2.0, 3.0)), Vector3f::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_apply_aabb() {
        let t = Transform::translate(&Vector3f::new(1.0, 0.0, 0.0))
            .then(&Transform::scale(&Vector3f::new(2.0, 1.0, 1.0)));
        let bbox = AABB::new(Vector3f::zeros(), Vector3f::new(1.0, 1.0, 1.0));
        let out = t.apply_aabb(&bbox);
        assert_vec_close(out.p_min, Vector3f::new(1.0, 0.0, 0.0));
        assert_vec_close(out.p_max, Vector3f::new(3.0, 1.0, 1.0));
    }
}
