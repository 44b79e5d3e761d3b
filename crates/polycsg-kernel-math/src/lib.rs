#![warn(missing_docs)]

//! Math types for the polycsg polyhedron kernel.
//!
//! Thin wrappers around nalgebra providing the vocabulary shared by the
//! polyhedron engine: points, vectors, affine transforms, axis-aligned
//! boxes and line segments.

pub mod aabb;
pub mod segment;

pub use aabb::Aabb3;
pub use segment::LineSegment;

use nalgebra::{Matrix4, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in a 2D projection plane.
pub type Point2 = nalgebra::Point2<f64>;

/// Returns `true` if every coordinate of `p` is finite.
#[inline]
pub fn is_finite_point(p: &Point3) -> bool {
    p.x.is_finite() && p.y.is_finite() && p.z.is_finite()
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Wrap a raw 4x4 matrix (row-major indexing as in nalgebra).
    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Determinant of the linear (upper-left 3x3) part.
    pub fn linear_determinant(&self) -> f64 {
        self.matrix.fixed_view::<3, 3>(0, 0).determinant()
    }

    /// `true` if the transform reverses handedness (a reflection).
    pub fn is_mirroring(&self) -> bool {
        self.linear_determinant() < 0.0
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
        assert!(!t.is_mirroring());
    }

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let result = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(result.x, 11.0);
        assert_relative_eq!(result.y, 22.0);
        assert_relative_eq!(result.z, 33.0);
    }

    #[test]
    fn test_mirror_detection() {
        assert!(Transform::scale(-1.0, 1.0, 1.0).is_mirroring());
        assert!(!Transform::scale(-1.0, -1.0, 1.0).is_mirroring());
        assert_relative_eq!(Transform::scale(2.0, 3.0, 4.0).linear_determinant(), 24.0);
    }

    #[test]
    fn test_from_matrix_rotation() {
        // Quarter turn about z.
        let m = Matrix4::new(
            0.0, -1.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        );
        let t = Transform::from_matrix(m);
        let result = t.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(result, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
        assert!(!t.is_mirroring());
    }

    #[test]
    fn test_finite_point() {
        assert!(is_finite_point(&Point3::new(1.0, 2.0, 3.0)));
        assert!(!is_finite_point(&Point3::new(f64::NAN, 2.0, 3.0)));
        assert!(!is_finite_point(&Point3::new(1.0, f64::INFINITY, 3.0)));
    }
}
