//! Line segments and segment/box overlap tests.

use crate::{Aabb3, Point3, Vec3};

/// A finite line segment from `v1` to `v2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    /// Start point.
    pub v1: Point3,
    /// End point.
    pub v2: Point3,
}

impl LineSegment {
    /// Create a segment between two points.
    pub fn new(v1: Point3, v2: Point3) -> Self {
        Self { v1, v2 }
    }

    /// A segment starting at `origin` running `length` along `direction`.
    ///
    /// `direction` does not need to be normalized.
    pub fn from_ray(origin: Point3, direction: &Vec3, length: f64) -> Self {
        Self {
            v1: origin,
            v2: origin + direction.normalize() * length,
        }
    }

    /// Vector from `v1` to `v2`.
    pub fn delta(&self) -> Vec3 {
        self.v2 - self.v1
    }

    /// Bounding box of the segment.
    pub fn aabb(&self) -> Aabb3 {
        Aabb3::from_points([&self.v1, &self.v2])
    }

    /// Test segment/box overlap using the slab method.
    ///
    /// The box is grown by `eps` first. Axis-parallel segments are handled
    /// without dividing by zero.
    pub fn intersects_aabb(&self, aabb: &Aabb3, eps: f64) -> bool {
        let bounds = aabb.expanded(eps);
        let d = self.delta();
        let mut t_min: f64 = 0.0;
        let mut t_max: f64 = 1.0;

        for axis in 0..3 {
            let origin = self.v1[axis];
            let lo = bounds.min[axis];
            let hi = bounds.max[axis];
            if d[axis].abs() < f64::EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / d[axis];
            let mut t1 = (lo - origin) * inv;
            let mut t2 = (hi - origin) * inv;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }
            t_min = t_min.max(t1);
            t_max = t_max.min(t2);
            if t_min > t_max {
                return false;
            }
        }
        true
    }
}
