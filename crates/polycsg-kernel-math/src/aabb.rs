//! Axis-aligned bounding boxes.
//!
//! Used by the polyhedron engine for face/edge bounds, for octree node
//! regions and as the common currency of locality queries.

use crate::{Point3, Vec3};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// The bounding box of a set of points. Empty if the iterator is.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// A box centred on `center` with half extents `half`.
    pub fn from_center_half_extents(center: Point3, half: Vec3) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// `true` if no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box.
    pub fn include_aabb(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Test if two AABBs overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &Aabb3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Test if a point lies inside or on the box.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Expand the AABB by a tolerance in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// A copy expanded by `tol` in all directions.
    pub fn expanded(&self, tol: f64) -> Aabb3 {
        let mut out = *self;
        out.expand(tol);
        out
    }

    /// Scale the box about its centre by `factor`, keeping at least
    /// `min_half` of half extent on every axis.
    ///
    /// Zero-thickness boxes (a planar face aligned with an axis) keep a
    /// non-zero extent so they never vanish from spatial structures.
    pub fn scaled(&self, factor: f64, min_half: f64) -> Aabb3 {
        let center = self.center();
        let half = self.half_extents() * factor;
        let half = Vec3::new(half.x.max(min_half), half.y.max(min_half), half.z.max(min_half));
        Aabb3::from_center_half_extents(center, half)
    }

    /// Centre of the box.
    pub fn center(&self) -> Point3 {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Half extents along each axis.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Length of the box diagonal.
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).norm()
        }
    }

    /// The eight octant boxes of this box, in Morton order:
    /// bit 0 selects +x, bit 1 selects +y, bit 2 selects +z.
    pub fn octants(&self) -> [Aabb3; 8] {
        let mid = self.center();
        std::array::from_fn(|i| {
            let (x0, x1) = if i & 1 == 0 { (self.min.x, mid.x) } else { (mid.x, self.max.x) };
            let (y0, y1) = if i & 2 == 0 { (self.min.y, mid.y) } else { (mid.y, self.max.y) };
            let (z0, z1) = if i & 4 == 0 { (self.min.z, mid.z) } else { (mid.z, self.max.z) };
            Aabb3::new(Point3::new(x0, y0, z0), Point3::new(x1, y1, z1))
        })
    }
}
