//! Face records and their cached plane, projection and bounds.

use polycsg_kernel_math::{Aabb3, Point2, Point3, Vec3};

use crate::topology::{EdgeId, ManifoldId, Vertex, VertexId};

/// An oriented plane `normal . p = offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal, zero for a degenerate loop.
    pub normal: Vec3,
    /// Signed distance of the plane from the origin along `normal`.
    pub offset: f64,
}

impl Plane {
    /// Best-fit plane of a closed loop using Newell's method.
    ///
    /// The normal follows the right-hand rule over the loop order.
    pub fn from_loop(points: &[Point3]) -> Self {
        let normal = newell_normal(points);
        let len = normal.norm();
        if len < f64::MIN_POSITIVE {
            return Self {
                normal: Vec3::zeros(),
                offset: 0.0,
            };
        }
        let normal = normal / len;
        let offset = normal.dot(&centroid(points).coords);
        Self { normal, offset }
    }

    /// Signed distance from `p`, positive on the normal side.
    #[inline]
    pub fn distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    /// `true` if the loop had no usable normal.
    pub fn is_degenerate(&self) -> bool {
        self.normal == Vec3::zeros()
    }

    /// The same plane facing the other way.
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }
}

/// Newell normal of a loop. Its length is twice the loop's area.
pub fn newell_normal(points: &[Point3]) -> Vec3 {
    let mut n = Vec3::zeros();
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        n.x += (a.y - b.y) * (a.z + b.z);
        n.y += (a.z - b.z) * (a.x + b.x);
        n.z += (a.x - b.x) * (a.y + b.y);
    }
    n
}

/// Average of the loop's points.
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// Drops the dominant normal axis to map a face into 2D.
///
/// Axes are ordered so that a loop which is counter-clockwise about its
/// normal stays counter-clockwise in the projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection {
    /// First kept axis.
    pub u: usize,
    /// Second kept axis.
    pub v: usize,
}

impl Projection {
    /// Projection for a face with the given normal.
    pub fn for_normal(normal: &Vec3) -> Self {
        let a = normal.map(f64::abs);
        let axis = if a.x >= a.y && a.x >= a.z {
            0
        } else if a.y >= a.z {
            1
        } else {
            2
        };
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        if normal[axis] >= 0.0 {
            Self { u, v }
        } else {
            Self { u: v, v: u }
        }
    }

    /// Map a point into the projection plane.
    #[inline]
    pub fn project(&self, p: &Point3) -> Point2 {
        Point2::new(p[self.u], p[self.v])
    }
}

/// Where a 2D point lies relative to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolygonHit {
    /// Strictly outside.
    Outside,
    /// Strictly inside.
    Inside,
    /// On the side starting at this loop position.
    Edge(usize),
    /// On the corner at this loop position.
    Vertex(usize),
}

/// Locate `q` against a closed polygon, with `eps` of slack on its boundary.
pub fn locate_in_polygon(polygon: &[Point2], q: &Point2, eps: f64) -> PolygonHit {
    let n = polygon.len();
    if let Some(i) = polygon.iter().position(|p| (p - q).norm() <= eps) {
        return PolygonHit::Vertex(i);
    }
    for i in 0..n {
        if distance_to_segment_2d(q, &polygon[i], &polygon[(i + 1) % n]) <= eps {
            return PolygonHit::Edge(i);
        }
    }

    // Crossing test against a horizontal ray towards +u.
    let mut inside = false;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        if (a.y > q.y) != (b.y > q.y) {
            let x = a.x + (q.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if q.x < x {
                inside = !inside;
            }
        }
    }
    if inside {
        PolygonHit::Inside
    } else {
        PolygonHit::Outside
    }
}

fn distance_to_segment_2d(q: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < f64::MIN_POSITIVE {
        return (q - a).norm();
    }
    let t = ((q - a).dot(&d) / len_sq).clamp(0.0, 1.0);
    (q - (a + d * t)).norm()
}

/// A planar polygon bounded by a closed loop of directed edges.
#[derive(Debug, Clone)]
pub struct Face {
    /// Loop vertices in order.
    pub vertices: Vec<VertexId>,
    /// `edges[i]` runs from `vertices[i]` to `vertices[i + 1]`.
    pub edges: Vec<EdgeId>,
    /// Cached supporting plane.
    pub plane: Plane,
    /// Cached 2D projection basis.
    pub projection: Projection,
    /// Cached bounds, padded by the linear tolerance.
    pub aabb: Aabb3,
    /// The manifold this face belongs to.
    pub manifold: ManifoldId,
}

impl Face {
    pub(crate) fn new(vertices: Vec<VertexId>, edges: Vec<EdgeId>) -> Self {
        Self {
            vertices,
            edges,
            plane: Plane {
                normal: Vec3::zeros(),
                offset: 0.0,
            },
            projection: Projection { u: 0, v: 1 },
            aabb: Aabb3::empty(),
            manifold: ManifoldId(0),
        }
    }

    /// Number of loop vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always `false` for a face stored in a polyhedron.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Loop positions.
    pub fn points(&self, vertices: &[Vertex]) -> Vec<Point3> {
        self.vertices
            .iter()
            .map(|v| vertices[v.index()].position)
            .collect()
    }

    /// Loop positions mapped into the face's projection plane.
    pub fn projected(&self, vertices: &[Vertex]) -> Vec<Point2> {
        self.vertices
            .iter()
            .map(|v| self.projection.project(&vertices[v.index()].position))
            .collect()
    }

    /// Loop centroid.
    pub fn centroid(&self, vertices: &[Vertex]) -> Point3 {
        centroid(&self.points(vertices))
    }

    /// Polygon area.
    pub fn area(&self, vertices: &[Vertex]) -> f64 {
        newell_normal(&self.points(vertices)).norm() * 0.5
    }

    /// Recompute plane, projection and padded bounds from current positions.
    pub(crate) fn update_geometry(&mut self, vertices: &[Vertex], eps: f64) {
        let points = self.points(vertices);
        self.plane = Plane::from_loop(&points);
        self.projection = Projection::for_normal(&self.plane.normal);
        self.aabb = Aabb3::from_points(&points).expanded(eps);
    }

    /// Reverse the loop in place. The caller swaps the edge directions.
    pub(crate) fn reverse_loop(&mut self) {
        self.vertices.reverse();
        self.edges.reverse();
        self.edges.rotate_left(1);
        self.plane = self.plane.flipped();
        self.projection = Projection::for_normal(&self.plane.normal);
    }

    /// Signed volume contribution of the face relative to the origin.
    pub(crate) fn signed_volume(&self, vertices: &[Vertex]) -> f64 {
        let points = self.points(vertices);
        let p0 = points[0].coords;
        let mut vol = 0.0;
        for i in 1..points.len() - 1 {
            vol += p0.dot(&points[i].coords.cross(&points[i + 1].coords));
        }
        vol / 6.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ]
    }

    #[test]
    fn test_newell_plane() {
        let plane = Plane::from_loop(&square());
        assert_relative_eq!(plane.normal, Vec3::z());
        assert_relative_eq!(plane.offset, 1.0);
        assert_relative_eq!(plane.distance(&Point3::new(5.0, 5.0, 3.0)), 2.0);
        assert_relative_eq!(newell_normal(&square()).norm() * 0.5, 1.0);
    }

    #[test]
    fn test_degenerate_plane() {
        let line = vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert!(Plane::from_loop(&line).is_degenerate());
    }

    #[test]
    fn test_projection_keeps_ccw() {
        for normal in [
            Vec3::x(),
            -Vec3::x(),
            Vec3::y(),
            -Vec3::y(),
            Vec3::z(),
            -Vec3::z(),
        ] {
            let proj = Projection::for_normal(&normal);
            // Build a CCW triangle about `normal` and check its 2D winding.
            let a = if normal.x.abs() > 0.5 { Vec3::y() } else { Vec3::x() };
            let b = normal.cross(&a);
            let tri = [Point3::origin(), Point3::from(a), Point3::from(b)];
            let p: Vec<Point2> = tri.iter().map(|q| proj.project(q)).collect();
            let area2 = (p[1] - p[0]).perp(&(p[2] - p[0]));
            assert!(area2 > 0.0, "normal {normal:?} projected clockwise");
        }
    }

    #[test]
    fn test_locate_in_polygon() {
        let poly = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let eps = 1e-6;
        assert_eq!(locate_in_polygon(&poly, &Point2::new(1.0, 1.0), eps), PolygonHit::Inside);
        assert_eq!(locate_in_polygon(&poly, &Point2::new(3.0, 1.0), eps), PolygonHit::Outside);
        assert_eq!(locate_in_polygon(&poly, &Point2::new(1.0, 0.0), eps), PolygonHit::Edge(0));
        assert_eq!(locate_in_polygon(&poly, &Point2::new(2.0, 2.0), eps), PolygonHit::Vertex(2));
    }

    #[test]
    fn test_locate_in_concave_polygon() {
        // An L shape: the notch at (1.5, 1.5) is outside.
        let poly = [
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        assert_eq!(locate_in_polygon(&poly, &Point2::new(1.5, 1.5), 1e-9), PolygonHit::Outside);
        assert_eq!(locate_in_polygon(&poly, &Point2::new(0.5, 1.5), 1e-9), PolygonHit::Inside);
    }
}
