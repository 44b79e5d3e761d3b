//! Point-in-solid classification.
//!
//! A point is first rejected against the bounds, then tested against nearby
//! faces for boundary contact, and finally a ray segment is cast through
//! the octree. Rays that graze an edge, a vertex or lie in a face plane are
//! retried along the next direction in a fixed table.

use polycsg_kernel_math::{is_finite_point, Aabb3, LineSegment, Point3, Vec3};
use rayon::prelude::*;

use crate::config::CrossingRule;
use crate::error::PolyResult;
use crate::face::{locate_in_polygon, Face, PolygonHit};
use crate::polyhedron::Polyhedron;
use crate::topology::{EdgeId, FaceId, ManifoldId, VertexId};

/// Ray directions tried in order. None is axis aligned or diagonal.
const RAY_DIRECTIONS: [[f64; 3]; 8] = [
    [1.0, 0.2371, 0.1337],
    [-0.3122, 1.0, 0.4471],
    [0.1731, -0.2903, 1.0],
    [-1.0, -0.3719, 0.2141],
    [0.4242, -1.0, -0.1618],
    [-0.2718, 0.3141, -1.0],
    [0.7071, 0.6180, -0.5772],
    [-0.5559, -0.7309, 0.6931],
];

/// Coarse answer of a containment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    /// Outside the solid.
    Outside,
    /// On a face within tolerance.
    OnBoundary,
    /// Inside the solid.
    Inside,
}

/// Which part of a face a boundary point touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryFeature {
    /// The face interior.
    Face,
    /// One of the face's edges.
    Edge(EdgeId),
    /// One of the face's vertices.
    Vertex(VertexId),
}

/// The face a boundary point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryHit {
    /// Lowest-id face containing the point.
    pub face: FaceId,
    /// Feature of that face the point touches.
    pub feature: BoundaryFeature,
}

/// Result of a containment query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Containment {
    /// Inside, outside or on the boundary.
    pub class: PointClass,
    /// Set when `class` is [`PointClass::OnBoundary`].
    pub hit: Option<BoundaryHit>,
}

impl Containment {
    fn outside() -> Self {
        Self {
            class: PointClass::Outside,
            hit: None,
        }
    }

    fn inside_if(inside: bool) -> Self {
        Self {
            class: if inside {
                PointClass::Inside
            } else {
                PointClass::Outside
            },
            hit: None,
        }
    }

    fn on(hit: BoundaryHit) -> Self {
        Self {
            class: PointClass::OnBoundary,
            hit: Some(hit),
        }
    }

    /// `true` for [`PointClass::Inside`].
    pub fn is_inside(&self) -> bool {
        self.class == PointClass::Inside
    }
}

/// Options for [`Polyhedron::classify_point`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Test against one manifold alone instead of the whole polyhedron.
    pub manifold: Option<ManifoldId>,
    /// Override the configured crossing rule.
    pub rule: Option<CrossingRule>,
}

impl ClassifyOptions {
    /// Scope the query to one manifold.
    pub fn in_manifold(id: ManifoldId) -> Self {
        Self {
            manifold: Some(id),
            rule: None,
        }
    }

    /// Use `rule` for this query.
    pub fn with_rule(mut self, rule: CrossingRule) -> Self {
        self.rule = Some(rule);
        self
    }
}

/// Crossing count and signed crossing sum for one manifold.
#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    count: u32,
    winding: i32,
}

impl Tally {
    fn inside(&self, rule: CrossingRule) -> bool {
        match rule {
            CrossingRule::EvenOdd => self.count % 2 == 1,
            CrossingRule::NonZero => self.winding != 0,
        }
    }
}

enum RayFace {
    Miss,
    Cross(i32),
    Graze,
}

impl Polyhedron {
    /// Classify a point against the whole polyhedron with the configured
    /// crossing rule.
    pub fn contains_vertex(&self, p: &Point3) -> Containment {
        self.classify_unscoped(p, self.config.crossing_rule)
    }

    /// Classify a point, optionally against a single manifold.
    pub fn classify_point(&self, p: &Point3, options: &ClassifyOptions) -> PolyResult<Containment> {
        let rule = options.rule.unwrap_or(self.config.crossing_rule);
        match options.manifold {
            Some(m) => {
                self.manifold(m)?;
                Ok(self.manifold_containment(p, m, rule))
            }
            None => Ok(self.classify_unscoped(p, rule)),
        }
    }

    /// Classify many points in parallel.
    pub fn classify_points(
        &self,
        points: &[Point3],
        options: &ClassifyOptions,
    ) -> PolyResult<Vec<Containment>> {
        if let Some(m) = options.manifold {
            self.manifold(m)?;
        }
        let rule = options.rule.unwrap_or(self.config.crossing_rule);
        Ok(points
            .par_iter()
            .map(|p| match options.manifold {
                Some(m) => self.manifold_containment(p, m, rule),
                None => self.classify_unscoped(p, rule),
            })
            .collect())
    }

    /// Containment in one manifold alone. `m` must be in range.
    pub(crate) fn manifold_containment(&self, p: &Point3, m: ManifoldId, rule: CrossingRule) -> Containment {
        let bounds = self.manifolds[m.index()].aabb;
        if !is_finite_point(p) || !bounds.contains_point(p) {
            return Containment::outside();
        }
        if let Some(hit) = self.boundary_hit(p, Some(m)) {
            return Containment::on(hit);
        }
        let tallies = self.cast(p, &bounds, |face| face.manifold == m);
        Containment::inside_if(tallies[m.index()].inside(rule))
    }

    fn classify_unscoped(&self, p: &Point3, rule: CrossingRule) -> Containment {
        if !is_finite_point(p) || !self.aabb.contains_point(p) {
            return Containment::outside();
        }
        if let Some(hit) = self.boundary_hit(p, None) {
            return Containment::on(hit);
        }
        let tallies = self.cast(p, &self.aabb, |face| self.manifolds[face.manifold.index()].is_closed);

        let inside = match rule {
            CrossingRule::NonZero => {
                let sum: i32 = self
                    .manifolds
                    .iter()
                    .zip(&tallies)
                    .filter(|(info, tally)| info.is_closed && tally.inside(rule))
                    .map(|(info, _)| if info.is_negative { -1 } else { 1 })
                    .sum();
                sum > 0
            }
            CrossingRule::EvenOdd => {
                let containing = self
                    .manifolds
                    .iter()
                    .zip(&tallies)
                    .filter(|(info, tally)| info.is_closed && tally.inside(rule))
                    .count();
                containing % 2 == 1
            }
        };
        Containment::inside_if(inside)
    }

    /// The lowest-id face `p` lies on, with the touched feature.
    fn boundary_hit(&self, p: &Point3, scope: Option<ManifoldId>) -> Option<BoundaryHit> {
        let eps = self.config.epsilon;
        let probe = Aabb3::new(*p, *p).expanded(eps);
        for f in self.octree.faces_in_aabb(&probe) {
            let face = &self.faces[f.index()];
            if scope.is_some_and(|m| face.manifold != m) || face.plane.is_degenerate() {
                continue;
            }
            if face.plane.distance(p).abs() > eps {
                continue;
            }
            let polygon = face.projected(&self.vertices);
            let q = face.projection.project(p);
            let feature = match locate_in_polygon(&polygon, &q, eps) {
                PolygonHit::Outside => continue,
                PolygonHit::Inside => BoundaryFeature::Face,
                PolygonHit::Edge(i) => BoundaryFeature::Edge(face.edges[i]),
                PolygonHit::Vertex(i) => BoundaryFeature::Vertex(face.vertices[i]),
            };
            return Some(BoundaryHit { face: f, feature });
        }
        None
    }

    /// Cast rays from `p` until one crosses faces cleanly, returning the
    /// crossings per manifold.
    fn cast(&self, p: &Point3, bounds: &Aabb3, include: impl Fn(&Face) -> bool) -> Vec<Tally> {
        let length = bounds.diagonal() * 2.0 + self.config.epsilon;
        let mut tallies = vec![Tally::default(); self.manifolds.len()];

        for (attempt, dir) in RAY_DIRECTIONS.iter().enumerate() {
            let d = Vec3::new(dir[0], dir[1], dir[2]).normalize();
            let segment = LineSegment::from_ray(*p, &d, length);
            tallies.iter_mut().for_each(|t| *t = Tally::default());

            let mut grazed = false;
            for f in self.octree.faces_along_segment(&segment) {
                let face = &self.faces[f.index()];
                if face.plane.is_degenerate() || !include(face) {
                    continue;
                }
                match self.ray_face(p, &d, length, face) {
                    RayFace::Miss => {}
                    RayFace::Cross(sign) => {
                        let tally = &mut tallies[face.manifold.index()];
                        tally.count += 1;
                        tally.winding += sign;
                    }
                    RayFace::Graze => {
                        grazed = true;
                        break;
                    }
                }
            }
            if !grazed {
                return tallies;
            }
            tracing::trace!(attempt, "ray grazed a face boundary, retrying");
        }

        // Every direction grazed: count clean crossings of the last ray only.
        tracing::debug!(?p, "all ray directions grazed");
        let d = Vec3::new(RAY_DIRECTIONS[7][0], RAY_DIRECTIONS[7][1], RAY_DIRECTIONS[7][2]).normalize();
        let segment = LineSegment::from_ray(*p, &d, length);
        tallies.iter_mut().for_each(|t| *t = Tally::default());
        for f in self.octree.faces_along_segment(&segment) {
            let face = &self.faces[f.index()];
            if face.plane.is_degenerate() || !include(face) {
                continue;
            }
            if let RayFace::Cross(sign) = self.ray_face(p, &d, length, face) {
                let tally = &mut tallies[face.manifold.index()];
                tally.count += 1;
                tally.winding += sign;
            }
        }
        tallies
    }

    /// Intersect the ray `p + t d`, `0 < t <= length`, with one face.
    fn ray_face(&self, p: &Point3, d: &Vec3, length: f64, face: &Face) -> RayFace {
        let eps = self.config.epsilon;
        let denom = face.plane.normal.dot(d);
        let dist = face.plane.distance(p);

        // The ray moves less than eps off the plane over its whole length.
        if denom.abs() * length < eps {
            return if dist.abs() <= eps {
                RayFace::Graze
            } else {
                RayFace::Miss
            };
        }

        let t = -dist / denom;
        if t <= 0.0 || t > length {
            return RayFace::Miss;
        }
        let hit = p + d * t;
        let polygon = face.projected(&self.vertices);
        match locate_in_polygon(&polygon, &face.projection.project(&hit), eps) {
            PolygonHit::Outside => RayFace::Miss,
            PolygonHit::Inside => RayFace::Cross(if denom > 0.0 { 1 } else { -1 }),
            PolygonHit::Edge(_) | PolygonHit::Vertex(_) => RayFace::Graze,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PolyConfig;
    use crate::input::FaceVertexData;
    use crate::test_shapes::{cube, hollow_cube, inverted, merge, open_box, tetrahedron};

    fn unit_cube() -> Polyhedron {
        Polyhedron::new(&cube(Point3::origin(), 1.0)).unwrap()
    }

    #[test]
    fn test_cube_inside_outside() {
        let poly = unit_cube();
        assert_eq!(poly.contains_vertex(&Point3::new(0.5, 0.5, 0.5)).class, PointClass::Inside);
        assert_eq!(poly.contains_vertex(&Point3::new(100.0, 0.0, 0.0)).class, PointClass::Outside);
        assert_eq!(poly.contains_vertex(&Point3::new(1.5, 0.5, 0.5)).class, PointClass::Outside);
        assert_eq!(poly.contains_vertex(&Point3::new(0.1, 0.9, 0.05)).class, PointClass::Inside);
    }

    #[test]
    fn test_boundary_features() {
        let poly = unit_cube();
        let on_face = poly.contains_vertex(&Point3::new(0.5, 0.5, 1.0));
        assert_eq!(on_face.class, PointClass::OnBoundary);
        assert_eq!(
            on_face.hit,
            Some(BoundaryHit {
                face: FaceId(1),
                feature: BoundaryFeature::Face
            })
        );

        let on_edge = poly.contains_vertex(&Point3::new(0.5, 0.0, 0.0)).hit.unwrap();
        let e = match on_edge.feature {
            BoundaryFeature::Edge(e) => e,
            other => panic!("expected an edge hit, got {other:?}"),
        };
        assert!(poly.edge(e).joins(VertexId(0), VertexId(1)));

        let on_vertex = poly.contains_vertex(&Point3::new(1.0, 1.0, 1.0)).hit.unwrap();
        assert_eq!(on_vertex.feature, BoundaryFeature::Vertex(VertexId(6)));

        // Within tolerance of the face.
        let near = poly.contains_vertex(&Point3::new(0.5, 0.5, 1.0 + 5e-7));
        assert_eq!(near.class, PointClass::OnBoundary);
    }

    #[test]
    fn test_centroids_inside() {
        let data = merge(&[
            cube(Point3::new(-3.0, 0.0, 0.0), 2.0),
            tetrahedron(),
            cube(Point3::new(5.0, 5.0, 5.0), 0.5),
        ]);
        let poly = Polyhedron::new(&data).unwrap();
        for m in 0..poly.manifold_count() {
            let id = ManifoldId(m as u32);
            let aabb = poly.manifold_aabb(id).unwrap();
            let centre = if m == 1 {
                Point3::new(0.25, 0.25, 0.25)
            } else {
                aabb.center()
            };
            assert!(poly.contains_vertex(&centre).is_inside(), "manifold {m}");
            let scoped = poly.classify_point(&centre, &ClassifyOptions::in_manifold(id)).unwrap();
            assert!(scoped.is_inside());
        }
    }

    #[test]
    fn test_cavity_classification() {
        let poly = Polyhedron::new(&hollow_cube()).unwrap();
        let between = Point3::new(0.5, 2.0, 2.0);
        let cavity = Point3::new(2.0, 2.0, 2.0);
        assert_eq!(poly.contains_vertex(&between).class, PointClass::Inside);
        assert_eq!(poly.contains_vertex(&cavity).class, PointClass::Outside);

        let even_odd = ClassifyOptions::default().with_rule(CrossingRule::EvenOdd);
        assert!(poly.classify_point(&between, &even_odd).unwrap().is_inside());
        assert!(!poly.classify_point(&cavity, &even_odd).unwrap().is_inside());

        // The cavity shell alone still encloses its interior.
        let scoped = ClassifyOptions::in_manifold(ManifoldId(1));
        assert!(poly.classify_point(&cavity, &scoped).unwrap().is_inside());
        assert!(!poly.classify_point(&between, &scoped).unwrap().is_inside());
    }

    #[test]
    fn test_crossing_rules_differ_on_overlap() {
        // Two overlapping positive cubes: the overlap has winding 2.
        let data = merge(&[
            cube(Point3::origin(), 2.0),
            cube(Point3::new(1.0, 0.25, 0.25), 2.0),
        ]);
        let poly = Polyhedron::new(&data).unwrap();
        let overlap = Point3::new(1.5, 1.0, 1.0);
        let nonzero = ClassifyOptions::default().with_rule(CrossingRule::NonZero);
        let even_odd = ClassifyOptions::default().with_rule(CrossingRule::EvenOdd);
        assert!(poly.classify_point(&overlap, &nonzero).unwrap().is_inside());
        assert!(!poly.classify_point(&overlap, &even_odd).unwrap().is_inside());
        // The default is non-zero.
        assert!(poly.contains_vertex(&overlap).is_inside());
    }

    #[test]
    fn test_configured_rule_is_default() {
        let data = merge(&[
            cube(Point3::origin(), 2.0),
            cube(Point3::new(1.0, 0.25, 0.25), 2.0),
        ]);
        let config = PolyConfig {
            crossing_rule: CrossingRule::EvenOdd,
            ..PolyConfig::default()
        };
        let poly = Polyhedron::with_config(&data, config).unwrap();
        assert!(!poly.contains_vertex(&Point3::new(1.5, 1.0, 1.0)).is_inside());
    }

    #[test]
    fn test_open_manifolds_ignored() {
        let poly = Polyhedron::new(&open_box()).unwrap();
        assert!(!poly.contains_vertex(&Point3::new(0.5, 0.5, 0.5)).is_inside());
        // Scoped to the open manifold, its crossings are still counted.
        let scoped = ClassifyOptions::in_manifold(ManifoldId(0));
        let c = poly.classify_point(&Point3::new(0.5, 0.5, 0.5), &scoped).unwrap();
        assert_ne!(c.class, PointClass::OnBoundary);
    }

    #[test]
    fn test_inverted_cube_alone() {
        let poly = Polyhedron::new(&inverted(cube(Point3::origin(), 1.0))).unwrap();
        assert!(poly.manifold_is_negative(ManifoldId(0)).unwrap());
        // A lone cavity removes material from nothing.
        assert!(!poly.contains_vertex(&Point3::new(0.5, 0.5, 0.5)).is_inside());
        let scoped = ClassifyOptions::in_manifold(ManifoldId(0));
        assert!(poly.classify_point(&Point3::new(0.5, 0.5, 0.5), &scoped).unwrap().is_inside());
    }

    #[test]
    fn test_cavity_inside_cavity_is_outside() {
        let data = merge(&[
            cube(Point3::origin(), 10.0),
            inverted(cube(Point3::new(2.0, 2.0, 2.0), 6.0)),
            inverted(cube(Point3::new(4.0, 4.0, 4.0), 2.0)),
        ]);
        let poly = Polyhedron::new(&data).unwrap();
        assert_eq!(poly.manifold_depth(ManifoldId(2)).unwrap(), 2);
        assert_eq!(poly.contains_vertex(&Point3::new(5.0, 5.0, 5.0)).class, PointClass::Outside);
        assert_eq!(poly.contains_vertex(&Point3::new(3.0, 5.0, 5.0)).class, PointClass::Outside);
        assert_eq!(poly.contains_vertex(&Point3::new(1.0, 5.0, 5.0)).class, PointClass::Inside);
    }

    #[test]
    fn test_grazing_ray_retries() {
        // Aim the first ray exactly at the vertical edge x = 1, y = 1.
        let poly = unit_cube();
        let [x, y, z] = RAY_DIRECTIONS[0];
        let d = Vec3::new(x, y, z).normalize();
        let p = Point3::new(1.0, 1.0, 0.5) - d * 0.5;
        assert!(poly.aabb().contains_point(&p));
        assert!(poly.contains_vertex(&p).is_inside());

        let outside = Point3::new(1.0, 1.0, 0.5) + d * 0.5;
        assert_eq!(poly.contains_vertex(&outside).class, PointClass::Outside);
    }

    #[test]
    fn test_non_finite_point_is_outside() {
        let poly = unit_cube();
        assert_eq!(
            poly.contains_vertex(&Point3::new(f64::NAN, 0.5, 0.5)).class,
            PointClass::Outside
        );
    }

    #[test]
    fn test_batch_matches_single() {
        let poly = Polyhedron::new(&hollow_cube()).unwrap();
        let points: Vec<Point3> = (0..50)
            .map(|i| {
                let t = i as f64 / 49.0;
                Point3::new(-0.5 + 5.0 * t, 2.0 + 0.1 * t, 1.9)
            })
            .collect();
        let batch = poly.classify_points(&points, &ClassifyOptions::default()).unwrap();
        for (p, c) in points.iter().zip(&batch) {
            assert_eq!(*c, poly.contains_vertex(p));
        }
    }

    #[test]
    fn test_scoped_query_rejects_bad_manifold() {
        let poly = unit_cube();
        let opts = ClassifyOptions::in_manifold(ManifoldId(7));
        assert!(poly.classify_point(&Point3::origin(), &opts).is_err());
        assert!(poly.classify_points(&[Point3::origin()], &opts).is_err());
    }

    #[test]
    fn test_large_mesh_uses_octree() {
        let parts: Vec<FaceVertexData> = (0..30)
            .map(|i| cube(Point3::new(i as f64 * 1.5, 0.0, 0.0), 1.0))
            .collect();
        let poly = Polyhedron::new(&merge(&parts)).unwrap();
        assert!(poly.octree().node_count() > 1);
        for i in 0..30 {
            let inside = Point3::new(i as f64 * 1.5 + 0.5, 0.5, 0.5);
            let gap = Point3::new(i as f64 * 1.5 + 1.25, 0.5, 0.5);
            assert!(poly.contains_vertex(&inside).is_inside());
            assert_eq!(poly.contains_vertex(&gap).class, PointClass::Outside);
        }
    }
}
