//! The polyhedron container and its topology queries.

use polycsg_kernel_math::{is_finite_point, Aabb3, LineSegment, Point3, Vec3};

use crate::config::PolyConfig;
use crate::connectivity::{self, Topology};
use crate::diagnostic::Diagnostic;
use crate::error::{PolyError, PolyResult};
use crate::face::Face;
use crate::input::FaceVertexData;
use crate::manifold::{mark_manifolds, measure_manifolds, ManifoldInfo};
use crate::octree::{Octree, OctreeInput};
use crate::topology::{coincident_edges, Edge, EdgeId, FaceId, ManifoldId, Vertex, VertexId};

/// Shape of a locality query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpatialQuery {
    /// A single point.
    Point(Point3),
    /// A line segment, matched through its bounding box.
    Segment(LineSegment),
    /// An axis-aligned box.
    Aabb(Aabb3),
    /// The bounds of one of the polyhedron's faces.
    Face(FaceId),
    /// The bounds of one of the polyhedron's edges.
    Edge(EdgeId),
}

/// A boundary-representation polyhedron.
///
/// Built from face loops over shared vertices. Construction derives edge
/// connectivity, splits faces into manifolds, builds the spatial index and
/// computes how closed manifolds nest. Every mutating call leaves all of
/// that derived state current before it returns.
#[derive(Debug, Clone)]
pub struct Polyhedron {
    pub(crate) config: PolyConfig,
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
    pub(crate) manifolds: Vec<ManifoldInfo>,
    pub(crate) aabb: Aabb3,
    pub(crate) octree: Octree,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl Polyhedron {
    /// Build with the default configuration.
    pub fn new(data: &FaceVertexData) -> PolyResult<Self> {
        Self::with_config(data, PolyConfig::default())
    }

    /// Build with an explicit configuration.
    ///
    /// Fails only if the configuration is invalid or no face is usable;
    /// other problems are recorded in [`diagnostics`](Self::diagnostics).
    pub fn with_config(data: &FaceVertexData, config: PolyConfig) -> PolyResult<Self> {
        config.validate()?;
        let topology = connectivity::build(data, &config)?;
        Ok(Self::assemble(config, topology))
    }

    /// Build from the flat coordinate/face encoding.
    pub fn from_flat(coords: &[f64], faces: &[usize]) -> PolyResult<Self> {
        Self::new(&FaceVertexData::from_flat(coords, faces)?)
    }

    fn assemble(config: PolyConfig, topology: Topology) -> Self {
        let Topology {
            vertices,
            edges,
            mut faces,
            diagnostics,
        } = topology;

        let closed = mark_manifolds(&vertices, &edges, &mut faces);
        let manifolds = closed
            .into_iter()
            .map(|is_closed| ManifoldInfo {
                is_closed,
                is_negative: false,
                parent: None,
                depth: 0,
                aabb: Aabb3::empty(),
                volume: 0.0,
            })
            .collect();
        let aabb = bounds_of(&faces);
        let octree = build_index(&config, &vertices, &edges, &faces, &aabb);

        let mut poly = Self {
            config,
            vertices,
            edges,
            faces,
            manifolds,
            aabb,
            octree,
            diagnostics,
        };
        poly.update_manifolds();

        tracing::debug!(
            faces = poly.faces.len(),
            manifolds = poly.manifolds.len(),
            open = poly.manifolds.iter().filter(|m| !m.is_closed).count(),
            diagnostics = poly.diagnostics.len(),
            "polyhedron ready"
        );
        poly
    }

    /// Recompute face geometry, bounds, index and manifold data after
    /// vertex positions or loop orientation changed.
    pub(crate) fn refresh_geometry(&mut self) {
        let eps = self.config.epsilon;
        for face in &mut self.faces {
            face.update_geometry(&self.vertices, eps);
        }
        self.aabb = bounds_of(&self.faces);
        self.rebuild_index();
        self.update_manifolds();
    }

    fn update_manifolds(&mut self) {
        let measured = measure_manifolds(&self.vertices, &self.faces, self.manifolds.len());
        for (info, (volume, aabb)) in self.manifolds.iter_mut().zip(measured) {
            info.volume = volume;
            info.aabb = aabb;
            info.is_negative = info.is_closed && volume < 0.0;
        }
        self.calc_manifold_embedding();
    }

    /// Rebuild the spatial index from current positions.
    pub fn rebuild_index(&mut self) {
        self.octree = build_index(&self.config, &self.vertices, &self.edges, &self.faces, &self.aabb);
    }

    /// Active configuration.
    pub fn config(&self) -> &PolyConfig {
        &self.config
    }

    /// All vertices, including ones no face uses.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// All directed edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All faces.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Vertex record. Panics if `id` is out of range.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Edge record. Panics if `id` is out of range.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Face record. Panics if `id` is out of range.
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Bounds of every face.
    pub fn aabb(&self) -> &Aabb3 {
        &self.aabb
    }

    /// The spatial index.
    pub fn octree(&self) -> &Octree {
        &self.octree
    }

    /// Recoverable problems found during the last (re)build.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    // =========================================================================
    // Manifold queries
    // =========================================================================

    /// Number of manifolds.
    pub fn manifold_count(&self) -> usize {
        self.manifolds.len()
    }

    /// Per-manifold summaries indexed by manifold id.
    pub fn manifolds(&self) -> &[ManifoldInfo] {
        &self.manifolds
    }

    /// Summary of one manifold.
    pub fn manifold(&self, id: ManifoldId) -> PolyResult<&ManifoldInfo> {
        self.manifolds.get(id.index()).ok_or(PolyError::InvalidManifold {
            id: id.0,
            count: self.manifolds.len(),
        })
    }

    /// `true` if any manifold has a boundary edge.
    pub fn has_open_manifolds(&self) -> bool {
        self.manifolds.iter().any(|m| !m.is_closed)
    }

    /// Whether the manifold is closed.
    pub fn manifold_is_closed(&self, id: ManifoldId) -> PolyResult<bool> {
        Ok(self.manifold(id)?.is_closed)
    }

    /// Whether the manifold is a closed cavity (negative volume).
    pub fn manifold_is_negative(&self, id: ManifoldId) -> PolyResult<bool> {
        Ok(self.manifold(id)?.is_negative)
    }

    /// Innermost closed manifold enclosing `id`.
    pub fn manifold_parent(&self, id: ManifoldId) -> PolyResult<Option<ManifoldId>> {
        Ok(self.manifold(id)?.parent)
    }

    /// Number of closed manifolds enclosing `id`.
    pub fn manifold_depth(&self, id: ManifoldId) -> PolyResult<u32> {
        Ok(self.manifold(id)?.depth)
    }

    /// Bounds of the manifold's faces.
    pub fn manifold_aabb(&self, id: ManifoldId) -> PolyResult<Aabb3> {
        Ok(self.manifold(id)?.aabb)
    }

    /// Signed volume enclosed by the manifold.
    pub fn manifold_volume(&self, id: ManifoldId) -> PolyResult<f64> {
        Ok(self.manifold(id)?.volume)
    }

    /// Faces belonging to the manifold, in id order.
    pub fn manifold_faces(&self, id: ManifoldId) -> PolyResult<Vec<FaceId>> {
        self.manifold(id)?;
        Ok(self
            .faces
            .iter()
            .enumerate()
            .filter(|(_, f)| f.manifold == id)
            .map(|(i, _)| FaceId::from_index(i))
            .collect())
    }

    /// Manifolds of the faces around a vertex.
    pub fn vertex_manifolds(&self, v: VertexId) -> Vec<ManifoldId> {
        let mut out: Vec<ManifoldId> = self
            .vertex_faces(v)
            .into_iter()
            .map(|f| self.faces[f.index()].manifold)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Manifolds of the faces sharing an edge's vertex pair.
    pub fn edge_manifolds(&self, e: EdgeId) -> Vec<ManifoldId> {
        let mut out: Vec<ManifoldId> = self
            .edge_faces(e)
            .into_iter()
            .map(|f| self.faces[f.index()].manifold)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// `true` if some face of manifold `m` uses the vertex.
    pub fn vertex_on_manifold(&self, v: VertexId, m: ManifoldId) -> bool {
        self.vertices[v.index()]
            .edges
            .iter()
            .any(|e| self.faces[self.edges[e.index()].face.index()].manifold == m)
    }

    /// `true` if some face of manifold `m` uses the edge's vertex pair.
    pub fn edge_on_manifold(&self, e: EdgeId, m: ManifoldId) -> bool {
        coincident_edges(&self.vertices, &self.edges, e)
            .into_iter()
            .any(|other| self.faces[self.edges[other.index()].face.index()].manifold == m)
    }

    // =========================================================================
    // Adjacency
    // =========================================================================

    /// Faces sharing an edge with `face`, excluding `face` itself.
    pub fn connected_faces(&self, face: FaceId) -> Vec<FaceId> {
        let mut out: Vec<FaceId> = self.faces[face.index()]
            .edges
            .iter()
            .flat_map(|&e| coincident_edges(&self.vertices, &self.edges, e))
            .map(|e| self.edges[e.index()].face)
            .filter(|&f| f != face)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Faces using the edge's vertex pair in either direction.
    pub fn edge_faces(&self, e: EdgeId) -> Vec<FaceId> {
        let mut out: Vec<FaceId> = coincident_edges(&self.vertices, &self.edges, e)
            .into_iter()
            .map(|other| self.edges[other.index()].face)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Faces whose loop contains the vertex.
    pub fn vertex_faces(&self, v: VertexId) -> Vec<FaceId> {
        let mut out: Vec<FaceId> = self.vertices[v.index()]
            .edges
            .iter()
            .map(|e| self.edges[e.index()].face)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// The directed edge `v1 -> v2`, if a face has one.
    pub fn find_edge(&self, v1: VertexId, v2: VertexId) -> Option<EdgeId> {
        self.vertices
            .get(v1.index())?
            .edges
            .iter()
            .copied()
            .find(|e| {
                let edge = &self.edges[e.index()];
                edge.v1 == v1 && edge.v2 == v2
            })
    }

    /// Used vertex furthest along `dir`. Ties go to the lowest id.
    pub fn find_extremal_vertex(&self, dir: &Vec3) -> Option<VertexId> {
        let mut best: Option<(VertexId, f64)> = None;
        for (i, v) in self.vertices.iter().enumerate() {
            if !v.is_referenced() {
                continue;
            }
            let d = v.position.coords.dot(dir);
            if best.map_or(true, |(_, b)| d > b) {
                best = Some((VertexId::from_index(i), d));
            }
        }
        best.map(|(id, _)| id)
    }

    // =========================================================================
    // Locality queries
    // =========================================================================

    fn query_bounds(&self, query: &SpatialQuery) -> Option<Aabb3> {
        match query {
            SpatialQuery::Point(p) => Some(Aabb3::new(*p, *p)),
            SpatialQuery::Segment(s) => Some(s.aabb()),
            SpatialQuery::Aabb(b) => Some(*b),
            SpatialQuery::Face(f) => self.faces.get(f.index()).map(|f| f.aabb),
            SpatialQuery::Edge(e) => self.edges.get(e.index()).map(|e| self.edge_bounds(e)),
        }
    }

    pub(crate) fn edge_bounds(&self, e: &Edge) -> Aabb3 {
        let a = &self.vertices[e.v1.index()].position;
        let b = &self.vertices[e.v2.index()].position;
        Aabb3::from_points([a, b]).expanded(self.config.epsilon)
    }

    /// Faces whose padded bounds overlap the query's bounds.
    pub fn find_faces_near(&self, query: &SpatialQuery) -> Vec<FaceId> {
        self.query_bounds(query)
            .map(|b| self.octree.faces_in_aabb(&b))
            .unwrap_or_default()
    }

    /// Edges whose padded bounds overlap the query's bounds.
    pub fn find_edges_near(&self, query: &SpatialQuery) -> Vec<EdgeId> {
        self.query_bounds(query)
            .map(|b| self.octree.edges_in_aabb(&b))
            .unwrap_or_default()
    }

    /// Used vertices within tolerance of the query's bounds.
    pub fn find_vertices_near(&self, query: &SpatialQuery) -> Vec<VertexId> {
        self.query_bounds(query)
            .map(|b| self.octree.vertices_in_aabb(&b))
            .unwrap_or_default()
    }
}

fn bounds_of(faces: &[Face]) -> Aabb3 {
    let mut aabb = Aabb3::empty();
    for f in faces {
        aabb.include_aabb(&f.aabb);
    }
    aabb
}

fn build_index(
    config: &PolyConfig,
    vertices: &[Vertex],
    edges: &[Edge],
    faces: &[Face],
    aabb: &Aabb3,
) -> Octree {
    let eps = config.epsilon;
    let input = OctreeInput {
        face_bounds: faces.iter().map(|f| f.aabb).collect(),
        edge_bounds: edges
            .iter()
            .map(|e| {
                let a = &vertices[e.v1.index()].position;
                let b = &vertices[e.v2.index()].position;
                Aabb3::from_points([a, b]).expanded(eps)
            })
            .collect(),
        vertex_points: vertices
            .iter()
            .map(|v| (v.is_referenced() && is_finite_point(&v.position)).then_some(v.position))
            .collect(),
    };
    let region = aabb.scaled(config.octree.slack_factor, eps);
    Octree::build(region, input, &config.octree, eps)
}
