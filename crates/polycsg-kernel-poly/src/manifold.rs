//! Manifold marking and signed volumes.
//!
//! A manifold is a set of faces connected through shared edges of valence
//! at most two. Nesting of closed manifolds is computed by the polyhedron
//! once its spatial index exists, see [`Polyhedron`](crate::Polyhedron).

use std::collections::VecDeque;

use polycsg_kernel_math::Aabb3;

use crate::classify::PointClass;
use crate::config::CrossingRule;
use crate::face::Face;
use crate::polyhedron::Polyhedron;
use crate::topology::{coincident_edges, Edge, FaceId, ManifoldId, Vertex};

/// Probe offsets tried, in multiples of the linear tolerance, when a
/// representative point lands on another manifold's boundary.
const NUDGE_STEPS: [f64; 8] = [2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0, 256.0];

/// Per-manifold summary.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifoldInfo {
    /// Every edge has exactly one radial partner.
    pub is_closed: bool,
    /// Closed with a negative signed volume, i.e. a cavity.
    pub is_negative: bool,
    /// Innermost closed manifold enclosing this one.
    pub parent: Option<ManifoldId>,
    /// Number of closed manifolds enclosing this one.
    pub depth: u32,
    /// Union of the member faces' bounds.
    pub aabb: Aabb3,
    /// Signed enclosed volume. Meaningful only when closed.
    pub volume: f64,
}

/// Flood fill faces into manifolds and assign `Face::manifold`.
///
/// Returns the closed flag of each manifold. Manifold ids follow the
/// lowest face id they contain.
pub(crate) fn mark_manifolds(vertices: &[Vertex], edges: &[Edge], faces: &mut [Face]) -> Vec<bool> {
    let mut assigned: Vec<Option<ManifoldId>> = vec![None; faces.len()];
    let mut closed = Vec::new();
    let mut queue = VecDeque::new();

    for seed in 0..faces.len() {
        if assigned[seed].is_some() {
            continue;
        }
        let id = ManifoldId::from_index(closed.len());
        let mut is_closed = true;
        assigned[seed] = Some(id);
        queue.push_back(FaceId::from_index(seed));

        while let Some(face) = queue.pop_front() {
            for &e in &faces[face.index()].edges {
                let edge = &edges[e.index()];
                if !edge.is_manifold() {
                    is_closed = false;
                }
                if edge.valence > 2 {
                    continue;
                }
                for other in coincident_edges(vertices, edges, e) {
                    let neighbour = edges[other.index()].face;
                    if assigned[neighbour.index()].is_none() {
                        assigned[neighbour.index()] = Some(id);
                        queue.push_back(neighbour);
                    }
                }
            }
        }
        closed.push(is_closed);
    }

    for (face, id) in faces.iter_mut().zip(assigned) {
        face.manifold = id.unwrap_or(ManifoldId(0));
    }
    closed
}

/// Signed volume and bounds of every manifold.
pub(crate) fn measure_manifolds(
    vertices: &[Vertex],
    faces: &[Face],
    count: usize,
) -> Vec<(f64, Aabb3)> {
    let mut out = vec![(0.0, Aabb3::empty()); count];
    for face in faces {
        let slot = &mut out[face.manifold.index()];
        slot.0 += face.signed_volume(vertices);
        slot.1.include_aabb(&face.aabb);
    }
    out
}

impl Polyhedron {
    /// Work out which closed manifolds enclose which.
    ///
    /// Each closed manifold B is probed at face centroids and classified
    /// against every other closed manifold A alone. The parent of B is the
    /// deepest A that contains it.
    pub(crate) fn calc_manifold_embedding(&mut self) {
        let count = self.manifolds.len();
        let mut members: Vec<Vec<FaceId>> = vec![Vec::new(); count];
        for (i, face) in self.faces.iter().enumerate() {
            members[face.manifold.index()].push(FaceId::from_index(i));
        }

        let closed: Vec<ManifoldId> = (0..count)
            .filter(|&m| self.manifolds[m].is_closed)
            .map(ManifoldId::from_index)
            .collect();

        let mut enclosing: Vec<Vec<ManifoldId>> = vec![Vec::new(); count];
        for &b in &closed {
            for &a in &closed {
                if a != b
                    && self.manifolds[a.index()]
                        .aabb
                        .overlaps(&self.manifolds[b.index()].aabb)
                    && self.encloses_by_size(a, b)
                    && self.probe_inside(&members[b.index()], a)
                {
                    enclosing[b.index()].push(a);
                }
            }
        }

        for (info, outer) in self.manifolds.iter_mut().zip(&enclosing) {
            info.depth = outer.len() as u32;
        }
        for (m, outer) in enclosing.iter().enumerate() {
            let parent = outer
                .iter()
                .copied()
                .max_by_key(|a| self.manifolds[a.index()].depth);
            self.manifolds[m].parent = parent;
        }

        tracing::debug!(
            closed = closed.len(),
            nested = self.manifolds.iter().filter(|m| m.parent.is_some()).count(),
            "manifold embedding computed"
        );
    }

    /// Whether `a` may enclose `b` at all: it must be strictly larger, with
    /// the lower id winning between shells of equal size. This is a strict
    /// order, so coincident shells never nest in each other.
    fn encloses_by_size(&self, a: ManifoldId, b: ManifoldId) -> bool {
        let va = self.manifolds[a.index()].volume.abs();
        let vb = self.manifolds[b.index()].volume.abs();
        let tol = self.config.epsilon * va.max(vb).max(1.0);
        if (va - vb).abs() <= tol {
            a < b
        } else {
            va > vb
        }
    }

    /// Classify a representative point of `faces` against manifold `a`.
    ///
    /// Face centroids are tried in order. If every centroid lies on `a`'s
    /// boundary the first one is stepped behind its face by growing
    /// multiples of the tolerance.
    fn probe_inside(&self, faces: &[FaceId], a: ManifoldId) -> bool {
        let eps = self.config.epsilon;
        for &f in faces {
            let centroid = self.faces[f.index()].centroid(&self.vertices);
            match self.manifold_containment(&centroid, a, CrossingRule::EvenOdd).class {
                PointClass::Inside => return true,
                PointClass::Outside => return false,
                PointClass::OnBoundary => {}
            }
        }

        let Some(&first) = faces.first() else {
            return false;
        };
        let face = &self.faces[first.index()];
        let base = face.centroid(&self.vertices);
        let back = -face.plane.normal;
        for step in NUDGE_STEPS {
            let probe = base + back * (step * eps);
            match self.manifold_containment(&probe, a, CrossingRule::EvenOdd).class {
                PointClass::Inside => return true,
                PointClass::Outside => return false,
                PointClass::OnBoundary => {}
            }
        }
        tracing::debug!(?base, manifold = a.0, "embedding probe stayed on boundary");
        false
    }
}
