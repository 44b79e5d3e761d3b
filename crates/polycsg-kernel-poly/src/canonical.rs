//! Vertex merging and clean-up.

use polycsg_kernel_math::Aabb3;

use crate::connectivity::collapse_repeats;
use crate::error::PolyResult;
use crate::input::FaceVertexData;
use crate::polyhedron::Polyhedron;

/// What [`Polyhedron::canonicalize`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CanonicalizeReport {
    /// Vertices folded into a coincident neighbour.
    pub merged_vertices: usize,
    /// Vertices dropped because no face used them.
    pub removed_vertices: usize,
    /// Faces dropped because merging left them degenerate.
    pub removed_faces: usize,
}

impl Polyhedron {
    /// Merge vertices closer than the linear tolerance and rebuild.
    ///
    /// Each used vertex in id order absorbs the unmerged vertices within
    /// tolerance of it. Loops that collapse below three distinct vertices
    /// are dropped, as are vertices no face uses. On error the polyhedron is
    /// left unchanged.
    pub fn canonicalize(&mut self) -> PolyResult<CanonicalizeReport> {
        let eps = self.config.epsilon;
        let count = self.vertices.len();
        let mut target: Vec<Option<usize>> = vec![None; count];
        let mut merged_vertices = 0;

        for i in 0..count {
            let v = &self.vertices[i];
            if target[i].is_some() || !v.is_referenced() {
                continue;
            }
            target[i] = Some(i);
            let p = v.position;
            let probe = Aabb3::new(p, p).expanded(eps);
            for other in self.octree.vertices_in_aabb(&probe) {
                let j = other.index();
                if target[j].is_none() && (self.vertices[j].position - p).norm() <= eps {
                    target[j] = Some(i);
                    merged_vertices += 1;
                }
            }
        }

        let mut data = FaceVertexData {
            vertices: self.vertices.iter().map(|v| v.position).collect(),
            faces: Vec::with_capacity(self.faces.len()),
        };
        for face in &self.faces {
            let mapped: Vec<usize> = face
                .vertices
                .iter()
                .map(|v| target[v.index()].unwrap_or(v.index()))
                .collect();
            let collapsed = collapse_repeats(&mapped);
            let mut distinct = collapsed.clone();
            distinct.sort_unstable();
            distinct.dedup();
            if distinct.len() >= 3 {
                data.faces.push(collapsed);
            }
        }

        let data = data.compacted();
        let rebuilt = Polyhedron::with_config(&data, self.config.clone())?;
        let report = CanonicalizeReport {
            merged_vertices,
            removed_vertices: count - data.vertices.len() - merged_vertices,
            removed_faces: self.faces.len() - rebuilt.faces.len(),
        };

        tracing::debug!(
            merged = report.merged_vertices,
            removed_vertices = report.removed_vertices,
            removed_faces = report.removed_faces,
            "canonicalized"
        );
        *self = rebuilt;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::test_shapes::{cube, merge};
    use crate::topology::ManifoldId;
    use polycsg_kernel_math::Point3;

    /// A cube whose faces each carry their own copies of the corners.
    fn exploded_cube() -> FaceVertexData {
        let base = cube(Point3::origin(), 1.0);
        let mut out = FaceVertexData::default();
        for f in &base.faces {
            let start = out.vertices.len();
            for (k, &i) in f.iter().enumerate() {
                let jitter = 1e-8 * k as f64;
                let p = base.vertices[i];
                out.vertices.push(Point3::new(p.x + jitter, p.y, p.z));
            }
            out.faces.push((start..start + f.len()).collect());
        }
        out
    }

    #[test]
    fn test_merges_split_corners() {
        let mut poly = Polyhedron::new(&exploded_cube()).unwrap();
        assert_eq!(poly.manifold_count(), 6);
        assert!(poly.has_open_manifolds());

        let report = poly.canonicalize().unwrap();
        assert_eq!(report.merged_vertices, 16);
        assert_eq!(report.removed_faces, 0);
        assert_eq!(report.removed_vertices, 0);
        assert_eq!(poly.vertices().len(), 8);
        assert_eq!(poly.manifold_count(), 1);
        assert!(poly.manifold_is_closed(ManifoldId(0)).unwrap());
        assert!(poly.contains_vertex(&Point3::new(0.5, 0.5, 0.5)).is_inside());
    }

    #[test]
    fn test_collapsed_face_removed() {
        // A sliver triangle whose apex sits within tolerance of a corner.
        let mut data = cube(Point3::origin(), 1.0);
        data.vertices.push(Point3::new(1.0, 0.0, 0.0));
        data.vertices.push(Point3::new(5.0, 5.0, 5.0));
        data.faces.push(vec![0, 1, 8]);
        let mut poly = Polyhedron::new(&data).unwrap();
        // Vertex 8 duplicates vertex 1, so the triangle is degenerate at build.
        assert!(poly
            .diagnostics()
            .iter()
            .any(|d| d.kind == DiagnosticKind::NumericalDegeneracy));
        assert_eq!(poly.faces().len(), 6);

        let report = poly.canonicalize().unwrap();
        assert_eq!(report.removed_vertices, 2);
        assert_eq!(poly.vertices().len(), 8);
        assert!(poly.diagnostics().is_empty());
    }

    #[test]
    fn test_separate_cubes_untouched() {
        let data = merge(&[cube(Point3::origin(), 1.0), cube(Point3::new(2.0, 0.0, 0.0), 1.0)]);
        let mut poly = Polyhedron::new(&data).unwrap();
        let report = poly.canonicalize().unwrap();
        assert_eq!(report, CanonicalizeReport::default());
        assert_eq!(poly.manifold_count(), 2);
    }

    #[test]
    fn test_touching_cubes_merge_shared_corners() {
        let data = merge(&[cube(Point3::origin(), 1.0), cube(Point3::new(1.0, 0.0, 0.0), 1.0)]);
        let mut poly = Polyhedron::new(&data).unwrap();
        let report = poly.canonicalize().unwrap();
        assert_eq!(report.merged_vertices, 4);
        assert_eq!(poly.vertices().len(), 12);
    }
}
