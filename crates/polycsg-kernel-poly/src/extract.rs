//! Copying faces out of a polyhedron.

use crate::error::{PolyError, PolyResult};
use crate::face::Face;
use crate::input::FaceVertexData;
use crate::polyhedron::Polyhedron;
use crate::topology::ManifoldId;

impl Polyhedron {
    /// Face loops over the vertices they use, re-indexed in first-use order.
    pub fn collect_face_vertices(&self) -> FaceVertexData {
        self.collect_faces(|_| true)
    }

    /// An independent polyhedron holding one manifold's faces.
    pub fn manifold_copy(&self, id: ManifoldId) -> PolyResult<Polyhedron> {
        self.manifold(id)?;
        let data = self.collect_faces(|f| f.manifold == id);
        Polyhedron::with_config(&data, self.config.clone())
    }

    /// An independent polyhedron holding the faces of every manifold whose
    /// mask entry is set.
    pub fn manifold_subset(&self, mask: &[bool]) -> PolyResult<Polyhedron> {
        if mask.len() != self.manifolds.len() {
            return Err(PolyError::MaskLength {
                expected: self.manifolds.len(),
                actual: mask.len(),
            });
        }
        let data = self.collect_faces(|f| mask[f.manifold.index()]);
        Polyhedron::with_config(&data, self.config.clone())
    }

    fn collect_faces(&self, keep: impl Fn(&Face) -> bool) -> FaceVertexData {
        let data = FaceVertexData {
            vertices: self.vertices.iter().map(|v| v.position).collect(),
            faces: self
                .faces
                .iter()
                .filter(|f| keep(f))
                .map(|f| f.vertices.iter().map(|v| v.index()).collect())
                .collect(),
        };
        data.compacted()
    }
}
