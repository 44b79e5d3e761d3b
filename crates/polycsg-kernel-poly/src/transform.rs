//! Geometry mutations: affine transforms and orientation flips.

use polycsg_kernel_math::{is_finite_point, Point3, Transform};

use crate::error::{PolyError, PolyResult};
use crate::manifold::measure_manifolds;
use crate::polyhedron::Polyhedron;
use crate::topology::ManifoldId;

impl Polyhedron {
    /// Apply an affine transform to every vertex.
    ///
    /// A mirroring transform also reverses every loop, so closed solids
    /// keep outward-facing normals.
    pub fn transform(&mut self, t: &Transform) -> PolyResult<()> {
        let positions = self.mapped_positions(|p| t.apply_point(p))?;
        self.set_positions(positions);
        if t.is_mirroring() {
            self.flip_faces(|_| true);
        }
        self.refresh_geometry();
        Ok(())
    }

    /// Map every vertex through `f`.
    ///
    /// Fails with [`PolyError::InvalidCoordinate`] and leaves the polyhedron
    /// untouched if a used vertex maps to a non-finite point. A closed
    /// manifold whose signed volume changes sign under `f` has its loops
    /// reversed, matching [`transform`](Self::transform) for reflections.
    pub fn transform_with<F>(&mut self, f: F) -> PolyResult<()>
    where
        F: FnMut(&Point3) -> Point3,
    {
        let positions = self.mapped_positions(f)?;
        self.set_positions(positions);

        let measured = measure_manifolds(&self.vertices, &self.faces, self.manifolds.len());
        let reversed: Vec<bool> = self
            .manifolds
            .iter()
            .zip(&measured)
            .map(|(info, (volume, _))| info.is_closed && info.volume * volume < 0.0)
            .collect();
        if reversed.iter().any(|&r| r) {
            self.flip_faces(|m| reversed[m.index()]);
        }
        self.refresh_geometry();
        Ok(())
    }

    fn mapped_positions<F>(&self, mut f: F) -> PolyResult<Vec<Point3>>
    where
        F: FnMut(&Point3) -> Point3,
    {
        let mut out = Vec::with_capacity(self.vertices.len());
        for (i, v) in self.vertices.iter().enumerate() {
            let p = f(&v.position);
            if v.is_referenced() && !is_finite_point(&p) {
                return Err(PolyError::InvalidCoordinate { vertex: i });
            }
            out.push(p);
        }
        Ok(out)
    }

    fn set_positions(&mut self, positions: Vec<Point3>) {
        for (v, p) in self.vertices.iter_mut().zip(positions) {
            v.position = p;
        }
    }

    /// Reverse the orientation of every face.
    pub fn invert_all(&mut self) {
        self.flip_faces(|_| true);
        self.refresh_geometry();
    }

    /// Reverse the orientation of one manifold.
    pub fn invert_manifold(&mut self, id: ManifoldId) -> PolyResult<()> {
        self.manifold(id)?;
        self.flip_faces(|m| m == id);
        self.refresh_geometry();
        Ok(())
    }

    /// Reverse the orientation of every manifold whose mask entry is set.
    pub fn invert_manifolds(&mut self, mask: &[bool]) -> PolyResult<()> {
        if mask.len() != self.manifolds.len() {
            return Err(PolyError::MaskLength {
                expected: self.manifolds.len(),
                actual: mask.len(),
            });
        }
        self.flip_faces(|m| mask[m.index()]);
        self.refresh_geometry();
        Ok(())
    }

    /// Reverse loops and edge directions of faces in selected manifolds.
    ///
    /// Radial partners always share a manifold, so pairs stay opposed.
    fn flip_faces(&mut self, selected: impl Fn(ManifoldId) -> bool) {
        for face in self.faces.iter_mut().filter(|f| selected(f.manifold)) {
            face.reverse_loop();
            for e in &face.edges {
                let edge = &mut self.edges[e.index()];
                std::mem::swap(&mut edge.v1, &mut edge.v2);
            }
        }
    }
}
