//! Face/vertex arrays going into and coming out of a polyhedron.

use polycsg_kernel_math::Point3;

use crate::error::{PolyError, PolyResult};

/// Shared vertex positions plus face loops of indices into them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceVertexData {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Face loops, each an ordered list of vertex indices.
    pub faces: Vec<Vec<usize>>,
}

impl FaceVertexData {
    /// Bundle vertices and faces.
    pub fn new(vertices: Vec<Point3>, faces: Vec<Vec<usize>>) -> Self {
        Self { vertices, faces }
    }

    /// Decode the flat encoding: `coords` holds xyz triples and `faces`
    /// holds `[n, i0, .., i(n-1), n, ..]` runs.
    pub fn from_flat(coords: &[f64], faces: &[usize]) -> PolyResult<Self> {
        if coords.len() % 3 != 0 {
            return Err(PolyError::MalformedEncoding(format!(
                "coordinate count {} is not a multiple of 3",
                coords.len()
            )));
        }
        let vertices = coords
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
            .collect();

        let mut loops = Vec::new();
        let mut i = 0;
        while i < faces.len() {
            let n = faces[i];
            let start = i + 1;
            let end = start + n;
            if end > faces.len() {
                return Err(PolyError::MalformedEncoding(format!(
                    "face at offset {i} declares {n} indices but only {} remain",
                    faces.len() - start
                )));
            }
            loops.push(faces[start..end].to_vec());
            i = end;
        }
        Ok(Self {
            vertices,
            faces: loops,
        })
    }

    /// Drop vertices no face uses, re-indexing the rest in first-use order.
    ///
    /// Panics if a face index is out of range.
    pub fn compacted(&self) -> FaceVertexData {
        let mut remap: Vec<Option<usize>> = vec![None; self.vertices.len()];
        let mut out = FaceVertexData::default();
        for f in &self.faces {
            let face = f
                .iter()
                .map(|&i| {
                    *remap[i].get_or_insert_with(|| {
                        out.vertices.push(self.vertices[i]);
                        out.vertices.len() - 1
                    })
                })
                .collect();
            out.faces.push(face);
        }
        out
    }

    /// Encode into flat coordinate and face arrays.
    pub fn to_flat(&self) -> (Vec<f64>, Vec<usize>) {
        let coords = self
            .vertices
            .iter()
            .flat_map(|p| [p.x, p.y, p.z])
            .collect();
        let mut faces = Vec::with_capacity(self.faces.iter().map(|f| f.len() + 1).sum());
        for f in &self.faces {
            faces.push(f.len());
            faces.extend_from_slice(f);
        }
        (coords, faces)
    }
}
