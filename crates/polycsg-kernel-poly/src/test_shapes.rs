//! Small meshes shared by the unit tests.

use polycsg_kernel_math::Point3;

use crate::input::FaceVertexData;

/// Axis-aligned cube with outward winding, `min` corner and edge `size`.
pub fn cube(min: Point3, size: f64) -> FaceVertexData {
    let corner = |x: f64, y: f64, z: f64| Point3::new(min.x + x * size, min.y + y * size, min.z + z * size);
    let vertices = vec![
        corner(0.0, 0.0, 0.0),
        corner(1.0, 0.0, 0.0),
        corner(1.0, 1.0, 0.0),
        corner(0.0, 1.0, 0.0),
        corner(0.0, 0.0, 1.0),
        corner(1.0, 0.0, 1.0),
        corner(1.0, 1.0, 1.0),
        corner(0.0, 1.0, 1.0),
    ];
    let faces = vec![
        vec![0, 3, 2, 1],
        vec![4, 5, 6, 7],
        vec![0, 1, 5, 4],
        vec![2, 3, 7, 6],
        vec![0, 4, 7, 3],
        vec![1, 2, 6, 5],
    ];
    FaceVertexData::new(vertices, faces)
}

/// The same mesh with every loop reversed.
pub fn inverted(mut data: FaceVertexData) -> FaceVertexData {
    for f in &mut data.faces {
        f.reverse();
    }
    data
}

/// A unit cube missing its top face.
pub fn open_box() -> FaceVertexData {
    let mut data = cube(Point3::origin(), 1.0);
    data.faces.remove(1);
    data
}

/// Corner tetrahedron at the origin with outward winding.
pub fn tetrahedron() -> FaceVertexData {
    FaceVertexData::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ],
        vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
    )
}

/// A single triangle with no neighbours.
pub fn triangle() -> FaceVertexData {
    FaceVertexData::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![vec![0, 1, 2]],
    )
}

/// Concatenate meshes, offsetting indices.
pub fn merge(parts: &[FaceVertexData]) -> FaceVertexData {
    let mut out = FaceVertexData::default();
    for part in parts {
        let base = out.vertices.len();
        out.vertices.extend_from_slice(&part.vertices);
        out.faces
            .extend(part.faces.iter().map(|f| f.iter().map(|i| i + base).collect()));
    }
    out
}

/// Outer 4-unit cube with an inward-wound 2-unit cavity at its centre.
pub fn hollow_cube() -> FaceVertexData {
    merge(&[
        cube(Point3::origin(), 4.0),
        inverted(cube(Point3::new(1.0, 1.0, 1.0), 2.0)),
    ])
}

/// A grid of `n` x `n` unit cubes spaced two units apart.
pub fn cube_grid(n: usize) -> FaceVertexData {
    let parts: Vec<FaceVertexData> = (0..n * n)
        .map(|i| cube(Point3::new((i % n) as f64 * 2.0, (i / n) as f64 * 2.0, 0.0), 1.0))
        .collect();
    merge(&parts)
}
