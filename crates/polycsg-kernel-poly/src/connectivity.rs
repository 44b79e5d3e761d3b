//! Builds vertex/edge/face arenas and radial edge links from raw loops.

use std::collections::HashMap;

use polycsg_kernel_math::{is_finite_point, Aabb3, Point3};

use crate::config::PolyConfig;
use crate::diagnostic::{report, Diagnostic, DiagnosticKind};
use crate::error::{PolyError, PolyResult};
use crate::face::{newell_normal, Face, Plane};
use crate::input::FaceVertexData;
use crate::topology::{undirected, Edge, EdgeId, FaceId, Vertex, VertexId};

/// Output of connectivity building.
#[derive(Debug)]
pub(crate) struct Topology {
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
    pub faces: Vec<Face>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Validate input loops and link their edges.
///
/// Faces that cannot be used are skipped with a diagnostic. Only input with
/// no usable face at all is an error.
pub(crate) fn build(data: &FaceVertexData, config: &PolyConfig) -> PolyResult<Topology> {
    let eps = config.epsilon;
    let mut diagnostics = Vec::new();
    let mut vertices: Vec<Vertex> = data.vertices.iter().map(|&p| Vertex::new(p)).collect();

    // Accepted loops and the input index each one came from.
    let mut loops: Vec<(usize, Vec<VertexId>)> = Vec::with_capacity(data.faces.len());
    for (input_index, raw) in data.faces.iter().enumerate() {
        if let Some(face_loop) = accept_loop(input_index, raw, &data.vertices, config, &mut diagnostics) {
            loops.push((input_index, face_loop));
        }
    }

    if loops.is_empty() {
        return Err(PolyError::EmptyInput);
    }

    let mut edges: Vec<Edge> = Vec::new();
    let mut faces: Vec<Face> = Vec::with_capacity(loops.len());
    let mut sources: Vec<usize> = Vec::with_capacity(loops.len());
    for (input_index, face_loop) in loops {
        let face_id = FaceId::from_index(faces.len());
        let n = face_loop.len();
        let mut face_edges = Vec::with_capacity(n);
        for i in 0..n {
            let id = EdgeId::from_index(edges.len());
            let (v1, v2) = (face_loop[i], face_loop[(i + 1) % n]);
            edges.push(Edge {
                v1,
                v2,
                face: face_id,
                radial: None,
                valence: 0,
            });
            vertices[v1.index()].edges.push(id);
            vertices[v2.index()].edges.push(id);
            face_edges.push(id);
        }
        let mut face = Face::new(face_loop, face_edges);
        face.update_geometry(&vertices, eps);
        faces.push(face);
        sources.push(input_index);
    }

    link_radial_edges(&mut edges, &sources, &mut diagnostics);

    tracing::debug!(
        vertices = vertices.len(),
        edges = edges.len(),
        faces = faces.len(),
        skipped = data.faces.len() - faces.len(),
        "connectivity built"
    );

    Ok(Topology {
        vertices,
        edges,
        faces,
        diagnostics,
    })
}

/// Vet a loop's indices and geometry. Loops that repeat an index
/// consecutively, including across the wrap, are rejected.
fn accept_loop(
    input_index: usize,
    raw: &[usize],
    positions: &[Point3],
    config: &PolyConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Vec<VertexId>> {
    let face = Some(input_index);

    if let Some(&bad) = raw.iter().find(|&&i| i >= positions.len()) {
        report(
            diagnostics,
            DiagnosticKind::MalformedFace,
            face,
            format!("vertex index {bad} out of range ({} vertices)", positions.len()),
        );
        return None;
    }

    let collapsed = collapse_repeats(raw);
    let mut distinct = collapsed.clone();
    distinct.sort_unstable();
    distinct.dedup();
    if distinct.len() < 3 {
        report(
            diagnostics,
            DiagnosticKind::MalformedFace,
            face,
            format!("loop has {} distinct vertices", distinct.len()),
        );
        return None;
    }
    if collapsed.len() != raw.len() {
        report(
            diagnostics,
            DiagnosticKind::MalformedFace,
            face,
            format!("loop repeats {} consecutive vertex indices", raw.len() - collapsed.len()),
        );
        return None;
    }

    let points: Vec<Point3> = collapsed.iter().map(|&i| positions[i]).collect();
    if let Some(i) = points.iter().position(|p| !is_finite_point(p)) {
        report(
            diagnostics,
            DiagnosticKind::NumericalDegeneracy,
            face,
            format!("vertex {} has a non-finite coordinate", collapsed[i]),
        );
        return None;
    }

    let eps = config.epsilon;
    let n = points.len();
    for i in 0..n {
        let len = (points[(i + 1) % n] - points[i]).norm();
        if len < eps {
            report(
                diagnostics,
                DiagnosticKind::NumericalDegeneracy,
                face,
                format!(
                    "edge {}-{} is shorter than tolerance",
                    collapsed[i],
                    collapsed[(i + 1) % n]
                ),
            );
            return None;
        }
    }

    let area = newell_normal(&points).norm() * 0.5;
    if area < eps * eps {
        report(diagnostics, DiagnosticKind::NumericalDegeneracy, face, "zero area");
        return None;
    }

    let plane = Plane::from_loop(&points);
    let size = Aabb3::from_points(&points).diagonal();
    let allowed = (config.planarity_tolerance * size).max(eps);
    let deviation = points
        .iter()
        .map(|p| plane.distance(p).abs())
        .fold(0.0, f64::max);
    if deviation > allowed {
        report(
            diagnostics,
            DiagnosticKind::MalformedFace,
            face,
            format!("non-planar loop (deviation {deviation:.3e} > {allowed:.3e})"),
        );
        return None;
    }

    Some(collapsed.into_iter().map(VertexId::from_index).collect())
}

/// Drop indices equal to their predecessor, including across the wrap.
pub(crate) fn collapse_repeats(raw: &[usize]) -> Vec<usize> {
    let mut out: Vec<usize> = Vec::with_capacity(raw.len());
    for &i in raw {
        if out.last() != Some(&i) {
            out.push(i);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Group edges by undirected vertex pair, set valences and pair opposite
/// directions as radial neighbours.
fn link_radial_edges(edges: &mut [Edge], sources: &[usize], diagnostics: &mut Vec<Diagnostic>) {
    let mut slot: HashMap<(VertexId, VertexId), usize> = HashMap::new();
    let mut groups: Vec<Vec<EdgeId>> = Vec::new();
    for (i, e) in edges.iter().enumerate() {
        let key = undirected(e.v1, e.v2);
        let g = *slot.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(EdgeId::from_index(i));
    }

    for group in &groups {
        let valence = group.len() as u32;
        for &e in group {
            edges[e.index()].valence = valence;
        }
        match group.as_slice() {
            [_] => {}
            &[a, b] => {
                let (ea, eb) = (&edges[a.index()], &edges[b.index()]);
                if ea.v1 == eb.v2 && ea.v2 == eb.v1 {
                    edges[a.index()].radial = Some(b);
                    edges[b.index()].radial = Some(a);
                } else {
                    let (v1, v2, face) = (ea.v1, ea.v2, sources[eb.face.index()]);
                    report(
                        diagnostics,
                        DiagnosticKind::OrientationInconsistency,
                        Some(face),
                        format!(
                            "edge {v1}-{v2} traversed in the same direction by faces {} and {face}",
                            sources[ea.face.index()]
                        ),
                    );
                }
            }
            many => {
                let e = &edges[many[0].index()];
                let (v1, v2) = (e.v1, e.v2);
                let face = sources[edges[many[2].index()].face.index()];
                report(
                    diagnostics,
                    DiagnosticKind::NonManifoldEdge,
                    Some(face),
                    format!("edge {v1}-{v2} is shared by {} faces", many.len()),
                );
            }
        }
    }
}
