//! Recoverable per-face problems found while building a polyhedron.
//!
//! None of these abort construction. Each one is stored on the polyhedron
//! and also emitted as a `tracing` warning.

use std::fmt;

/// The class of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Fewer than three distinct indices, an index out of range, or a
    /// non-planar loop. The face is skipped.
    MalformedFace,
    /// Two faces traverse a shared edge in the same direction.
    OrientationInconsistency,
    /// More than two faces share an undirected edge.
    NonManifoldEdge,
    /// Zero area, a vanishing edge or non-finite coordinates. The face is
    /// skipped.
    NumericalDegeneracy,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MalformedFace => "malformed face",
            DiagnosticKind::OrientationInconsistency => "orientation inconsistency",
            DiagnosticKind::NonManifoldEdge => "non-manifold edge",
            DiagnosticKind::NumericalDegeneracy => "numerical degeneracy",
        };
        f.write_str(name)
    }
}

/// A recoverable problem tied to an input face.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Index of the face in the construction input, if one is involved.
    pub face: Option<usize>,
    /// Human readable detail.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.face {
            Some(face) => write!(f, "{} (face {}): {}", self.kind, face, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// Record a diagnostic and emit it as a warning.
pub(crate) fn report(
    sink: &mut Vec<Diagnostic>,
    kind: DiagnosticKind,
    face: Option<usize>,
    message: impl Into<String>,
) {
    let diagnostic = Diagnostic {
        kind,
        face,
        message: message.into(),
    };
    tracing::warn!(kind = %diagnostic.kind, face = ?diagnostic.face, "{}", diagnostic.message);
    sink.push(diagnostic);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_collects() {
        let mut sink = Vec::new();
        report(&mut sink, DiagnosticKind::NonManifoldEdge, Some(3), "edge 1-2 has 3 faces");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].face, Some(3));
        assert_eq!(
            sink[0].to_string(),
            "non-manifold edge (face 3): edge 1-2 has 3 faces"
        );
    }
}
