//! Arena ids and the vertex/edge records.
//!
//! Records never own each other. Every cross reference is a `u32` id into
//! one of the arenas held by [`Polyhedron`](crate::Polyhedron).

use polycsg_kernel_math::Point3;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Position of the record in its arena.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline]
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Index of a vertex.
    VertexId
);
arena_id!(
    /// Index of a directed edge.
    EdgeId
);
arena_id!(
    /// Index of a face.
    FaceId
);
arena_id!(
    /// Index of a manifold (a connected face set).
    ManifoldId
);

/// A point shared by face loops.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in space.
    pub position: Point3,
    /// Every edge starting or ending here.
    pub edges: Vec<EdgeId>,
}

impl Vertex {
    /// A vertex with no incident edges.
    pub fn new(position: Point3) -> Self {
        Self {
            position,
            edges: Vec::new(),
        }
    }

    /// `true` if some face loop uses this vertex.
    pub fn is_referenced(&self) -> bool {
        !self.edges.is_empty()
    }
}

/// A directed edge `v1 -> v2` owned by exactly one face.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Start vertex.
    pub v1: VertexId,
    /// End vertex.
    pub v2: VertexId,
    /// The face whose loop contains this edge.
    pub face: FaceId,
    /// The edge of the adjacent face running `v2 -> v1`, if any.
    pub radial: Option<EdgeId>,
    /// Number of faces using the undirected vertex pair.
    pub valence: u32,
}

impl Edge {
    /// Undirected key of the vertex pair.
    #[inline]
    pub fn key(&self) -> (VertexId, VertexId) {
        undirected(self.v1, self.v2)
    }

    /// `true` if the edge joins `a` and `b` in either direction.
    pub fn joins(&self, a: VertexId, b: VertexId) -> bool {
        self.key() == undirected(a, b)
    }

    /// The endpoint opposite `v`.
    pub fn other(&self, v: VertexId) -> VertexId {
        if self.v1 == v {
            self.v2
        } else {
            self.v1
        }
    }

    /// `true` if exactly two faces share this edge with opposite directions.
    pub fn is_manifold(&self) -> bool {
        self.valence == 2 && self.radial.is_some()
    }
}

/// Order a vertex pair so both directions map to one key.
#[inline]
pub(crate) fn undirected(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Every edge, including `edge` itself, over the same undirected vertex pair.
pub(crate) fn coincident_edges(vertices: &[Vertex], edges: &[Edge], edge: EdgeId) -> Vec<EdgeId> {
    let e = &edges[edge.index()];
    let key = e.key();
    vertices[e.v1.index()]
        .edges
        .iter()
        .copied()
        .filter(|&other| edges[other.index()].key() == key)
        .collect()
}
