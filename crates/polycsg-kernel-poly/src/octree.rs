//! Octree over face, edge and vertex bounds.
//!
//! Items are stored in every leaf their padded bounds overlap, so a query
//! visiting all leaves that touch a region sees every item that does.
//! Queries de-duplicate with a call-local mask and return ids sorted.

use polycsg_kernel_math::{Aabb3, LineSegment, Point3};

use crate::config::OctreeConfig;
use crate::topology::{EdgeId, FaceId, VertexId};

/// Item ids held by a leaf.
#[derive(Debug, Clone, Default)]
pub struct Bucket {
    /// Faces whose bounds overlap the leaf.
    pub faces: Vec<FaceId>,
    /// Edges whose bounds overlap the leaf.
    pub edges: Vec<EdgeId>,
    /// Vertices within tolerance of the leaf.
    pub vertices: Vec<VertexId>,
}

impl Bucket {
    fn exceeds(&self, config: &OctreeConfig) -> bool {
        self.faces.len() > config.face_split_threshold
            || self.edges.len() > config.edge_split_threshold
            || self.vertices.len() > config.vertex_split_threshold
    }

    fn total(&self) -> usize {
        self.faces.len() + self.edges.len() + self.vertices.len()
    }
}

/// An octree node.
#[derive(Debug, Clone)]
pub enum OctreeNode {
    /// Leaf node holding item ids.
    Leaf {
        /// Region covered by this node.
        aabb: Aabb3,
        /// Items overlapping the region.
        items: Bucket,
    },
    /// Branch node with 8 children.
    Branch {
        /// Region covered by this node.
        aabb: Aabb3,
        /// Children in Morton order: (-x-y-z), (+x-y-z), (-x+y-z), (+x+y-z),
        /// (-x-y+z), (+x-y+z), (-x+y+z), (+x+y+z)
        children: Box<[OctreeNode; 8]>,
    },
}

impl OctreeNode {
    /// Region covered by this node.
    pub fn aabb(&self) -> &Aabb3 {
        match self {
            OctreeNode::Leaf { aabb, .. } | OctreeNode::Branch { aabb, .. } => aabb,
        }
    }
}

/// Spatial index over one polyhedron's geometry.
#[derive(Debug, Clone)]
pub struct Octree {
    root: OctreeNode,
    face_bounds: Vec<Aabb3>,
    edge_bounds: Vec<Aabb3>,
    vertex_points: Vec<Option<Point3>>,
    eps: f64,
}

/// Geometry snapshot the octree is built from.
pub(crate) struct OctreeInput {
    /// Padded bounds of each face, indexed by face id.
    pub face_bounds: Vec<Aabb3>,
    /// Padded bounds of each edge, indexed by edge id.
    pub edge_bounds: Vec<Aabb3>,
    /// Position of each vertex, `None` for vertices no face uses.
    pub vertex_points: Vec<Option<Point3>>,
}

impl Octree {
    /// Build eagerly over `region`, which must contain every item.
    pub(crate) fn build(region: Aabb3, input: OctreeInput, config: &OctreeConfig, eps: f64) -> Self {
        let mut tree = Self {
            root: OctreeNode::Leaf {
                aabb: region,
                items: Bucket::default(),
            },
            face_bounds: input.face_bounds,
            edge_bounds: input.edge_bounds,
            vertex_points: input.vertex_points,
            eps,
        };

        let items = Bucket {
            faces: (0..tree.face_bounds.len()).map(FaceId::from_index).collect(),
            edges: (0..tree.edge_bounds.len()).map(EdgeId::from_index).collect(),
            vertices: tree
                .vertex_points
                .iter()
                .enumerate()
                .filter(|(_, p)| p.is_some())
                .map(|(i, _)| VertexId::from_index(i))
                .collect(),
        };
        tree.root = tree.build_node(region, items, 0, config);

        tracing::debug!(
            nodes = tree.node_count(),
            depth = tree.depth(),
            faces = tree.face_bounds.len(),
            "octree built"
        );
        tree
    }

    fn build_node(&self, aabb: Aabb3, items: Bucket, depth: u32, config: &OctreeConfig) -> OctreeNode {
        if depth >= config.max_depth || !items.exceeds(config) {
            return OctreeNode::Leaf { aabb, items };
        }

        let octants = aabb.octants();
        let split: Vec<Bucket> = octants.iter().map(|o| self.select(o, &items)).collect();

        // Abandon splits where no child ends up with fewer items.
        let total = items.total();
        if split.iter().all(|b| b.total() == total) {
            return OctreeNode::Leaf { aabb, items };
        }

        let mut split = split.into_iter();
        let children: [OctreeNode; 8] = std::array::from_fn(|i| {
            let bucket = split.next().unwrap_or_default();
            self.build_node(octants[i], bucket, depth + 1, config)
        });
        OctreeNode::Branch {
            aabb,
            children: Box::new(children),
        }
    }

    /// The subset of `items` overlapping `region`.
    fn select(&self, region: &Aabb3, items: &Bucket) -> Bucket {
        Bucket {
            faces: items
                .faces
                .iter()
                .copied()
                .filter(|f| self.face_bounds[f.index()].overlaps(region))
                .collect(),
            edges: items
                .edges
                .iter()
                .copied()
                .filter(|e| self.edge_bounds[e.index()].overlaps(region))
                .collect(),
            vertices: items
                .vertices
                .iter()
                .copied()
                .filter(|v| self.vertex_bounds(*v).is_some_and(|b| b.overlaps(region)))
                .collect(),
        }
    }

    fn vertex_bounds(&self, v: VertexId) -> Option<Aabb3> {
        self.vertex_points[v.index()].map(|p| Aabb3::new(p, p).expanded(self.eps))
    }

    /// Root node.
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        fn count(node: &OctreeNode) -> usize {
            match node {
                OctreeNode::Leaf { .. } => 1,
                OctreeNode::Branch { children, .. } => 1 + children.iter().map(count).sum::<usize>(),
            }
        }
        count(&self.root)
    }

    /// Depth of the deepest leaf, the root being depth 0.
    pub fn depth(&self) -> u32 {
        fn deepest(node: &OctreeNode) -> u32 {
            match node {
                OctreeNode::Leaf { .. } => 0,
                OctreeNode::Branch { children, .. } => {
                    1 + children.iter().map(deepest).max().unwrap_or(0)
                }
            }
        }
        deepest(&self.root)
    }

    /// Faces whose bounds overlap `query`.
    pub fn faces_in_aabb(&self, query: &Aabb3) -> Vec<FaceId> {
        self.gather(
            &|node: &Aabb3| node.overlaps(query),
            bucket_faces,
            &|f: FaceId| self.face_bounds[f.index()].overlaps(query),
            self.face_bounds.len(),
        )
    }

    /// Edges whose bounds overlap `query`.
    pub fn edges_in_aabb(&self, query: &Aabb3) -> Vec<EdgeId> {
        self.gather(
            &|node: &Aabb3| node.overlaps(query),
            bucket_edges,
            &|e: EdgeId| self.edge_bounds[e.index()].overlaps(query),
            self.edge_bounds.len(),
        )
    }

    /// Vertices within tolerance of `query`.
    pub fn vertices_in_aabb(&self, query: &Aabb3) -> Vec<VertexId> {
        self.gather(
            &|node: &Aabb3| node.overlaps(query),
            bucket_vertices,
            &|v: VertexId| self.vertex_bounds(v).is_some_and(|b| b.overlaps(query)),
            self.vertex_points.len(),
        )
    }

    /// Faces whose bounds the segment passes through.
    ///
    /// Tighter than querying the segment's bounding box.
    pub fn faces_along_segment(&self, segment: &LineSegment) -> Vec<FaceId> {
        self.gather(
            &|node: &Aabb3| segment.intersects_aabb(node, 0.0),
            bucket_faces,
            &|f: FaceId| segment.intersects_aabb(&self.face_bounds[f.index()], 0.0),
            self.face_bounds.len(),
        )
    }

    fn gather<T: Copy + Ord + ArenaIndex>(
        &self,
        enter: &dyn Fn(&Aabb3) -> bool,
        list: fn(&Bucket) -> &[T],
        keep: &dyn Fn(T) -> bool,
        len: usize,
    ) -> Vec<T> {
        let mut seen = vec![false; len];
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !enter(node.aabb()) {
                continue;
            }
            match node {
                OctreeNode::Branch { children, .. } => stack.extend(children.iter()),
                OctreeNode::Leaf { items, .. } => {
                    for &id in list(items) {
                        let i = id.arena_index();
                        if !seen[i] {
                            seen[i] = true;
                            if keep(id) {
                                out.push(id);
                            }
                        }
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }
}

trait ArenaIndex {
    fn arena_index(self) -> usize;
}

impl ArenaIndex for FaceId {
    fn arena_index(self) -> usize {
        self.index()
    }
}

impl ArenaIndex for EdgeId {
    fn arena_index(self) -> usize {
        self.index()
    }
}

impl ArenaIndex for VertexId {
    fn arena_index(self) -> usize {
        self.index()
    }
}

fn bucket_faces(b: &Bucket) -> &[FaceId] {
    &b.faces
}

fn bucket_edges(b: &Bucket) -> &[EdgeId] {
    &b.edges
}

fn bucket_vertices(b: &Bucket) -> &[VertexId] {
    &b.vertices
}
