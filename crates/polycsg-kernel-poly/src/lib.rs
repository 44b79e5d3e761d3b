#![warn(missing_docs)]

//! Boundary-representation polyhedra for CSG processing.
//!
//! A [`Polyhedron`] is built from face loops over shared vertices. The
//! build pipeline has 4 stages:
//! 1. **Connectivity**: validate loops, create directed edges, pair
//!    opposite edges as radial neighbours
//! 2. **Manifolds**: flood fill faces into manifolds, mark them closed or
//!    open, measure signed volumes
//! 3. **Octree**: index face, edge and vertex bounds for locality queries
//! 4. **Embedding**: find which closed manifolds nest inside which
//!
//! Queries classify points as inside, outside or on the boundary, and
//! return faces, edges or vertices near a point, segment or box. Mutations
//! (transforms, inversion, canonicalization) rerun the affected stages
//! before returning.
//!
//! ```
//! use polycsg_kernel_math::Point3;
//! use polycsg_kernel_poly::{FaceVertexData, PointClass, Polyhedron};
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ];
//! let faces = vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]];
//! let poly = Polyhedron::new(&FaceVertexData::new(vertices, faces)).unwrap();
//!
//! assert_eq!(poly.manifold_count(), 1);
//! let c = poly.contains_vertex(&Point3::new(0.2, 0.2, 0.2));
//! assert_eq!(c.class, PointClass::Inside);
//! ```

mod canonical;
pub mod classify;
pub mod config;
mod connectivity;
pub mod diagnostic;
pub mod error;
mod extract;
pub mod face;
pub mod input;
pub mod manifold;
pub mod octree;
mod polyhedron;
pub mod topology;
mod transform;

#[cfg(test)]
mod test_shapes;

pub use canonical::CanonicalizeReport;
pub use classify::{BoundaryFeature, BoundaryHit, ClassifyOptions, Containment, PointClass};
pub use config::{CrossingRule, OctreeConfig, PolyConfig};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use error::{ConfigError, PolyError, PolyResult};
pub use face::{Face, Plane, Projection};
pub use input::FaceVertexData;
pub use manifold::ManifoldInfo;
pub use octree::Octree;
pub use polyhedron::{Polyhedron, SpatialQuery};
pub use topology::{Edge, EdgeId, FaceId, ManifoldId, Vertex, VertexId};
