//! tetra_index - spatial indexes over unstructured tetrahedral meshes.
//!
//! Given a mesh (vertices with a scalar field, tetrahedra as vertex-id
//! quadruples) whose bounding box defines the domain, the index recursively
//! subdivides the domain until each leaf's load falls under a threshold.
//! Leaves index the entities that geometrically belong to them; interior
//! nodes only route. On top of the index sit spatial queries (point
//! location, box and segment intersection) and topological queries
//! (vertex-to-tetrahedra, tetra adjacency, per-vertex discrete distortion).
//!
//! Two orthogonal axes configure a tree: the subdivision shape
//! ([`Subdivision`]: octree or KD) and the leaf-overflow criterion
//! ([`Criterion`]: vertex threshold, tetra threshold with or without the
//! common-vertex escape, or the one-shot reinsert rule). Leaf payloads are
//! run-length compressed id sequences; the optional [`TetraTree::reindex`]
//! pass renumbers the mesh along the traversal order so that those sequences
//! collapse into a few runs, which the query engines exploit through
//! per-run bounding boxes.
//!
//! # Example
//!
//! ```
//! use glam::DVec3;
//! use tetra_index::{Criterion, Subdivision, TetraTree};
//! use tetra_index::mesh::{Mesh, Tetrahedron, Vertex};
//! use tetra_index::query::{self, QueryStats};
//!
//! let mut mesh = Mesh::new();
//! mesh.push_vertex(Vertex::new(0.0, 0.0, 0.0, 0.0));
//! mesh.push_vertex(Vertex::new(1.0, 0.0, 0.0, 0.0));
//! mesh.push_vertex(Vertex::new(0.0, 1.0, 0.0, 0.0));
//! mesh.push_vertex(Vertex::new(0.0, 0.0, 1.0, 0.0));
//! mesh.push_tetrahedron(Tetrahedron::new(1, 2, 3, 4));
//!
//! let mut tree = TetraTree::build(
//!   mesh,
//!   Subdivision::Octree,
//!   Criterion::Pr { max_vertices: 8 },
//! )
//! .unwrap();
//! tree.reindex().unwrap();
//!
//! let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
//! let hit = query::locate_point(&tree, DVec3::new(0.1, 0.1, 0.1), &mut stats);
//! assert_eq!(hit, Some(1));
//! ```

pub mod error;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod query;
pub mod stats;
pub mod tree;

pub use error::Error;
pub use mesh::{Aabb3, Mesh, Tetrahedron, Vertex};
pub use stats::{index_stats, IndexStats};
pub use tree::{Criterion, CriterionKind, Subdivision, TetraTree};

#[cfg(test)]
mod consistency_test;
#[cfg(test)]
mod test_support;
