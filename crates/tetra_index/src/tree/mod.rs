//! The tetrahedral-tree index: subdivision strategies, nodes with compressed
//! payloads, the four build criteria and the spatial reindexer.
//!
//! Lifecycle: `build` produces a frozen hierarchy; `reindex` optionally
//! permutes the mesh so that leaf sequences compress into runs (irreversible
//! without a rebuild); `order_faces` is a one-shot prerequisite of segment
//! queries, `compute_borders` of the distortion query. Queries are valid in
//! both the built and the reindexed state.

pub mod builder;
pub mod node;
pub mod reindexer;
pub mod runs;
pub mod subdivision;

pub use builder::{Criterion, CriterionKind};
pub use node::{run_bounding_box, Node};
pub use runs::{RunEntry, RunVec};
pub use subdivision::Subdivision;

use crate::error::Error;
use crate::geometry::wrapper;
use crate::mesh::Mesh;

/// A spatial index over a tetrahedral mesh.
pub struct TetraTree {
  mesh: Mesh,
  root: Node,
  subdivision: Subdivision,
  criterion: Criterion,
  reindexed: bool,
  faces_ordered: bool,
  borders_computed: bool,
}

impl TetraTree {
  /// Build the index for `mesh` with the given subdivision and criterion.
  ///
  /// Validates the mesh first; an empty mesh or an out-of-range vertex id is
  /// a fatal input error.
  pub fn build(mesh: Mesh, subdivision: Subdivision, criterion: Criterion) -> Result<Self, Error> {
    mesh.validate()?;
    let mut root = Node::leaf();
    builder::Builder {
      mesh: &mesh,
      subdivision,
      criterion,
    }
    .build(&mut root);
    Ok(Self {
      mesh,
      root,
      subdivision,
      criterion,
      reindexed: false,
      faces_ordered: false,
      borders_computed: false,
    })
  }

  /// Assemble a tree whose hierarchy was produced elsewhere (file loading).
  pub(crate) fn from_parts(
    mesh: Mesh,
    root: Node,
    subdivision: Subdivision,
    criterion: Criterion,
  ) -> Self {
    Self {
      mesh,
      root,
      subdivision,
      criterion,
      reindexed: false,
      faces_ordered: false,
      borders_computed: false,
    }
  }

  #[inline]
  pub fn mesh(&self) -> &Mesh {
    &self.mesh
  }

  #[inline]
  pub fn root(&self) -> &Node {
    &self.root
  }

  #[inline]
  pub fn subdivision(&self) -> Subdivision {
    self.subdivision
  }

  #[inline]
  pub fn criterion(&self) -> Criterion {
    self.criterion
  }

  /// Whether the mesh and the leaf sequences have been spatially reindexed.
  #[inline]
  pub fn is_reindexed(&self) -> bool {
    self.reindexed
  }

  /// Whether the one-shot face-orientation pass has run.
  #[inline]
  pub fn faces_ordered(&self) -> bool {
    self.faces_ordered
  }

  /// Whether the border checker has run.
  #[inline]
  pub fn borders_computed(&self) -> bool {
    self.borders_computed
  }

  /// Renumber mesh vertices and tetrahedra to match tree-traversal order and
  /// compress every leaf sequence. Irreversible without a rebuild.
  pub fn reindex(&mut self) -> Result<(), Error> {
    reindexer::reindex(self)?;
    self.reindexed = true;
    Ok(())
  }

  /// Orient every tetrahedron's faces outward; required once before any
  /// segment query.
  pub fn order_faces(&mut self) {
    wrapper::order_faces(&mut self.mesh);
    self.faces_ordered = true;
  }

  /// Split borrow for passes that read the hierarchy while mutating the
  /// mesh (border checker).
  pub(crate) fn root_and_mesh_mut(&mut self) -> (&Node, &mut Mesh) {
    (&self.root, &mut self.mesh)
  }

  pub(crate) fn mark_borders_computed(&mut self) {
    self.borders_computed = true;
  }
}
