//! Tree nodes: interior nodes route to a fixed-arity child array, leaves
//! hold compressed id sequences.
//!
//! A node never stores its own box; traversals recompute child domains from
//! the subdivision strategy. Vertex sequences are only populated for the
//! vertex-threshold criteria (the V flavor); tetra-threshold trees leave them
//! empty and derive vertex ownership from the leaf domain.

use crate::mesh::{Aabb3, Mesh, Tetrahedron};

use super::runs::RunVec;

/// One node of a tetrahedral tree.
#[derive(Clone, Debug, Default)]
pub struct Node {
  children: Option<Box<[Node]>>,
  vertices: RunVec,
  tetrahedra: RunVec,
}

impl Node {
  /// A fresh leaf with empty payloads.
  pub fn leaf() -> Self {
    Self::default()
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.children.is_none()
  }

  /// The child array of an interior node, empty for a leaf.
  #[inline]
  pub fn children(&self) -> &[Node] {
    self.children.as_deref().unwrap_or(&[])
  }

  #[inline]
  pub(crate) fn children_mut(&mut self) -> &mut [Node] {
    self.children.as_deref_mut().unwrap_or(&mut [])
  }

  /// Turn a leaf into an interior node with `arity` empty children.
  pub(crate) fn allocate_children(&mut self, arity: usize) {
    debug_assert!(self.is_leaf());
    self.children = Some(vec![Node::leaf(); arity].into_boxed_slice());
  }

  // --- payloads -----------------------------------------------------------

  #[inline]
  pub fn vertices(&self) -> &RunVec {
    &self.vertices
  }

  #[inline]
  pub fn tetrahedra(&self) -> &RunVec {
    &self.tetrahedra
  }

  #[inline]
  pub(crate) fn add_vertex(&mut self, v: i32) {
    self.vertices.push(v);
  }

  #[inline]
  pub(crate) fn add_tetrahedron(&mut self, t: i32) {
    self.tetrahedra.push(t);
  }

  pub(crate) fn take_vertices(&mut self) -> RunVec {
    std::mem::take(&mut self.vertices)
  }

  pub(crate) fn take_tetrahedra(&mut self) -> RunVec {
    std::mem::take(&mut self.tetrahedra)
  }

  pub(crate) fn set_vertex_range(&mut self, start: i32, end: i32) {
    self.vertices.set_range(start, end);
  }

  pub(crate) fn set_tetrahedra(&mut self, seq: RunVec) {
    self.tetrahedra = seq;
  }

  // --- vertex ownership (V flavor) ----------------------------------------

  /// The `[start, end)` vertex range of a reindexed V node.
  pub fn vertex_range(&self) -> Option<(i32, i32)> {
    self.vertices.as_range()
  }

  /// Range test on a reindexed V node. False when no range is stored.
  #[inline]
  pub fn indexes_vertex(&self, v: i32) -> bool {
    match self.vertex_range() {
      Some((start, end)) => v >= start && v < end,
      None => false,
    }
  }

  /// Whether at least one vertex of `t` falls in this node's vertex range.
  pub fn indexes_tetra_vertices(&self, t: &Tetrahedron) -> bool {
    if self.vertices.is_empty() {
      return false;
    }
    t.vertices().iter().any(|&v| self.indexes_vertex(v))
  }

  /// Whether all four vertices of `t` fall in this node's vertex range.
  pub fn completely_indexes_tetra_vertices(&self, t: &Tetrahedron) -> bool {
    if self.vertices.is_empty() {
      return false;
    }
    t.vertices().iter().all(|&v| self.indexes_vertex(v))
  }

  // --- vertex ownership (T flavor) ----------------------------------------

  /// Whether at least one vertex of `t` is contained by `dom` (half-open,
  /// domain-max override).
  pub fn indexes_tetra_vertices_dom(&self, t: &Tetrahedron, dom: &Aabb3, mesh: &Mesh) -> bool {
    let domain_max = mesh.domain().max;
    t.vertices()
      .iter()
      .any(|&v| dom.contains(mesh.vertex(v).pos, domain_max))
  }

  /// Whether all four vertices of `t` are contained by `dom`.
  pub fn completely_indexes_tetra_vertices_dom(
    &self,
    t: &Tetrahedron,
    dom: &Aabb3,
    mesh: &Mesh,
  ) -> bool {
    let domain_max = mesh.domain().max;
    t.vertices()
      .iter()
      .all(|&v| dom.contains(mesh.vertex(v).pos, domain_max))
  }

  /// `[start, end)` over the vertex ids of this leaf's tetrahedra that are
  /// contained by `dom`. Only meaningful after reindexing, when the vertices
  /// owned by a leaf form a contiguous id range.
  pub fn vertex_range_in_domain(&self, dom: &Aabb3, mesh: &Mesh) -> Option<(i32, i32)> {
    let domain_max = mesh.domain().max;
    let mut range: Option<(i32, i32)> = None;
    for t in self.tetrahedra.iter() {
      let tet = mesh.tetrahedron(t);
      for pos in 0..4 {
        let v = tet.tv(pos);
        let outside_known = match range {
          Some((start, end)) => v < start || v >= end,
          None => true,
        };
        if outside_known && dom.contains(mesh.vertex(v).pos, domain_max) {
          range = Some(match range {
            None => (v, v + 1),
            Some((start, end)) => (start.min(v), end.max(v + 1)),
          });
        }
      }
    }
    range
  }
}

/// Union of the vertex bounding boxes of the tetrahedra `first..=last`.
pub fn run_bounding_box(first: i32, last: i32, mesh: &Mesh) -> Aabb3 {
  let mut bb: Option<Aabb3> = None;
  for t in first..=last {
    let tet = mesh.tetrahedron(t);
    for pos in 0..4 {
      let p = mesh.vertex(tet.tv(pos)).pos;
      match &mut bb {
        None => bb = Some(Aabb3::point(p)),
        Some(bb) => bb.expand_to(p),
      }
    }
  }
  bb.expect("a run holds at least one tetrahedron")
}
