//! Tetrahedral mesh: vertex and tetrahedron arrays, the enclosing domain and
//! the out-of-band border-face flags.
//!
//! Vertices and tetrahedra are addressed by 1-based `i32` ids throughout the
//! index; 0 is a sentinel that never names an entity (the run-length encoding
//! of leaf sequences relies on the sign bit of ids).

pub mod aabb;
pub mod point;
pub mod tetra;

pub use aabb::Aabb3;
pub use point::{lex_cmp, Vertex};
pub use tetra::{sort_face_tuples, FaceTuple, Tetrahedron, VertexTetra, EDGE_VERTICES};

use fixedbitset::FixedBitSet;

use crate::error::Error;

/// An indexed tetrahedral mesh.
///
/// Built once by the loader and frozen afterwards, except for the two
/// documented mutations: the border checker sets border-face flags, and the
/// reindexer permutes both entity arrays.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
  vertices: Vec<Vertex>,
  tetrahedra: Vec<Tetrahedron>,
  domain: Aabb3,
  /// Bit `4 * (t - 1) + p` set ⇔ the face opposite position `p` of
  /// tetrahedron `t` lies on the mesh border. Empty until the border checker
  /// runs.
  border_faces: FixedBitSet,
}

impl Mesh {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_capacity(num_vertices: usize, num_tetrahedra: usize) -> Self {
    Self {
      vertices: Vec::with_capacity(num_vertices),
      tetrahedra: Vec::with_capacity(num_tetrahedra),
      domain: Aabb3::default(),
      border_faces: FixedBitSet::new(),
    }
  }

  /// Append a vertex, growing the domain around it.
  pub fn push_vertex(&mut self, v: Vertex) {
    if self.vertices.is_empty() {
      self.domain = Aabb3::point(v.pos);
    } else {
      self.domain.expand_to(v.pos);
    }
    self.vertices.push(v);
  }

  /// Append a tetrahedron. Ids must already be 1-based.
  pub fn push_tetrahedron(&mut self, t: Tetrahedron) {
    self.tetrahedra.push(t);
  }

  /// Validate the mesh invariants after loading.
  ///
  /// Fails on an empty mesh or on a tetrahedron naming a vertex out of range.
  pub fn validate(&self) -> Result<(), Error> {
    if self.vertices.is_empty() || self.tetrahedra.is_empty() {
      return Err(Error::InvalidMesh(
        "mesh must have at least one vertex and one tetrahedron".into(),
      ));
    }
    let nv = self.vertices.len() as i32;
    for (i, t) in self.tetrahedra.iter().enumerate() {
      for v in t.vertices() {
        if v < 1 || v > nv {
          return Err(Error::InvalidMesh(format!(
            "tetrahedron {} references vertex {v} out of range 1..={nv}",
            i + 1
          )));
        }
      }
    }
    Ok(())
  }

  #[inline]
  pub fn domain(&self) -> &Aabb3 {
    &self.domain
  }

  #[inline]
  pub fn num_vertices(&self) -> usize {
    self.vertices.len()
  }

  #[inline]
  pub fn num_tetrahedra(&self) -> usize {
    self.tetrahedra.len()
  }

  /// Vertex by 1-based id.
  #[inline]
  pub fn vertex(&self, id: i32) -> &Vertex {
    &self.vertices[(id - 1) as usize]
  }

  /// Tetrahedron by 1-based id.
  #[inline]
  pub fn tetrahedron(&self, id: i32) -> &Tetrahedron {
    &self.tetrahedra[(id - 1) as usize]
  }

  #[inline]
  pub(crate) fn tetrahedron_mut(&mut self, id: i32) -> &mut Tetrahedron {
    &mut self.tetrahedra[(id - 1) as usize]
  }

  /// All vertex ids, in storage order.
  pub fn vertex_ids(&self) -> impl Iterator<Item = i32> {
    1..=self.vertices.len() as i32
  }

  /// All tetrahedron ids, in storage order.
  pub fn tetrahedron_ids(&self) -> impl Iterator<Item = i32> {
    1..=self.tetrahedra.len() as i32
  }

  // --- border-face flags -------------------------------------------------

  /// Whether the face opposite position `pos` of tetrahedron `t` is on the
  /// mesh border. Always false before the border checker has run.
  #[inline]
  pub fn is_border_face(&self, t: i32, pos: usize) -> bool {
    let bit = 4 * (t as usize - 1) + pos;
    bit < self.border_faces.len() && self.border_faces.contains(bit)
  }

  /// Flag the face opposite position `pos` of tetrahedron `t` as a border
  /// face. Idempotent.
  pub(crate) fn set_border_face(&mut self, t: i32, pos: usize) {
    let needed = 4 * self.tetrahedra.len();
    if self.border_faces.len() < needed {
      self.border_faces.grow(needed);
    }
    self.border_faces.insert(4 * (t as usize - 1) + pos);
  }

  /// Whether `t` has any vertex whose star touches the border at `v_pos`,
  /// i.e. any of the three faces incident in the vertex at `v_pos` is a
  /// border face.
  pub fn is_border_vertex_in(&self, t: i32, v_pos: usize) -> bool {
    (1..4).any(|j| self.is_border_face(t, (j + v_pos) % 4))
  }

  // --- reindexing support ------------------------------------------------

  /// Permute the vertex array so that the vertex with old id `i` moves to
  /// `new_ids[i - 1]`, and rewrite every tetrahedron's vertex ids.
  pub(crate) fn permute_vertices(&mut self, new_ids: &[i32]) {
    debug_assert_eq!(new_ids.len(), self.vertices.len());
    let mut reordered = vec![Vertex::default(); self.vertices.len()];
    for (old, v) in self.vertices.iter().enumerate() {
      reordered[(new_ids[old] - 1) as usize] = *v;
    }
    self.vertices = reordered;
    for t in &mut self.tetrahedra {
      for pos in 0..4 {
        t.set_tv(pos, new_ids[(t.tv(pos) - 1) as usize]);
      }
    }
  }

  /// Permute the tetrahedron array so that the tetrahedron with old id `i`
  /// moves to `new_ids[i - 1]`. Border flags, if present, move along.
  pub(crate) fn permute_tetrahedra(&mut self, new_ids: &[i32]) {
    debug_assert_eq!(new_ids.len(), self.tetrahedra.len());
    let mut reordered = vec![Tetrahedron::default(); self.tetrahedra.len()];
    for (old, t) in self.tetrahedra.iter().enumerate() {
      reordered[(new_ids[old] - 1) as usize] = *t;
    }
    self.tetrahedra = reordered;
    if !self.border_faces.is_empty() {
      let mut flags = FixedBitSet::with_capacity(self.border_faces.len());
      for bit in self.border_faces.ones() {
        let (old, pos) = (bit / 4, bit % 4);
        flags.insert(4 * (new_ids[old] as usize - 1) + pos);
      }
      self.border_faces = flags;
    }
  }
}

#[cfg(test)]
mod tests {
  use glam::DVec3;

  use super::*;

  fn two_tetra_mesh() -> Mesh {
    let mut m = Mesh::new();
    m.push_vertex(Vertex::new(0.0, 0.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(1.0, 0.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(0.0, 1.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(0.0, 0.0, 1.0, 0.0));
    m.push_vertex(Vertex::new(1.0, 1.0, 1.0, 0.0));
    m.push_tetrahedron(Tetrahedron::new(1, 2, 3, 4));
    m.push_tetrahedron(Tetrahedron::new(2, 3, 4, 5));
    m
  }

  #[test]
  fn domain_grows_around_vertices() {
    let m = two_tetra_mesh();
    assert_eq!(m.domain().min, DVec3::ZERO);
    assert_eq!(m.domain().max, DVec3::splat(1.0));
  }

  #[test]
  fn validate_rejects_out_of_range_ids() {
    let mut m = two_tetra_mesh();
    assert!(m.validate().is_ok());
    m.push_tetrahedron(Tetrahedron::new(1, 2, 3, 6));
    assert!(m.validate().is_err());
  }

  #[test]
  fn border_flags_default_unset_and_stick() {
    let mut m = two_tetra_mesh();
    assert!(!m.is_border_face(2, 3));
    m.set_border_face(2, 3);
    assert!(m.is_border_face(2, 3));
    assert!(!m.is_border_face(2, 2));
    assert!(m.is_border_vertex_in(2, 0));
  }

  #[test]
  fn vertex_permutation_rewrites_tetrahedra() {
    let mut m = two_tetra_mesh();
    // Reverse the vertex order.
    let new_ids = vec![5, 4, 3, 2, 1];
    let old_v1 = *m.vertex(1);
    m.permute_vertices(&new_ids);
    assert_eq!(*m.vertex(5), old_v1);
    assert_eq!(m.tetrahedron(1).vertices(), [5, 4, 3, 2]);
    assert_eq!(m.tetrahedron(2).vertices(), [4, 3, 2, 1]);
  }

  #[test]
  fn tetra_permutation_moves_border_flags() {
    let mut m = two_tetra_mesh();
    m.set_border_face(1, 2);
    m.permute_tetrahedra(&[2, 1]);
    assert!(m.is_border_face(2, 2));
    assert!(!m.is_border_face(1, 2));
  }
}
