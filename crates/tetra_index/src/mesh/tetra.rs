//! Tetrahedron connectivity: four 1-based vertex ids and the canonical
//! face/edge enumerations used by the topological queries.

/// Vertex-position pairs of the six tetrahedron edges, by canonical position.
pub const EDGE_VERTICES: [[usize; 2]; 6] = [[0, 1], [0, 2], [0, 3], [1, 2], [1, 3], [2, 3]];

/// A tetrahedron, as four 1-based vertex ids.
///
/// Ids are stored non-negative; whether the face opposite a position lies on
/// the mesh border is tracked out-of-band by [`Mesh`](crate::mesh::Mesh).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tetrahedron {
  verts: [i32; 4],
}

impl Tetrahedron {
  pub fn new(v0: i32, v1: i32, v2: i32, v3: i32) -> Self {
    debug_assert!(v0 > 0 && v1 > 0 && v2 > 0 && v3 > 0);
    Self {
      verts: [v0, v1, v2, v3],
    }
  }

  /// Vertex id at boundary position `pos`.
  #[inline]
  pub fn tv(&self, pos: usize) -> i32 {
    self.verts[pos]
  }

  /// Replace the vertex id at position `pos`.
  #[inline]
  pub fn set_tv(&mut self, pos: usize, id: i32) {
    debug_assert!(id > 0);
    self.verts[pos] = id;
  }

  #[inline]
  pub fn vertices(&self) -> [i32; 4] {
    self.verts
  }

  pub fn has_vertex(&self, v: i32) -> bool {
    self.verts.contains(&v)
  }

  /// Canonical (sorted) triangular face opposite to position `pos`.
  pub fn face(&self, pos: usize) -> [i32; 3] {
    let mut f = [
      self.tv((pos + 1) % 4),
      self.tv((pos + 2) % 4),
      self.tv((pos + 3) % 4),
    ];
    f.sort_unstable();
    f
  }

  /// Canonical (sorted) edge at position `k` in `0..6`.
  pub fn edge(&self, k: usize) -> [i32; 2] {
    let [a, b] = EDGE_VERTICES[k];
    let (va, vb) = (self.tv(a), self.tv(b));
    if va <= vb {
      [va, vb]
    } else {
      [vb, va]
    }
  }

  /// The face opposite `pos` as a pairing tuple carrying the tetra id and the
  /// face position, ready for the sort-and-pair adjacency extraction.
  pub fn face_tuple(&self, pos: usize, t_id: i32) -> FaceTuple {
    FaceTuple {
      face: self.face(pos),
      tetra: t_id,
      face_pos: pos as u8,
    }
  }
}

/// Sorted face triple plus the tetrahedron it bounds and the face position.
///
/// Two tuples with equal `face` belong to the two tetrahedra sharing that
/// triangle. Ordering and equality consider the face only.
#[derive(Clone, Copy, Debug)]
pub struct FaceTuple {
  pub face: [i32; 3],
  pub tetra: i32,
  pub face_pos: u8,
}

impl FaceTuple {
  pub fn new(a: i32, b: i32, c: i32, tetra: i32, face_pos: u8) -> Self {
    let mut face = [a, b, c];
    face.sort_unstable();
    Self {
      face,
      tetra,
      face_pos,
    }
  }

  /// True when `v` is not one of the three face vertices.
  #[inline]
  pub fn lacks(&self, v: i32) -> bool {
    !self.face.contains(&v)
  }

  #[inline]
  pub fn same_face(&self, other: &FaceTuple) -> bool {
    self.face == other.face
  }
}

/// Sort face tuples so that the two copies of a shared face are adjacent.
pub fn sort_face_tuples(faces: &mut [FaceTuple]) {
  faces.sort_unstable_by_key(|f| f.face);
}

/// A (vertex, tetrahedron) incidence pair; sorting by vertex groups the
/// incident tetrahedra of each vertex together.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct VertexTetra {
  pub v: i32,
  pub t: i32,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn faces_are_sorted_and_opposite() {
    let t = Tetrahedron::new(4, 2, 9, 7);
    assert_eq!(t.face(0), [2, 7, 9]);
    assert_eq!(t.face(1), [4, 7, 9]);
    assert_eq!(t.face(2), [2, 4, 7]);
    assert_eq!(t.face(3), [2, 4, 9]);
  }

  #[test]
  fn edges_cover_all_pairs() {
    let t = Tetrahedron::new(3, 1, 4, 2);
    let mut edges: Vec<[i32; 2]> = (0..6).map(|k| t.edge(k)).collect();
    edges.sort_unstable();
    assert_eq!(edges, vec![[1, 2], [1, 3], [1, 4], [2, 3], [2, 4], [3, 4]]);
  }

  #[test]
  fn face_tuples_pair_up_after_sorting() {
    let a = Tetrahedron::new(1, 2, 3, 4);
    let b = Tetrahedron::new(2, 3, 4, 5);
    // a's face opposite 0 and b's face opposite 3 are both {2,3,4}.
    let mut faces = vec![a.face_tuple(0, 10), b.face_tuple(1, 11), b.face_tuple(3, 11)];
    sort_face_tuples(&mut faces);
    let shared: Vec<_> = faces
      .windows(2)
      .filter(|w| w[0].same_face(&w[1]))
      .collect();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0][0].face, [2, 3, 4]);
  }
}
