//! Mesh-level geometric tests: the glue between the id-based mesh and the
//! coordinate-based predicates, plus the one-shot face-orientation pass
//! required by the segment-vs-tetrahedron test.

use glam::DVec3;
use tracing::warn;

use crate::mesh::{Aabb3, Mesh, Tetrahedron};

use super::predicates::{self, RIGHT_TURN};

/// Coordinates of the four vertices of tetrahedron `t`.
#[inline]
pub fn tetra_coords(t: i32, mesh: &Mesh) -> [DVec3; 4] {
  let tet = mesh.tetrahedron(t);
  [
    mesh.vertex(tet.tv(0)).pos,
    mesh.vertex(tet.tv(1)).pos,
    mesh.vertex(tet.tv(2)).pos,
    mesh.vertex(tet.tv(3)).pos,
  ]
}

/// Centroid of tetrahedron `t`.
pub fn tetrahedron_centroid(t: i32, mesh: &Mesh) -> DVec3 {
  let [a, b, c, d] = tetra_coords(t, mesh);
  (a + b + c + d) / 4.0
}

/// Closed point-in-tetrahedron test on mesh tetrahedron `t`.
pub fn point_in_tetrahedron(t: i32, p: DVec3, mesh: &Mesh) -> bool {
  predicates::point_in_tetra(p, &tetra_coords(t, mesh))
}

/// Build-time tetrahedron-vs-node test.
///
/// A tetrahedron with a vertex contained by the node (half-open, domain-max
/// override) is indexed there without any further geometry; otherwise the
/// closed-box intersection test decides.
pub fn tetra_in_box_build(t: i32, bb: &Aabb3, mesh: &Mesh) -> bool {
  let tet = mesh.tetrahedron(t);
  let domain_max = mesh.domain().max;
  for pos in 0..4 {
    if bb.contains(mesh.vertex(tet.tv(pos)).pos, domain_max) {
      return true;
    }
  }
  predicates::tetra_in_box(bb, &tetra_coords(t, mesh))
}

/// Query-time tetrahedron-vs-box test, all box faces open.
pub fn tetra_in_box_query(t: i32, bb: &Aabb3, mesh: &Mesh) -> bool {
  predicates::tetra_in_box_strict(bb, &tetra_coords(t, mesh))
}

/// Segment-vs-node-domain test used to descend the tree during line queries.
#[inline]
pub fn segment_in_domain(a: DVec3, b: DVec3, dom: &Aabb3) -> bool {
  predicates::clip_segment_3d_middle(dom, a, b)
}

/// Segment-vs-run-bounding-box pruning test (closed faces).
#[inline]
pub fn segment_in_bounding_box(a: DVec3, b: DVec3, bb: &Aabb3) -> bool {
  predicates::clip_segment_3d(bb, a, b)
}

/// Vertex ids of the face at `pos`, ordered so that the face normal points
/// outward once [`order_faces`] has run.
fn ordered_face(t: &Tetrahedron, pos: usize) -> [i32; 3] {
  match pos {
    0 => [t.tv(0), t.tv(1), t.tv(2)],
    1 => [t.tv(1), t.tv(3), t.tv(2)],
    2 => [t.tv(3), t.tv(0), t.tv(2)],
    _ => [t.tv(1), t.tv(0), t.tv(3)],
  }
}

/// Segment-vs-tetrahedron test: parametric clipping of `a -> b` against the
/// four face planes.
///
/// Requires [`order_faces`] to have been run on the mesh so that the faces
/// are consistently outward-oriented; the tree front-end guards this.
pub fn segment_in_tetrahedron(a: DVec3, b: DVec3, t: i32, mesh: &Mesh) -> bool {
  let tet = mesh.tetrahedron(t);
  let d = b - a;
  let mut t_first = 0.0f64;
  let mut t_last = 1.0f64;

  for pos in 0..4 {
    let f = ordered_face(tet, pos);
    let f0 = mesh.vertex(f[0]).pos;
    let n = (mesh.vertex(f[1]).pos - f0).cross(mesh.vertex(f[2]).pos - f0);
    let num = -(a - f0).dot(n);
    let den = d.dot(n);

    if den == 0.0 {
      // Parallel to this face: outside it means outside the tetrahedron.
      if num < 0.0 {
        return false;
      }
    } else {
      let t_hit = num / den;
      if den < 0.0 {
        // Entering through this face.
        t_first = t_first.max(t_hit);
        if t_first > t_last {
          return false;
        }
      } else {
        // Leaving through this face.
        t_last = t_last.min(t_hit);
        if t_last < t_first {
          return false;
        }
      }
    }
  }
  true
}

/// One-shot orientation pass: reorder the first three vertices of every
/// tetrahedron so that face 0 sees vertex 3 on its right side.
///
/// Tries the permutations `(0,1,2,3)`, `(1,0,2,3)`, `(2,1,0,3)` in order and
/// adopts the first that works. A tetrahedron accepting none of them is
/// degenerate (four coplanar points); it is reported and left untouched, and
/// later segment queries may miss it.
pub fn order_faces(mesh: &mut Mesh) {
  for t in mesh.tetrahedron_ids() {
    orient_tetrahedron(t, mesh);
  }
}

fn orient_tetrahedron(t: i32, mesh: &mut Mesh) {
  let tet = *mesh.tetrahedron(t);
  let p = |pos: usize| mesh.vertex(tet.tv(pos)).pos;

  let permutations: [[usize; 4]; 3] = [[0, 1, 2, 3], [1, 0, 2, 3], [2, 1, 0, 3]];
  for perm in permutations {
    let turn = predicates::four_point_turn(p(perm[3]), p(perm[0]), p(perm[1]), p(perm[2]));
    if turn == RIGHT_TURN {
      if perm != [0, 1, 2, 3] {
        *mesh.tetrahedron_mut(t) = Tetrahedron::new(
          tet.tv(perm[0]),
          tet.tv(perm[1]),
          tet.tv(perm[2]),
          tet.tv(perm[3]),
        );
      }
      return;
    }
  }
  warn!(
    tetrahedron = t,
    vertices = ?tet.vertices(),
    "no orientation of the first face sees vertex 3 on its right; degenerate tetrahedron"
  );
}

#[cfg(test)]
#[path = "wrapper_test.rs"]
mod wrapper_test;
