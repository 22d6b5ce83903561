//! Trihedral angles for the discrete distortion of a vertex.
//!
//! The distortion of a vertex compares the total solid angle of its star
//! against the flat reference; the per-tetrahedron contribution is the
//! trihedral angle at the vertex, computed from the three dihedral angles as
//! `A + B + C - pi`. Two variants exist: the field-extended 4D one used for
//! interior vertices and the plain 3D one used on the mesh border.

use std::f64::consts::PI;

use crate::mesh::{Mesh, Tetrahedron};

/// Trihedral angle of tetrahedron `t` at vertex `v`, in the field-extended
/// 4D vector space.
pub fn trihedral_angle(t: &Tetrahedron, v: i32, mesh: &Mesh) -> f64 {
  let [w1, w2, w3] = other_vertices(t, v);
  let v0 = mesh.vertex(v);
  let v1 = mesh.vertex(w1);
  let v2 = mesh.vertex(w2);
  let v3 = mesh.vertex(w3);
  trihedral_from_products(
    v0.scalar_product_4d(v1, v2),
    v0.scalar_product_4d(v1, v3),
    v0.scalar_product_4d(v2, v3),
    v0.norm_4d(v1),
    v0.norm_4d(v2),
    v0.norm_4d(v3),
  )
}

/// Trihedral angle of tetrahedron `t` at vertex `v`, positions only.
pub fn trihedral_angle_3d(t: &Tetrahedron, v: i32, mesh: &Mesh) -> f64 {
  let [w1, w2, w3] = other_vertices(t, v);
  let v0 = mesh.vertex(v);
  let v1 = mesh.vertex(w1);
  let v2 = mesh.vertex(w2);
  let v3 = mesh.vertex(w3);
  trihedral_from_products(
    v0.scalar_product_3d(v1, v2),
    v0.scalar_product_3d(v1, v3),
    v0.scalar_product_3d(v2, v3),
    v0.pos.distance(v1.pos),
    v0.pos.distance(v2.pos),
    v0.pos.distance(v3.pos),
  )
}

/// The three vertices of `t` other than `v`, in the reference order used by
/// the angle decomposition (second, third, first of the remaining positions).
fn other_vertices(t: &Tetrahedron, v: i32) -> [i32; 3] {
  let mut others = [0i32; 3];
  let mut j = 0;
  for pos in 0..4 {
    if t.tv(pos) != v {
      others[j] = t.tv(pos);
      j += 1;
    }
  }
  debug_assert_eq!(j, 3, "vertex must belong to the tetrahedron");
  [others[1], others[2], others[0]]
}

fn trihedral_from_products(
  prod_12: f64,
  prod_13: f64,
  prod_23: f64,
  norm_1: f64,
  norm_2: f64,
  norm_3: f64,
) -> f64 {
  // Angles at the vertex between the three edge vectors.
  let cos_alpha = safe_cos(prod_23, norm_2, norm_3);
  let sin_alpha = sin_from_cos(cos_alpha);
  let cos_beta = safe_cos(prod_13, norm_1, norm_3);
  let sin_beta = sin_from_cos(cos_beta);
  let cos_gamma = safe_cos(prod_12, norm_1, norm_2);
  let sin_gamma = sin_from_cos(cos_gamma);

  let a = dihedral_angle(cos_alpha, cos_beta, cos_gamma, sin_beta, sin_gamma);
  let b = dihedral_angle(cos_beta, cos_alpha, cos_gamma, sin_alpha, sin_gamma);
  let c = dihedral_angle(cos_gamma, cos_alpha, cos_beta, sin_alpha, sin_beta);

  a + b + c - PI
}

/// Dihedral angle opposite the first edge angle, by the spherical law of
/// cosines. The argument is clamped so that a nearly-degenerate corner yields
/// 0 or pi instead of NaN.
fn dihedral_angle(cos_1: f64, cos_2: f64, cos_3: f64, sin_2: f64, sin_3: f64) -> f64 {
  let x = (cos_1 - cos_2 * cos_3) / (sin_2 * sin_3);
  x.clamp(-1.0, 1.0).acos()
}

#[inline]
fn safe_cos(prod: f64, norm_a: f64, norm_b: f64) -> f64 {
  prod / (norm_a * norm_b)
}

#[inline]
fn sin_from_cos(cos: f64) -> f64 {
  (1.0 - cos * cos).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mesh::Vertex;

  /// A regular "corner" tetrahedron: three orthogonal unit edges at vertex 1.
  fn corner_mesh() -> Mesh {
    let mut m = Mesh::new();
    m.push_vertex(Vertex::new(0.0, 0.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(1.0, 0.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(0.0, 1.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(0.0, 0.0, 1.0, 0.0));
    m.push_tetrahedron(Tetrahedron::new(1, 2, 3, 4));
    m
  }

  #[test]
  fn corner_trihedral_angle_is_half_pi() {
    let mesh = corner_mesh();
    let t = *mesh.tetrahedron(1);
    // At the right-angle corner the three dihedral angles are pi/2, so the
    // trihedral angle is 3 * pi/2 - pi = pi/2.
    let angle = trihedral_angle_3d(&t, 1, &mesh);
    assert!((angle - PI / 2.0).abs() < 1e-12, "angle = {angle}");
  }

  #[test]
  fn zero_field_makes_4d_equal_3d() {
    let mesh = corner_mesh();
    let t = *mesh.tetrahedron(1);
    for v in 1..=4 {
      let a3 = trihedral_angle_3d(&t, v, &mesh);
      let a4 = trihedral_angle(&t, v, &mesh);
      assert!((a3 - a4).abs() < 1e-12);
    }
  }

  #[test]
  fn star_angles_at_apex_sum_to_full_turn() {
    // Four tetrahedra splitting the corner octant around the z axis would be
    // overkill; instead check a flat pair: two corner tetrahedra mirrored on
    // the x axis share the apex at the origin.
    let mut m = Mesh::new();
    m.push_vertex(Vertex::new(0.0, 0.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(1.0, 0.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(-1.0, 0.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(0.0, 1.0, 0.0, 0.0));
    m.push_vertex(Vertex::new(0.0, 0.0, 1.0, 0.0));
    m.push_tetrahedron(Tetrahedron::new(1, 2, 4, 5));
    m.push_tetrahedron(Tetrahedron::new(1, 3, 4, 5));
    let a = trihedral_angle_3d(mesh_t(&m, 1), 1, &m);
    let b = trihedral_angle_3d(mesh_t(&m, 2), 1, &m);
    // The two corners are congruent.
    assert!((a - b).abs() < 1e-12);
  }

  fn mesh_t(m: &Mesh, id: i32) -> &Tetrahedron {
    m.tetrahedron(id)
  }
}
