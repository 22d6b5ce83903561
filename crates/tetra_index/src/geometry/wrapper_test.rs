use glam::DVec3;

use super::*;
use crate::mesh::Vertex;

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
fn centroid_averages_the_four_corners() {
  let m = corner_mesh();
  assert_eq!(tetrahedron_centroid(1, &m), DVec3::splat(0.25));
}

#[test]
fn build_test_is_more_permissive_than_query_test() {
  let m = corner_mesh();
  // A node whose min corner touches the tetra only at the origin vertex.
  let bb = Aabb3::new(DVec3::new(-1.0, -1.0, -1.0), DVec3::ZERO);
  assert!(tetra_in_box_build(1, &bb, &m));
  assert!(!tetra_in_box_query(1, &bb, &m));
  // A node overlapping the interior satisfies both.
  let bb = Aabb3::new(DVec3::splat(-0.5), DVec3::splat(0.5));
  assert!(tetra_in_box_build(1, &bb, &m));
  assert!(tetra_in_box_query(1, &bb, &m));
}

#[test]
fn order_faces_fixes_a_left_oriented_tetrahedron() {
  let mut m = corner_mesh();
  order_faces(&mut m);
  let t = m.tetrahedron(1);
  // Face 0 must now see vertex 3 on its right.
  let turn = predicates::four_point_turn(
    m.vertex(t.tv(3)).pos,
    m.vertex(t.tv(0)).pos,
    m.vertex(t.tv(1)).pos,
    m.vertex(t.tv(2)).pos,
  );
  assert_eq!(turn, RIGHT_TURN);
  // The vertex set is unchanged.
  let mut ids = t.vertices();
  ids.sort_unstable();
  assert_eq!(ids, [1, 2, 3, 4]);
}

#[test]
fn order_faces_leaves_degenerate_tetrahedra_alone() {
  let mut m = Mesh::new();
  m.push_vertex(Vertex::new(0.0, 0.0, 0.0, 0.0));
  m.push_vertex(Vertex::new(1.0, 0.0, 0.0, 0.0));
  m.push_vertex(Vertex::new(2.0, 0.0, 0.0, 0.0));
  m.push_vertex(Vertex::new(3.0, 0.0, 0.0, 0.0));
  m.push_tetrahedron(Tetrahedron::new(1, 2, 3, 4));
  order_faces(&mut m);
  assert_eq!(m.tetrahedron(1).vertices(), [1, 2, 3, 4]);
}

#[test]
fn segment_in_tetrahedron_after_ordering() {
  let mut m = corner_mesh();
  order_faces(&mut m);
  // Piercing the corner tetra along x at y = z = 0.1.
  let a = DVec3::new(-1.0, 0.1, 0.1);
  let b = DVec3::new(1.0, 0.1, 0.1);
  assert!(segment_in_tetrahedron(a, b, 1, &m));
  // A far-away segment.
  let a = DVec3::new(5.0, 5.0, 5.0);
  let b = DVec3::new(6.0, 5.0, 5.0);
  assert!(!segment_in_tetrahedron(a, b, 1, &m));
  // A segment ending inside stays inside the admissible interval.
  let a = DVec3::new(0.1, 0.1, 0.1);
  let b = DVec3::new(0.2, 0.1, 0.1);
  assert!(segment_in_tetrahedron(a, b, 1, &m));
}

#[test]
fn segment_in_domain_uses_half_open_faces() {
  let dom = Aabb3::new(DVec3::ZERO, DVec3::splat(1.0));
  // Sliding along the max-x face: rejected by the open side.
  let a = DVec3::new(1.0, 0.2, 0.2);
  let b = DVec3::new(1.0, 0.8, 0.8);
  assert!(!segment_in_domain(a, b, &dom));
  assert!(segment_in_bounding_box(a, b, &dom));
}
