//! Border checker: flag the triangular faces lying on the mesh boundary.
//!
//! Per leaf, the three faces incident in every owned vertex are collected
//! over the leaf's tetrahedra and sorted; a face appearing twice is shared
//! between two tetrahedra, an unpaired face is a boundary face and the flag
//! of the opposite vertex position is set on its tetrahedron. A face is
//! boundary globally iff it is boundary locally in the leaf owning its
//! vertices, so the pass commutes across leaves and is idempotent.

use std::collections::BTreeMap;

use crate::mesh::{sort_face_tuples, Aabb3, FaceTuple, Mesh, Tetrahedron};
use crate::tree::node::Node;
use crate::tree::{Subdivision, TetraTree};

/// Run the border checker over the whole tree, setting the border-face flags
/// on the mesh.
pub fn compute_borders(tree: &mut TetraTree) {
  let subdivision = tree.subdivision();
  let domain = *tree.mesh().domain();
  let by_range = tree.criterion().uses_vertex_lists() && tree.is_reindexed();
  let (root, mesh) = tree.root_and_mesh_mut();
  borders_node(root, &domain, 0, subdivision, by_range, mesh);
  tree.mark_borders_computed();
}

fn borders_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  subdivision: Subdivision,
  by_range: bool,
  mesh: &mut Mesh,
) {
  if n.is_leaf() {
    if by_range {
      borders_leaf_ranged(n, mesh);
    } else {
      borders_leaf_domain(n, dom, mesh);
    }
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    borders_node(child, &child_dom, level + 1, subdivision, by_range, mesh);
  }
}

/// Leaf pass for reindexed V trees: vertex ownership is the id range.
fn borders_leaf_ranged(n: &Node, mesh: &mut Mesh) {
  let Some((v_start, v_end)) = n.vertex_range() else {
    return;
  };
  let mut incident: Vec<Vec<FaceTuple>> = vec![Vec::new(); (v_end - v_start) as usize];
  for t in n.tetrahedra().iter() {
    let tet = *mesh.tetrahedron(t);
    for pos in 0..4 {
      let v = tet.tv(pos);
      if v >= v_start && v < v_end {
        push_incident_faces(&tet, t, pos, &mut incident[(v - v_start) as usize]);
      }
    }
  }
  for faces in &mut incident {
    if !faces.is_empty() {
      flag_unpaired_faces(faces, mesh);
    }
  }
}

/// Leaf pass for every other tree: vertex ownership is half-open domain
/// containment.
fn borders_leaf_domain(n: &Node, dom: &Aabb3, mesh: &mut Mesh) {
  let domain_max = mesh.domain().max;
  let mut incident: BTreeMap<i32, Vec<FaceTuple>> = BTreeMap::new();
  for t in n.tetrahedra().iter() {
    let tet = *mesh.tetrahedron(t);
    for pos in 0..4 {
      let v = tet.tv(pos);
      if dom.contains(mesh.vertex(v).pos, domain_max) {
        push_incident_faces(&tet, t, pos, incident.entry(v).or_default());
      }
    }
  }
  for faces in incident.values_mut() {
    flag_unpaired_faces(faces, mesh);
  }
}

/// The three triangular faces of `tet` incident in the vertex at `v_pos`.
fn push_incident_faces(tet: &Tetrahedron, t: i32, v_pos: usize, faces: &mut Vec<FaceTuple>) {
  for i in 1..4 {
    for j in (i + 1)..4 {
      faces.push(FaceTuple::new(
        tet.tv(v_pos),
        tet.tv((v_pos + i) % 4),
        tet.tv((v_pos + j) % 4),
        t,
        0,
      ));
    }
  }
}

/// Sort the incident faces and flag every unpaired one: the vertex opposite
/// the face gets the border mark on its tetrahedron.
fn flag_unpaired_faces(faces: &mut [FaceTuple], mesh: &mut Mesh) {
  sort_face_tuples(faces);
  let mut i = 0;
  while i < faces.len() {
    if i + 1 < faces.len() && faces[i].same_face(&faces[i + 1]) {
      i += 2;
      continue;
    }
    let face = faces[i];
    let tet = *mesh.tetrahedron(face.tetra);
    for pos in 0..4 {
      if face.lacks(tet.tv(pos)) {
        mesh.set_border_face(face.tetra, pos);
        break;
      }
    }
    i += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::cube_star_mesh;
  use crate::tree::{Criterion, TetraTree};

  fn border_flag_snapshot(mesh: &Mesh) -> Vec<(i32, usize)> {
    let mut flags = Vec::new();
    for t in mesh.tetrahedron_ids() {
      for pos in 0..4 {
        if mesh.is_border_face(t, pos) {
          flags.push((t, pos));
        }
      }
    }
    flags
  }

  #[test]
  fn star_mesh_has_only_outer_borders() {
    let mut tree = TetraTree::build(
      cube_star_mesh(),
      crate::tree::Subdivision::Octree,
      Criterion::Pr { max_vertices: 10 },
    )
    .unwrap();
    compute_borders(&mut tree);
    assert!(tree.borders_computed());

    // Every tetrahedron joins a cube-surface triangle to the centre: exactly
    // the face opposite the centre vertex is on the border.
    let mesh = tree.mesh();
    for t in mesh.tetrahedron_ids() {
      let tet = mesh.tetrahedron(t);
      for pos in 0..4 {
        let expected = tet.tv(pos) == 9;
        assert_eq!(
          mesh.is_border_face(t, pos),
          expected,
          "tetra {t} position {pos}"
        );
      }
    }
  }

  #[test]
  fn border_flags_are_idempotent() {
    let mut tree = TetraTree::build(
      cube_star_mesh(),
      crate::tree::Subdivision::Octree,
      Criterion::Pr { max_vertices: 4 },
    )
    .unwrap();
    compute_borders(&mut tree);
    let once = border_flag_snapshot(tree.mesh());
    compute_borders(&mut tree);
    assert_eq!(once, border_flag_snapshot(tree.mesh()));
    assert!(!once.is_empty());
  }

  #[test]
  fn reindexed_tree_flags_the_same_faces() {
    let mut plain = TetraTree::build(
      cube_star_mesh(),
      crate::tree::Subdivision::Octree,
      Criterion::Pr { max_vertices: 4 },
    )
    .unwrap();
    compute_borders(&mut plain);
    let mut ranged = TetraTree::build(
      cube_star_mesh(),
      crate::tree::Subdivision::Octree,
      Criterion::Pr { max_vertices: 4 },
    )
    .unwrap();
    ranged.reindex().unwrap();
    compute_borders(&mut ranged);

    // Compare geometrically: for every tetra, whether the face opposite the
    // centre vertex is flagged.
    let count = |mesh: &Mesh| {
      mesh
        .tetrahedron_ids()
        .flat_map(|t| (0..4).map(move |p| (t, p)))
        .filter(|&(t, p)| mesh.is_border_face(t, p))
        .count()
    };
    assert_eq!(count(plain.mesh()), count(ranged.mesh()));
    assert_eq!(count(plain.mesh()), 12);
  }
}
