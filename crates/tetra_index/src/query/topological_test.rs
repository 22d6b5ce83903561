use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;

use super::*;
use crate::mesh::Aabb3;
use crate::query::border::compute_borders;
use crate::test_support::{cube_star_mesh, grid_mesh};
use crate::tree::{Criterion, Subdivision, TetraTree};

fn tree_pr(max_vertices: usize) -> TetraTree {
  TetraTree::build(
    cube_star_mesh(),
    Subdivision::Octree,
    Criterion::Pr { max_vertices },
  )
  .unwrap()
}

fn reindexed_tree_pr(max_vertices: usize) -> TetraTree {
  let mut tree = tree_pr(max_vertices);
  tree.reindex().unwrap();
  tree
}

/// A box strictly containing the whole mesh domain.
fn covering_box(tree: &TetraTree) -> Aabb3 {
  let dom = tree.mesh().domain();
  Aabb3::new(dom.min - DVec3::splat(1.0), dom.max + DVec3::splat(1.0))
}

/// Incident tetrahedra of `v`, by brute force over the mesh.
fn star_of(v: i32, tree: &TetraTree) -> Vec<i32> {
  tree
    .mesh()
    .tetrahedron_ids()
    .filter(|&t| tree.mesh().tetrahedron(t).has_vertex(v))
    .collect()
}

#[test]
fn full_window_vt_equals_the_vertex_stars() {
  for tree in [tree_pr(10), tree_pr(4), reindexed_tree_pr(4)] {
    let vt = windowed_vt(&tree, &covering_box(&tree));
    assert_eq!(vt.len(), tree.mesh().num_vertices());
    for (v, mut list) in vt {
      list.sort_unstable();
      assert_eq!(list, star_of(v, &tree), "vertex {v}");
    }
  }
}

#[test]
fn windowed_vt_restricts_to_vertices_in_the_window() {
  let tree = reindexed_tree_pr(4);
  // Corner window around the origin: only vertices with all coordinates
  // at most one half.
  let b = Aabb3::new(DVec3::ZERO, DVec3::splat(0.5));
  let vt = windowed_vt(&tree, &b);
  let expected: BTreeSet<i32> = tree
    .mesh()
    .vertex_ids()
    .filter(|&v| b.contains_closed(tree.mesh().vertex(v).pos))
    .collect();
  let got: BTreeSet<i32> = vt.keys().copied().collect();
  assert_eq!(got, expected);
  for (v, mut list) in vt {
    list.sort_unstable();
    assert_eq!(list, star_of(v, &tree), "vertex {v}");
  }
}

#[test]
fn batched_vt_matches_windowed_union() {
  let tree = reindexed_tree_pr(2);
  let batched = batched_vt(&tree);
  assert!(batched.max_leaf_entries > 0);
  for v in tree.mesh().vertex_ids() {
    let mut list = batched.lists[(v - 1) as usize].clone();
    list.sort_unstable();
    assert_eq!(list, star_of(v, &tree), "vertex {v}");
  }
}

#[test]
fn batched_tt_pairs_shared_faces_symmetrically() {
  let tree = tree_pr(10);
  let tt = batched_tt(&tree);
  assert_eq!(tt.adjacency.len(), 12);
  for t in tree.mesh().tetrahedron_ids() {
    let adj = tt.adjacency[(t - 1) as usize];
    // Each star tetrahedron shares its three centre-incident faces and has
    // one boundary face on the cube surface.
    let neighbours = adj.iter().filter(|&&n| n != -1).count();
    assert_eq!(neighbours, 3, "tetra {t}: {adj:?}");
    for (pos, &other) in adj.iter().enumerate() {
      if other == -1 {
        continue;
      }
      // Symmetry: the neighbour points back.
      let back = tt.adjacency[(other - 1) as usize];
      assert!(back.contains(&t), "tetra {t} face {pos} -> {other}");
      // The shared face exists on both sides.
      let face = tree.mesh().tetrahedron(t).face(pos);
      let other_tet = tree.mesh().tetrahedron(other);
      assert!((0..4).any(|p| other_tet.face(p) == face));
    }
  }
}

#[test]
fn windowed_tt_over_a_covering_box_equals_batched_tt() {
  for tree in [tree_pr(10), tree_pr(4), reindexed_tree_pr(4)] {
    let batched = batched_tt(&tree);
    let windowed = windowed_tt(&tree, &covering_box(&tree));
    assert_eq!(windowed.len(), tree.mesh().num_tetrahedra());
    for (t, adj) in windowed {
      assert_eq!(adj, batched.adjacency[(t - 1) as usize], "tetra {t}");
    }
  }
}

#[test]
fn windowed_tt_in_a_corner_finds_local_adjacency() {
  let tree = reindexed_tree_pr(4);
  let b = Aabb3::new(DVec3::ZERO, DVec3::splat(0.25));
  let tt = windowed_tt(&tree, &b);
  // The corner box intersects the corner star only.
  assert!(!tt.is_empty());
  let batched = batched_tt(&tree);
  for (t, adj) in &tt {
    // Within the result set, adjacency entries agree with the global
    // extraction wherever both sides were examined.
    let global = batched.adjacency[(*t - 1) as usize];
    for pos in 0..4 {
      if adj[pos] != -1 {
        assert_eq!(adj[pos], global[pos], "tetra {t} face {pos}");
      }
    }
  }
}

#[test]
fn linearized_tt_requires_face_ordering() {
  let tree = tree_pr(10);
  let a = DVec3::new(-1.0, 0.5, 0.5);
  let b = DVec3::new(2.0, 0.5, 0.5);
  assert!(linearized_tt(&tree, a, b).is_err());
}

#[test]
fn linearized_tt_walks_the_meridian() {
  let mut tree = tree_pr(10);
  tree.order_faces();
  let a = DVec3::new(-1.0, 0.5, 0.5);
  let b = DVec3::new(2.0, 0.5, 0.5);
  let tt = linearized_tt(&tree, a, b).unwrap();
  for t in crate::test_support::meridian_tetrahedra() {
    assert!(tt.contains_key(&t), "missing meridian tetrahedron {t}");
  }
  let batched = batched_tt(&tree);
  for (t, adj) in &tt {
    let global = batched.adjacency[(*t - 1) as usize];
    for pos in 0..4 {
      if adj[pos] != -1 {
        assert_eq!(adj[pos], global[pos]);
      }
    }
  }
}

/// Face adjacency of the whole mesh by brute force: sort every face of
/// every tetrahedron and pair duplicates.
fn brute_force_adjacency(tree: &TetraTree) -> Vec<[i32; 4]> {
  let mesh = tree.mesh();
  let mut by_face: BTreeMap<[i32; 3], Vec<(i32, usize)>> = BTreeMap::new();
  for t in mesh.tetrahedron_ids() {
    for pos in 0..4 {
      by_face
        .entry(mesh.tetrahedron(t).face(pos))
        .or_default()
        .push((t, pos));
    }
  }
  let mut adjacency = vec![[-1; 4]; mesh.num_tetrahedra()];
  for owners in by_face.values() {
    if let [(t1, p1), (t2, p2)] = owners.as_slice() {
      adjacency[(*t1 - 1) as usize][*p1] = *t2;
      adjacency[(*t2 - 1) as usize][*p2] = *t1;
    }
  }
  adjacency
}

fn grid_trees() -> Vec<TetraTree> {
  let mut reindexed = TetraTree::build(
    grid_mesh(3),
    Subdivision::Octree,
    Criterion::Pr { max_vertices: 8 },
  )
  .unwrap();
  reindexed.reindex().unwrap();
  let plain = TetraTree::build(
    grid_mesh(3),
    Subdivision::Kd,
    Criterion::Pm2 { max_tetrahedra: 30 },
  )
  .unwrap();
  vec![reindexed, plain]
}

#[test]
fn grid_batched_tt_matches_brute_force() {
  for tree in grid_trees() {
    let expected = brute_force_adjacency(&tree);
    let got = batched_tt(&tree);
    assert_eq!(got.adjacency, expected);
  }
}

#[test]
fn grid_windowed_tt_over_a_covering_box_matches_brute_force() {
  for tree in grid_trees() {
    let expected = brute_force_adjacency(&tree);
    let windowed = windowed_tt(&tree, &covering_box(&tree));
    assert_eq!(windowed.len(), tree.mesh().num_tetrahedra());
    for (t, adj) in windowed {
      assert_eq!(adj, expected[(t - 1) as usize], "tetra {t}");
    }
  }
}

#[test]
fn grid_batched_vt_matches_the_stars() {
  for tree in grid_trees() {
    let batched = batched_vt(&tree);
    for v in tree.mesh().vertex_ids() {
      let mut list = batched.lists[(v - 1) as usize].clone();
      list.sort_unstable();
      assert_eq!(list, star_of(v, &tree), "vertex {v}");
    }
  }
}

#[test]
fn grid_windowed_vt_partitions_under_any_window() {
  let b = Aabb3::new(DVec3::new(0.2, 0.1, 0.3), DVec3::new(0.8, 0.7, 0.9));
  for tree in grid_trees() {
    let vt = windowed_vt(&tree, &b);
    let expected: BTreeSet<i32> = tree
      .mesh()
      .vertex_ids()
      .filter(|&v| b.contains_closed(tree.mesh().vertex(v).pos))
      .collect();
    assert_eq!(vt.keys().copied().collect::<BTreeSet<i32>>(), expected);
    for (v, mut list) in vt {
      list.sort_unstable();
      assert_eq!(list, star_of(v, &tree), "vertex {v}");
    }
  }
}

#[test]
fn grid_border_flags_match_the_unpaired_faces() {
  for mut tree in grid_trees() {
    compute_borders(&mut tree);
    let adjacency = brute_force_adjacency(&tree);
    let mesh = tree.mesh();
    for t in mesh.tetrahedron_ids() {
      for pos in 0..4 {
        let boundary = adjacency[(t - 1) as usize][pos] == -1;
        assert_eq!(
          mesh.is_border_face(t, pos),
          boundary,
          "tetra {t} position {pos}"
        );
      }
    }
  }
}

#[test]
fn distortion_requires_border_flags() {
  let tree = tree_pr(10);
  assert!(windowed_distortion(&tree, &covering_box(&tree)).is_err());
}

#[test]
fn distortion_of_the_star_mesh_vanishes() {
  // With a zero field the 4D and 3D angles agree; the star covers the full
  // solid angle around the centre, and border vertices compare the 3D sum
  // against itself. Every distortion is therefore zero.
  for mut tree in [tree_pr(10), reindexed_tree_pr(4)] {
    compute_borders(&mut tree);
    let dist = windowed_distortion(&tree, &covering_box(&tree)).unwrap();
    assert_eq!(dist.len(), tree.mesh().num_vertices());
    for (v, d) in dist {
      assert!(d.abs() < 1e-9, "vertex {v} distortion {d}");
    }
  }
}

#[test]
fn distortion_window_restricts_the_vertices() {
  let mut tree = tree_pr(10);
  compute_borders(&mut tree);
  // Only corner vertex 1 sits inside this window.
  let b = Aabb3::new(DVec3::ZERO, DVec3::splat(0.25));
  let dist = windowed_distortion(&tree, &b).unwrap();
  assert_eq!(dist.keys().copied().collect::<Vec<i32>>(), vec![1]);
  assert!(dist[&1].abs() < 1e-9);
}

#[test]
fn nonzero_field_bends_the_interior_distortion() {
  // Raise the field at the centre vertex: interior distortion at the centre
  // must move away from zero while border vertices keep the mixed formula.
  let mut mesh = cube_star_mesh();
  let centre = mesh.num_vertices() as i32;
  {
    // Rebuild the mesh with a field spike at the centre.
    let mut bent = crate::mesh::Mesh::new();
    for v in mesh.vertex_ids() {
      let src = mesh.vertex(v);
      let field = if v == centre { 2.0 } else { 0.0 };
      bent.push_vertex(crate::mesh::Vertex::new(
        src.pos.x, src.pos.y, src.pos.z, field,
      ));
    }
    for t in mesh.tetrahedron_ids() {
      bent.push_tetrahedron(*mesh.tetrahedron(t));
    }
    mesh = bent;
  }
  let mut tree = TetraTree::build(mesh, Subdivision::Octree, Criterion::Pr { max_vertices: 10 })
    .unwrap();
  compute_borders(&mut tree);
  let dist = windowed_distortion(&tree, &covering_box(&tree)).unwrap();
  let centre_distortion = dist[&centre];
  assert!(
    centre_distortion.abs() > 1e-3,
    "field spike should bend the centre distortion, got {centre_distortion}"
  );
}
