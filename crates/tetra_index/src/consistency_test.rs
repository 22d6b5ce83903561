//! Randomized end-to-end consistency tests.
//!
//! Every query engine is checked against a brute-force scan of the mesh on
//! randomly drawn probes, across both subdivision shapes, both node flavors
//! and the reindexed/plain states. Seeded generators keep failures
//! reproducible.

use std::collections::BTreeSet;

use glam::DVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::wrapper;
use crate::mesh::Aabb3;
use crate::query::{self, QueryStats};
use crate::test_support::grid_mesh;
use crate::tree::{Criterion, Subdivision, TetraTree};

fn trees() -> Vec<TetraTree> {
  let mut trees = vec![
    TetraTree::build(
      grid_mesh(3),
      Subdivision::Octree,
      Criterion::Pr { max_vertices: 10 },
    )
    .unwrap(),
    TetraTree::build(
      grid_mesh(3),
      Subdivision::Kd,
      Criterion::Pm {
        max_vertices: 12,
        max_tetrahedra: 60,
      },
    )
    .unwrap(),
    TetraTree::build(
      grid_mesh(3),
      Subdivision::Octree,
      Criterion::Pmr { max_tetrahedra: 40 },
    )
    .unwrap(),
  ];
  // Reindex all but the last, which keeps exercising the plain state.
  let last = trees.len() - 1;
  for tree in &mut trees[..last] {
    tree.reindex().unwrap();
  }
  trees
}

fn random_point(rng: &mut StdRng) -> DVec3 {
  DVec3::new(rng.gen(), rng.gen(), rng.gen())
}

fn random_box(rng: &mut StdRng) -> Aabb3 {
  let min = random_point(rng) * 0.8;
  let extent = DVec3::new(rng.gen(), rng.gen(), rng.gen()) * 0.4 + DVec3::splat(0.01);
  Aabb3::new(min, min + extent)
}

#[test]
fn random_box_queries_agree_with_brute_force() {
  let mut rng = StdRng::seed_from_u64(7);
  for tree in trees() {
    let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
    for _ in 0..24 {
      let b = random_box(&mut rng);
      let expected: BTreeSet<i32> = tree
        .mesh()
        .tetrahedron_ids()
        .filter(|&t| wrapper::tetra_in_box_query(t, &b, tree.mesh()))
        .collect();
      stats.reset();
      query::box_query(&tree, &b, &mut stats);
      let got: BTreeSet<i32> = stats.results.iter().copied().collect();
      assert_eq!(got.len(), stats.results.len(), "duplicate ids for {b:?}");
      assert_eq!(got, expected, "box {b:?}");
    }
  }
}

#[test]
fn random_point_locations_agree_with_brute_force() {
  let mut rng = StdRng::seed_from_u64(11);
  for tree in trees() {
    let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
    for _ in 0..48 {
      let p = random_point(&mut rng);
      let covering: BTreeSet<i32> = tree
        .mesh()
        .tetrahedron_ids()
        .filter(|&t| wrapper::point_in_tetrahedron(t, p, tree.mesh()))
        .collect();
      stats.reset();
      match query::locate_point(&tree, p, &mut stats) {
        Some(t) => assert!(covering.contains(&t), "point {p:?} got {t}"),
        None => assert!(covering.is_empty(), "point {p:?} missed {covering:?}"),
      }
    }
  }
}

#[test]
fn random_line_queries_agree_with_brute_force() {
  let mut rng = StdRng::seed_from_u64(13);
  for mut tree in trees() {
    tree.order_faces();
    let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
    for _ in 0..24 {
      let a = random_point(&mut rng) * 1.4 - DVec3::splat(0.2);
      let b = random_point(&mut rng) * 1.4 - DVec3::splat(0.2);
      let expected: BTreeSet<i32> = tree
        .mesh()
        .tetrahedron_ids()
        .filter(|&t| wrapper::segment_in_tetrahedron(a, b, t, tree.mesh()))
        .collect();
      stats.reset();
      query::line_query(&tree, a, b, &mut stats).unwrap();
      let got: BTreeSet<i32> = stats.results.iter().copied().collect();
      assert_eq!(got, expected, "segment {a:?} -> {b:?}");
    }
  }
}

#[test]
fn random_windows_keep_the_vt_partition() {
  let mut rng = StdRng::seed_from_u64(17);
  for tree in trees() {
    for _ in 0..16 {
      let b = random_box(&mut rng);
      let vt = query::windowed_vt(&tree, &b);
      let expected: BTreeSet<i32> = tree
        .mesh()
        .vertex_ids()
        .filter(|&v| b.contains_closed(tree.mesh().vertex(v).pos))
        .collect();
      assert_eq!(
        vt.keys().copied().collect::<BTreeSet<i32>>(),
        expected,
        "window {b:?}"
      );
      for (v, list) in vt {
        let star: BTreeSet<i32> = tree
          .mesh()
          .tetrahedron_ids()
          .filter(|&t| tree.mesh().tetrahedron(t).has_vertex(v))
          .collect();
        assert_eq!(list.iter().copied().collect::<BTreeSet<i32>>(), star);
        assert_eq!(list.len(), star.len(), "vertex {v} listed a tetra twice");
      }
    }
  }
}

#[test]
fn random_windows_keep_windowed_tt_consistent_with_batched() {
  let mut rng = StdRng::seed_from_u64(19);
  for tree in trees() {
    let batched = query::batched_tt(&tree);
    for _ in 0..16 {
      let b = random_box(&mut rng);
      let windowed = query::windowed_tt(&tree, &b);
      for (t, adj) in windowed {
        let global = batched.adjacency[(t - 1) as usize];
        for pos in 0..4 {
          if adj[pos] != -1 {
            assert_eq!(adj[pos], global[pos], "tetra {t} face {pos}");
          }
        }
      }
    }
  }
}
