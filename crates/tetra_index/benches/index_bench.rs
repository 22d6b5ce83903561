//! Build and query benchmarks on a synthetic grid mesh.

use criterion::{black_box, criterion_group, criterion_main, Criterion as Bench};
use glam::DVec3;

use tetra_index::mesh::{Mesh, Tetrahedron, Vertex};
use tetra_index::query::{self, QueryStats};
use tetra_index::{Aabb3, Criterion, Subdivision, TetraTree};

/// Regular `n`^3-cell grid over the unit cube, each cell split into the six
/// path tetrahedra.
fn grid_mesh(n: usize) -> Mesh {
  let mut mesh = Mesh::new();
  let step = 1.0 / n as f64;
  for k in 0..=n {
    for j in 0..=n {
      for i in 0..=n {
        let p = DVec3::new(i as f64, j as f64, k as f64) * step;
        mesh.push_vertex(Vertex::new(p.x, p.y, p.z, p.length()));
      }
    }
  }
  let idx = |i: usize, j: usize, k: usize| (1 + i + j * (n + 1) + k * (n + 1) * (n + 1)) as i32;
  const AXIS_ORDERS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
  ];
  for k in 0..n {
    for j in 0..n {
      for i in 0..n {
        for order in AXIS_ORDERS {
          let mut at = [i, j, k];
          let origin = idx(at[0], at[1], at[2]);
          at[order[0]] += 1;
          let second = idx(at[0], at[1], at[2]);
          at[order[1]] += 1;
          let third = idx(at[0], at[1], at[2]);
          let opposite = idx(i + 1, j + 1, k + 1);
          mesh.push_tetrahedron(Tetrahedron::new(origin, second, third, opposite));
        }
      }
    }
  }
  mesh
}

fn build_tree(n: usize) -> TetraTree {
  let mut tree = TetraTree::build(
    grid_mesh(n),
    Subdivision::Octree,
    Criterion::Pr { max_vertices: 20 },
  )
  .unwrap();
  tree.reindex().unwrap();
  tree
}

fn bench_build(c: &mut Bench) {
  c.bench_function("build_pr_octree_6", |b| {
    b.iter(|| {
      TetraTree::build(
        black_box(grid_mesh(6)),
        Subdivision::Octree,
        Criterion::Pr { max_vertices: 20 },
      )
      .unwrap()
    })
  });
}

fn bench_box_query(c: &mut Bench) {
  let tree = build_tree(6);
  let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
  let query_box = Aabb3::new(DVec3::splat(0.3), DVec3::splat(0.62));
  c.bench_function("box_query_grid_6", |b| {
    b.iter(|| {
      stats.reset();
      query::box_query(&tree, black_box(&query_box), &mut stats);
      stats.results.len()
    })
  });
}

fn bench_point_query(c: &mut Bench) {
  let tree = build_tree(6);
  let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
  c.bench_function("point_query_grid_6", |b| {
    b.iter(|| {
      stats.reset();
      query::locate_point(&tree, black_box(DVec3::new(0.41, 0.37, 0.53)), &mut stats)
    })
  });
}

criterion_group!(benches, bench_build, bench_box_query, bench_point_query);
criterion_main!(benches);
