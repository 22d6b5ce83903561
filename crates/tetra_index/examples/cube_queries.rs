//! End-to-end tour of the index on a tiny mesh: build, reindex, and run one
//! query of each family.
//!
//! Run with `cargo run --example cube_queries`.

use glam::DVec3;

use tetra_index::mesh::{Mesh, Tetrahedron, Vertex};
use tetra_index::query::{self, QueryStats};
use tetra_index::{index_stats, Aabb3, Criterion, Subdivision, TetraTree};

/// Unit cube: 8 corners plus a centre vertex, every boundary-face triangle
/// joined to the centre.
fn cube_mesh() -> Mesh {
  let mut mesh = Mesh::new();
  for (x, y, z) in [
    (0.0, 0.0, 0.0),
    (1.0, 0.0, 0.0),
    (0.0, 1.0, 0.0),
    (1.0, 1.0, 0.0),
    (0.0, 0.0, 1.0),
    (1.0, 0.0, 1.0),
    (0.0, 1.0, 1.0),
    (1.0, 1.0, 1.0),
    (0.5, 0.5, 0.5),
  ] {
    mesh.push_vertex(Vertex::new(x, y, z, x + y + z));
  }
  for [a, b, c] in [
    [1, 2, 4],
    [1, 4, 3],
    [5, 6, 8],
    [5, 8, 7],
    [1, 2, 6],
    [1, 6, 5],
    [3, 4, 8],
    [3, 8, 7],
    [1, 3, 7],
    [1, 7, 5],
    [2, 4, 8],
    [2, 8, 6],
  ] {
    mesh.push_tetrahedron(Tetrahedron::new(a, b, c, 9));
  }
  mesh
}

fn main() -> Result<(), tetra_index::Error> {
  let mut tree = TetraTree::build(
    cube_mesh(),
    Subdivision::Octree,
    Criterion::Pr { max_vertices: 4 },
  )?;
  tree.reindex()?;
  println!("{}", index_stats(&tree));

  let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
  if let Some(t) = query::locate_point(&tree, DVec3::new(0.2, 0.3, 0.4), &mut stats) {
    println!("point (0.2, 0.3, 0.4) lies in tetrahedron {t}");
  }

  stats.reset();
  let b = Aabb3::new(DVec3::splat(0.25), DVec3::splat(0.75));
  query::box_query(&tree, &b, &mut stats);
  println!(
    "box query found {} tetrahedra ({} geometric tests, {} avoided)",
    stats.results.len(),
    stats.geometric_tests,
    stats.avoided_tests
  );

  tree.order_faces();
  stats.reset();
  query::line_query(
    &tree,
    DVec3::new(-0.5, 0.5, 0.5),
    DVec3::new(1.5, 0.5, 0.5),
    &mut stats,
  )?;
  println!("line query pierced {} tetrahedra", stats.results.len());

  query::compute_borders(&mut tree);
  let dist = query::windowed_distortion(&tree, tree.mesh().domain())?;
  let centre = dist.values().fold(0.0f64, |acc, d| acc.max(d.abs()));
  println!("largest distortion magnitude: {centre:.6}");

  let tt = query::batched_tt(&tree);
  let boundary = tt
    .adjacency
    .iter()
    .flat_map(|adj| adj.iter())
    .filter(|&&n| n == -1)
    .count();
  println!("batched TT: {boundary} boundary faces");
  Ok(())
}
