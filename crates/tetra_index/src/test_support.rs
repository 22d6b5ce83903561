//! Shared fixtures for the unit tests: small meshes with known geometry and
//! helpers to walk a finished tree.

use glam::DVec3;

use crate::mesh::{Aabb3, Mesh, Tetrahedron, Vertex};
use crate::tree::{Node, Subdivision, TetraTree};

/// Unit cube with its 8 corners, a centre vertex, and 12 tetrahedra joining
/// each boundary-face triangle to the centre.
///
/// Vertex ids: 1 (0,0,0), 2 (1,0,0), 3 (0,1,0), 4 (1,1,0), 5 (0,0,1),
/// 6 (1,0,1), 7 (0,1,1), 8 (1,1,1), 9 centre (0.5,0.5,0.5). Every
/// tetrahedron is incident to the centre.
pub fn cube_star_mesh() -> Mesh {
  let mut m = Mesh::new();
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
    m.push_vertex(Vertex::new(x, y, z, 0.0));
  }
  for [a, b, c] in [
    // z = 0 face
    [1, 2, 4],
    [1, 4, 3],
    // z = 1 face
    [5, 6, 8],
    [5, 8, 7],
    // y = 0 face
    [1, 2, 6],
    [1, 6, 5],
    // y = 1 face
    [3, 4, 8],
    [3, 8, 7],
    // x = 0 face
    [1, 3, 7],
    [1, 7, 5],
    // x = 1 face
    [2, 4, 8],
    [2, 8, 6],
  ] {
    m.push_tetrahedron(Tetrahedron::new(a, b, c, 9));
  }
  m
}

/// The tetrahedra of [`cube_star_mesh`] pierced through their interior by
/// the x-axis meridian segment at y = z = 0.5 (ids in build order).
pub fn meridian_tetrahedra() -> [i32; 4] {
  [9, 10, 11, 12]
}

/// Regular `n`^3-cell grid over the unit cube, each cell split into six
/// path tetrahedra; the field is the distance from the origin.
///
/// For `n = 4` this gives 125 vertices and 384 tetrahedra, enough to force
/// real hierarchies, multi-leaf tetrahedra and runs after reindexing.
pub fn grid_mesh(n: usize) -> Mesh {
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
          mesh.push_tetrahedron(Tetrahedron::new(
            origin,
            second,
            third,
            idx(i + 1, j + 1, k + 1),
          ));
        }
      }
    }
  }
  mesh
}

/// All leaves of the tree together with their recomputed domains, in
/// traversal order.
pub fn leaves_with_domains(tree: &TetraTree) -> Vec<(Aabb3, &Node)> {
  let mut out = Vec::new();
  walk(
    tree.root(),
    *tree.mesh().domain(),
    0,
    tree.subdivision(),
    &mut out,
  );
  out
}

fn walk<'a>(
  n: &'a Node,
  dom: Aabb3,
  level: usize,
  subdivision: Subdivision,
  out: &mut Vec<(Aabb3, &'a Node)>,
) {
  if n.is_leaf() {
    out.push((dom, n));
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(&dom, level, i);
    walk(child, child_dom, level + 1, subdivision, out);
  }
}

/// Signature of a tetrahedron independent of id renumbering: its four
/// vertex positions, sorted.
pub fn tetra_signature(t: i32, mesh: &Mesh) -> [[u64; 3]; 4] {
  let tet = mesh.tetrahedron(t);
  let mut sig = [[0u64; 3]; 4];
  for (pos, slot) in sig.iter_mut().enumerate() {
    let p = mesh.vertex(tet.tv(pos)).pos;
    *slot = key(p);
  }
  sig.sort_unstable();
  sig
}

fn key(p: DVec3) -> [u64; 3] {
  [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}
