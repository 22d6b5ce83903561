//! Spatial reindexing: renumber mesh vertices and tetrahedra to match the
//! tree-traversal order, then compress every leaf sequence into runs.
//!
//! Two passes. The vertex pass walks the tree in fixed child order and hands
//! out fresh ids; V leaves then collapse their vertex list to a two-int
//! range (interior nodes get the aggregated range of their subtree). The
//! tetra pass groups tetrahedra by the set of vertex-owning leaves indexing
//! them, so that tetrahedra shared by the same leaves end up consecutive and
//! fold into runs.
//!
//! Ids are 1-based; the counter never hands out the 0 sentinel.

use std::collections::{BTreeMap, BTreeSet};

use smallvec::SmallVec;

use crate::error::Error;
use crate::mesh::{Aabb3, Mesh};

use super::node::Node;
use super::runs::RunVec;
use super::subdivision::Subdivision;
use super::TetraTree;

/// A vertex-owning leaf, keyed by its renumbered vertex range.
type LeafKey = (i32, i32);

/// Leaves a tetrahedron belongs to; nearly always a handful.
type LeafSet = SmallVec<[LeafKey; 4]>;

pub(crate) fn reindex(tree: &mut TetraTree) -> Result<(), Error> {
  let subdivision = tree.subdivision;
  let criterion = tree.criterion;
  let domain = *tree.mesh.domain();

  // Pass 1: vertices.
  let mut new_ids = vec![0i32; tree.mesh.num_vertices()];
  let mut counter = 1i32;
  if criterion.uses_vertex_lists() {
    renumber_vertices_v(&mut tree.root, &mut new_ids, &mut counter);
  } else {
    renumber_vertices_t(
      &tree.root,
      &domain,
      0,
      subdivision,
      &tree.mesh,
      &mut new_ids,
      &mut counter,
    );
  }
  if let Some(missing) = new_ids.iter().position(|&id| id == 0) {
    return Err(Error::InvalidMesh(format!(
      "isolated vertex {} is indexed by no leaf",
      missing + 1
    )));
  }
  tree.mesh.permute_vertices(&new_ids);

  // Pass 2: tetrahedra.
  let mut assoc: Vec<LeafSet> = vec![LeafSet::new(); tree.mesh.num_tetrahedra()];
  if criterion.uses_vertex_lists() {
    collect_leaf_sets_v(&tree.root, &tree.mesh, &mut assoc);
  } else {
    collect_leaf_sets_t(&tree.root, &domain, 0, subdivision, &tree.mesh, &mut assoc);
  }

  let mut groups: BTreeMap<LeafSet, Vec<i32>> = BTreeMap::new();
  for (i, leaves) in assoc.into_iter().enumerate() {
    groups.entry(leaves).or_default().push(i as i32 + 1);
  }
  let mut new_ids = vec![0i32; tree.mesh.num_tetrahedra()];
  let mut counter = 1i32;
  for t_ids in groups.into_values() {
    for t in t_ids {
      new_ids[(t - 1) as usize] = counter;
      counter += 1;
    }
  }

  remap_and_compress_leaves(&mut tree.root, &new_ids);
  tree.mesh.permute_tetrahedra(&new_ids);
  Ok(())
}

/// Vertex renumbering for trees with explicit vertex lists: assign ids in
/// stored leaf order, then collapse each list to its range. Interior nodes
/// record the aggregated range of their subtree.
fn renumber_vertices_v(n: &mut Node, new_ids: &mut [i32], counter: &mut i32) {
  if n.is_leaf() {
    if n.vertices().count() > 0 {
      let start = *counter;
      for v in n.vertices().iter() {
        new_ids[(v - 1) as usize] = *counter;
        *counter += 1;
      }
      let end = *counter;
      n.set_vertex_range(start, end);
    }
    return;
  }
  let start = *counter;
  for child in n.children_mut() {
    renumber_vertices_v(child, new_ids, counter);
  }
  let end = *counter;
  n.set_vertex_range(start, end);
}

/// Vertex renumbering for tetra-only trees: each leaf owns the vertices of
/// its tetrahedra that its own box contains, assigned in ascending id order.
fn renumber_vertices_t(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  subdivision: Subdivision,
  mesh: &Mesh,
  new_ids: &mut [i32],
  counter: &mut i32,
) {
  if n.is_leaf() {
    let domain_max = mesh.domain().max;
    let mut contained: BTreeSet<i32> = BTreeSet::new();
    for t in n.tetrahedra().iter() {
      let tet = mesh.tetrahedron(t);
      for pos in 0..4 {
        let v = tet.tv(pos);
        if dom.contains(mesh.vertex(v).pos, domain_max) {
          contained.insert(v);
        }
      }
    }
    for v in contained {
      new_ids[(v - 1) as usize] = *counter;
      *counter += 1;
    }
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    renumber_vertices_t(child, &child_dom, level + 1, subdivision, mesh, new_ids, counter);
  }
}

/// Record, per tetrahedron, the vertex-owning leaves that index it (V
/// flavor: range tests on the renumbered ranges).
fn collect_leaf_sets_v(n: &Node, mesh: &Mesh, assoc: &mut [LeafSet]) {
  if n.is_leaf() {
    let Some(key) = n.vertex_range() else {
      return;
    };
    for t in n.tetrahedra().iter() {
      if n.indexes_tetra_vertices(mesh.tetrahedron(t)) {
        assoc[(t - 1) as usize].push(key);
      }
    }
    return;
  }
  for child in n.children() {
    collect_leaf_sets_v(child, mesh, assoc);
  }
}

/// Leaf-set extraction for tetra-only trees: leaf keys come from the
/// renumbered vertex range contained in the leaf box.
fn collect_leaf_sets_t(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  subdivision: Subdivision,
  mesh: &Mesh,
  assoc: &mut [LeafSet],
) {
  if n.is_leaf() {
    let Some(key) = n.vertex_range_in_domain(dom, mesh) else {
      return;
    };
    for t in n.tetrahedra().iter() {
      if n.indexes_tetra_vertices_dom(mesh.tetrahedron(t), dom, mesh) {
        assoc[(t - 1) as usize].push(key);
      }
    }
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    collect_leaf_sets_t(child, &child_dom, level + 1, subdivision, mesh, assoc);
  }
}

/// Rewrite every leaf's tetra sequence through the renumbering map and
/// compress it: ascending ids, maximal ranges of length >= 3 folded.
fn remap_and_compress_leaves(n: &mut Node, new_ids: &[i32]) {
  if n.is_leaf() {
    if n.tetrahedra().is_empty() {
      return;
    }
    let mut ids: Vec<i32> = n
      .tetrahedra()
      .iter()
      .map(|t| new_ids[(t - 1) as usize])
      .collect();
    ids.sort_unstable();
    n.set_tetrahedra(RunVec::from_sorted_ids(&ids));
    return;
  }
  for child in n.children_mut() {
    remap_and_compress_leaves(child, new_ids);
  }
}

#[cfg(test)]
#[path = "reindexer_test.rs"]
mod reindexer_test;
