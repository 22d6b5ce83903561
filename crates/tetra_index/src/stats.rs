//! Index statistics: a simulated visit of the tree summarising its shape and
//! how the mesh entities distribute over the leaves.

use std::fmt;

use crate::mesh::{Aabb3, Mesh};
use crate::query::MinAvgMax;
use crate::tree::node::Node;
use crate::tree::{Subdivision, TetraTree};

/// Statistics of a built (possibly reindexed) index.
#[derive(Clone, Debug, Default)]
pub struct IndexStats {
  /// Total tree nodes.
  pub nodes: usize,
  /// Leaves indexing at least one tetrahedron.
  pub full_leaves: usize,
  /// Leaves indexing nothing.
  pub empty_leaves: usize,
  /// Leaf depth distribution.
  pub depth: MinAvgMax,
  /// Vertices per full leaf (V-flavor trees only).
  pub vertices_per_leaf: MinAvgMax,
  /// Tetrahedra per full leaf whose four vertices are owned by the leaf.
  pub completely_indexed: MinAvgMax,
  /// Tetrahedra per full leaf with some but not all vertices owned.
  pub partially_indexed: MinAvgMax,
  /// Tetrahedra per full leaf crossing it without owning a vertex there.
  pub overlapping: MinAvgMax,
  /// Leaves per tetrahedron.
  pub leaves_per_tetra: MinAvgMax,
  /// Average leaves per tetrahedron over the duplicated tetrahedra only
  /// (those indexed by more than one leaf).
  pub weighted_leaves_per_tetra: f64,
  /// Tetrahedra indexed by exactly 1, 2, 3, 4 and more than 4 leaves.
  pub tetra_in_leaves: [usize; 5],
  /// Sum of the encoded leaf-sequence lengths.
  pub encoded_length: usize,
  /// Sum of the decoded (real) leaf-sequence lengths.
  pub decoded_length: usize,
}

/// Compute the statistics of `tree`.
pub fn index_stats(tree: &TetraTree) -> IndexStats {
  let mut stats = IndexStats::default();
  let mut leaves_for_tetra = vec![0usize; tree.mesh().num_tetrahedra()];
  let by_range = tree.criterion().uses_vertex_lists() && tree.is_reindexed();
  visit(
    tree.root(),
    tree.mesh().domain(),
    0,
    tree.mesh(),
    tree.subdivision(),
    tree.criterion().uses_vertex_lists(),
    by_range,
    &mut stats,
    &mut leaves_for_tetra,
  );
  let mut duplicated = 0usize;
  let mut duplicated_leaves = 0usize;
  for &count in &leaves_for_tetra {
    stats.leaves_per_tetra.record(count);
    let bucket = count.clamp(1, 5) - 1;
    stats.tetra_in_leaves[bucket] += 1;
    if count > 1 {
      duplicated += 1;
      duplicated_leaves += count;
    }
  }
  if duplicated > 0 {
    stats.weighted_leaves_per_tetra = duplicated_leaves as f64 / duplicated as f64;
  }
  stats
}

#[allow(clippy::too_many_arguments)]
fn visit(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  mesh: &Mesh,
  subdivision: Subdivision,
  has_vertex_lists: bool,
  by_range: bool,
  stats: &mut IndexStats,
  leaves_for_tetra: &mut [usize],
) {
  stats.nodes += 1;
  if !n.is_leaf() {
    for (i, child) in n.children().iter().enumerate() {
      let child_dom = subdivision.child_domain(dom, level, i);
      visit(
        child,
        &child_dom,
        level + 1,
        mesh,
        subdivision,
        has_vertex_lists,
        by_range,
        stats,
        leaves_for_tetra,
      );
    }
    return;
  }

  stats.depth.record(level);
  stats.encoded_length += n.tetrahedra().raw_len();
  stats.decoded_length += n.tetrahedra().count();

  let mut completely = 0usize;
  let mut partially = 0usize;
  let mut overlapping = 0usize;
  for t in n.tetrahedra().iter() {
    let tet = mesh.tetrahedron(t);
    let (all, any) = if by_range {
      (
        n.completely_indexes_tetra_vertices(tet),
        n.indexes_tetra_vertices(tet),
      )
    } else {
      (
        n.completely_indexes_tetra_vertices_dom(tet, dom, mesh),
        n.indexes_tetra_vertices_dom(tet, dom, mesh),
      )
    };
    if all {
      completely += 1;
    } else if any {
      partially += 1;
    } else {
      overlapping += 1;
    }
    leaves_for_tetra[(t - 1) as usize] += 1;
  }

  if completely + partially + overlapping > 0 {
    stats.full_leaves += 1;
    if has_vertex_lists {
      stats.vertices_per_leaf.record(n.vertices().count());
    }
    stats.completely_indexed.record(completely);
    stats.partially_indexed.record(partially);
    stats.overlapping.record(overlapping);
  } else {
    stats.empty_leaves += 1;
  }
}

impl fmt::Display for IndexStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fn triple(f: &mut fmt::Formatter<'_>, name: &str, m: &MinAvgMax) -> fmt::Result {
      writeln!(f, "{name}: {} {:.3} {}", m.min, m.avg(), m.max)
    }
    writeln!(
      f,
      "nodes: {} (full leaves: {}, empty leaves: {})",
      self.nodes, self.full_leaves, self.empty_leaves
    )?;
    triple(f, "leaf_depth", &self.depth)?;
    triple(f, "vertices_per_full_leaf", &self.vertices_per_leaf)?;
    triple(f, "internal_tetra_per_leaf", &self.completely_indexed)?;
    triple(f, "partial_tetra_per_leaf", &self.partially_indexed)?;
    triple(f, "overlapping_tetra_per_leaf", &self.overlapping)?;
    triple(f, "leaves_per_tetra", &self.leaves_per_tetra)?;
    writeln!(f, "chi_star: {:.3}", self.weighted_leaves_per_tetra)?;
    writeln!(
      f,
      "tetra_in_1/2/3/4/more_leaves: {} {} {} {} {}",
      self.tetra_in_leaves[0],
      self.tetra_in_leaves[1],
      self.tetra_in_leaves[2],
      self.tetra_in_leaves[3],
      self.tetra_in_leaves[4]
    )?;
    writeln!(f, "t_list_length: {}", self.encoded_length)?;
    write!(f, "real_t_list_length: {}", self.decoded_length)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::cube_star_mesh;
  use crate::tree::Criterion;

  #[test]
  fn single_leaf_stats() {
    let tree = TetraTree::build(
      cube_star_mesh(),
      Subdivision::Octree,
      Criterion::Pr { max_vertices: 10 },
    )
    .unwrap();
    let s = index_stats(&tree);
    assert_eq!(s.nodes, 1);
    assert_eq!(s.full_leaves, 1);
    assert_eq!(s.empty_leaves, 0);
    assert_eq!(s.depth.max, 0);
    assert_eq!(s.vertices_per_leaf.max, 9);
    // Every tetrahedron is completely indexed by the only leaf.
    assert_eq!(s.completely_indexed.max, 12);
    assert_eq!(s.tetra_in_leaves[0], 12);
    assert_eq!(s.decoded_length, 12);
  }

  #[test]
  fn split_tree_counts_duplicated_tetrahedra() {
    let tree = TetraTree::build(
      cube_star_mesh(),
      Subdivision::Octree,
      Criterion::Pr { max_vertices: 4 },
    )
    .unwrap();
    let s = index_stats(&tree);
    assert_eq!(s.nodes, 9);
    assert_eq!(s.full_leaves + s.empty_leaves, 8);
    // Each tetrahedron spans several octants.
    assert!(s.leaves_per_tetra.max > 1);
    assert!(s.decoded_length > 12);
  }

  #[test]
  fn reindexed_stats_shrink_the_encoding() {
    let mut tree = TetraTree::build(
      cube_star_mesh(),
      Subdivision::Octree,
      Criterion::Pr { max_vertices: 1 },
    )
    .unwrap();
    let before = index_stats(&tree);
    tree.reindex().unwrap();
    let after = index_stats(&tree);
    assert_eq!(before.decoded_length, after.decoded_length);
    assert!(after.encoded_length <= before.encoded_length);
  }
}
