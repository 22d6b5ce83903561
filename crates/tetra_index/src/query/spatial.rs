//! Spatial queries: point location, box intersection and segment
//! intersection over the tree.
//!
//! All three share the same skeleton: descend pruning by the recomputed node
//! domain, then scan leaf sequences entry by entry. Run entries are
//! pre-filtered through their bounding box so that whole runs are accepted or
//! skipped without per-tetrahedron geometry; singletons always pay the
//! geometric test.

use glam::DVec3;

use crate::error::Error;
use crate::geometry::wrapper;
use crate::mesh::{Aabb3, Mesh};
use crate::tree::node::{run_bounding_box, Node};
use crate::tree::runs::RunEntry;
use crate::tree::{Subdivision, TetraTree};

use super::stats::QueryStats;

/// Locate the first tetrahedron containing `p` (closed test).
///
/// Descends into the unique child owning the point under the half-open
/// convention; any tetrahedron of the mesh containing `p` on its boundary is
/// an acceptable answer.
pub fn locate_point(tree: &TetraTree, p: DVec3, stats: &mut QueryStats) -> Option<i32> {
  point_query_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    p,
    tree.mesh(),
    tree.subdivision(),
    stats,
  )
}

fn point_query_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  p: DVec3,
  mesh: &Mesh,
  subdivision: Subdivision,
  stats: &mut QueryStats,
) -> Option<i32> {
  stats.nodes_visited += 1;
  if n.is_leaf() {
    stats.leaves_visited += 1;
    return point_query_leaf(n, p, mesh, stats);
  }
  let domain_max = mesh.domain().max;
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    if child_dom.contains(p, domain_max) {
      return point_query_node(child, &child_dom, level + 1, p, mesh, subdivision, stats);
    }
  }
  None
}

fn point_query_leaf(n: &Node, p: DVec3, mesh: &Mesh, stats: &mut QueryStats) -> Option<i32> {
  let domain_max = mesh.domain().max;
  for entry in n.tetrahedra().entries() {
    match entry {
      RunEntry::Run { first, last } => {
        let bb = run_bounding_box(first, last, mesh);
        if !bb.contains(p, domain_max) {
          continue;
        }
        for t in first..=last {
          if point_test(t, p, mesh, stats) {
            return Some(t);
          }
        }
      }
      RunEntry::Single(t) => {
        if point_test(t, p, mesh, stats) {
          return Some(t);
        }
      }
    }
  }
  None
}

fn point_test(t: i32, p: DVec3, mesh: &Mesh, stats: &mut QueryStats) -> bool {
  stats.geometric_tests += 1;
  if wrapper::point_in_tetrahedron(t, p, mesh) {
    stats.results.push(t);
    true
  } else {
    false
  }
}

/// Collect every tetrahedron properly intersecting the query box `b` into
/// `stats.results`, deduplicated across leaves.
pub fn box_query(tree: &TetraTree, b: &Aabb3, stats: &mut QueryStats) {
  box_query_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    b,
    tree.mesh(),
    tree.subdivision(),
    stats,
  );
}

fn box_query_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  b: &Aabb3,
  mesh: &Mesh,
  subdivision: Subdivision,
  stats: &mut QueryStats,
) {
  stats.nodes_visited += 1;
  if !dom.intersects(b) {
    return;
  }
  if n.is_leaf() {
    stats.leaves_visited += 1;
    if b.encloses(dom) {
      stats.leaf_contained += 1;
      accept_all(n, stats);
    } else {
      box_query_leaf(n, b, mesh, stats);
    }
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    box_query_node(child, &child_dom, level + 1, b, mesh, subdivision, stats);
  }
}

/// Accept the whole leaf without geometric tests: the query box contains the
/// leaf domain, so every indexed tetrahedron intersects it.
fn accept_all(n: &Node, stats: &mut QueryStats) {
  for t in n.tetrahedra().iter() {
    if stats.first_access(t) {
      stats.results.push(t);
      stats.avoided_tests += 1;
    }
  }
}

fn box_query_leaf(n: &Node, b: &Aabb3, mesh: &Mesh, stats: &mut QueryStats) {
  for entry in n.tetrahedra().entries() {
    match entry {
      RunEntry::Run { first, last } => {
        let bb = run_bounding_box(first, last, mesh);
        if b.encloses(&bb) {
          stats.run_bb_contained += 1;
          for t in first..=last {
            if stats.first_access(t) {
              stats.results.push(t);
              stats.avoided_tests += 1;
            }
          }
        } else if b.intersects(&bb) {
          stats.run_bb_intersected += 1;
          for t in first..=last {
            if !stats.was_seen(t) {
              stats.run_bb_tests += 1;
            }
            box_test(t, b, mesh, stats);
          }
        } else {
          stats.run_bb_disjoint += 1;
          for t in first..=last {
            stats.mark_skipped(t);
          }
        }
      }
      RunEntry::Single(t) => box_test(t, b, mesh, stats),
    }
  }
}

fn box_test(t: i32, b: &Aabb3, mesh: &Mesh, stats: &mut QueryStats) {
  if stats.first_access(t) {
    stats.geometric_tests += 1;
    if wrapper::tetra_in_box_query(t, b, mesh) {
      stats.results.push(t);
    }
  }
}

/// Collect every tetrahedron intersected by the segment `a -> b` into
/// `stats.results`, sorted and deduplicated.
///
/// Requires the one-shot face-orientation pass to have run on the tree.
pub fn line_query(
  tree: &TetraTree,
  a: DVec3,
  b: DVec3,
  stats: &mut QueryStats,
) -> Result<(), Error> {
  if !tree.faces_ordered() {
    return Err(Error::Precondition(
      "line queries need order_faces() to have run on the tree",
    ));
  }
  line_query_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    a,
    b,
    tree.mesh(),
    tree.subdivision(),
    stats,
  );
  stats.results.sort_unstable();
  stats.results.dedup();
  Ok(())
}

#[allow(clippy::too_many_arguments)]
fn line_query_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  a: DVec3,
  b: DVec3,
  mesh: &Mesh,
  subdivision: Subdivision,
  stats: &mut QueryStats,
) {
  stats.nodes_visited += 1;
  if !wrapper::segment_in_domain(a, b, dom) {
    return;
  }
  if n.is_leaf() {
    stats.leaves_visited += 1;
    line_query_leaf(n, a, b, mesh, stats);
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    line_query_node(child, &child_dom, level + 1, a, b, mesh, subdivision, stats);
  }
}

fn line_query_leaf(n: &Node, a: DVec3, b: DVec3, mesh: &Mesh, stats: &mut QueryStats) {
  for entry in n.tetrahedra().entries() {
    match entry {
      RunEntry::Run { first, last } => {
        let bb = run_bounding_box(first, last, mesh);
        if wrapper::segment_in_bounding_box(a, b, &bb) {
          for t in first..=last {
            line_test(t, a, b, mesh, stats);
          }
        } else {
          for t in first..=last {
            stats.mark_skipped(t);
          }
        }
      }
      RunEntry::Single(t) => line_test(t, a, b, mesh, stats),
    }
  }
}

fn line_test(t: i32, a: DVec3, b: DVec3, mesh: &Mesh, stats: &mut QueryStats) {
  if stats.first_access(t) {
    stats.geometric_tests += 1;
    if wrapper::segment_in_tetrahedron(a, b, t, mesh) {
      stats.results.push(t);
    }
  }
}

#[cfg(test)]
#[path = "spatial_test.rs"]
mod spatial_test;
