//! Human-readable reporting of query-batch statistics.

use tetra_index::query::{MinAvgMax, QuerySummary};

fn triple(name: &str, m: &MinAvgMax) {
  eprintln!("  {name}: {} {:.3} {}", m.min, m.avg(), m.max);
}

/// Print the aggregate statistics of a query batch to stderr.
pub fn print_query_summary(summary: &QuerySummary) {
  eprintln!("== query stats ({} queries) ==", summary.queries);
  triple("nodes_visited", &summary.nodes);
  triple("leaves_visited", &summary.leaves);
  triple("results", &summary.results);
  triple("geometric_tests", &summary.geometric_tests);
  triple("avoided_geometric_tests", &summary.avoided_tests);
  triple("box_contains_leaf", &summary.leaf_contained);
  triple("box_contains_run_bb", &summary.run_bb_contained);
  triple("box_intersects_run_bb", &summary.run_bb_intersected);
  triple("box_disjoint_run_bb", &summary.run_bb_disjoint);
  if summary.multiple_accesses.max > 0 {
    triple("unique_tetra_accesses", &summary.unique_accesses);
    triple("multiple_tetra_accesses", &summary.multiple_accesses);
  }
  eprintln!("  hit_ratio: {}/{}", summary.hits, summary.queries);
}
