//! Per-query statistics and their batch aggregation.
//!
//! Every query carries a [`QueryStats`]: the result vector, the seen bitset
//! that deduplicates tetrahedra indexed by several leaves, a per-tetrahedron
//! access counter and the counters describing how effective the run
//! bounding-box pruning was. A [`QuerySummary`] folds the stats of a query
//! batch into min/avg/max triples for reporting.

use fixedbitset::FixedBitSet;

/// Statistics and working state of a single query.
#[derive(Clone, Debug)]
pub struct QueryStats {
  /// Tree nodes visited.
  pub nodes_visited: usize,
  /// Leaves visited.
  pub leaves_visited: usize,
  /// Geometric tests executed.
  pub geometric_tests: usize,
  /// Geometric tests avoided thanks to run bounding boxes or full leaf
  /// containment.
  pub avoided_tests: usize,
  /// Leaves entirely contained by the query box.
  pub leaf_contained: usize,
  /// Runs whose bounding box was entirely contained by the query box.
  pub run_bb_contained: usize,
  /// Runs whose bounding box properly intersected the query box.
  pub run_bb_intersected: usize,
  /// Runs whose bounding box was disjoint from the query box.
  pub run_bb_disjoint: usize,
  /// Geometric tests spent on the intersecting-bounding-box case.
  pub run_bb_tests: usize,
  /// Result ids, deduplicated; order unspecified.
  pub results: Vec<i32>,
  /// Per-tetrahedron access counts (index `t - 1`).
  pub accesses: Vec<u32>,
  seen: FixedBitSet,
  skipped: FixedBitSet,
}

impl QueryStats {
  /// Working state for a mesh with `num_tetrahedra` tetrahedra.
  pub fn new(num_tetrahedra: usize) -> Self {
    Self {
      nodes_visited: 0,
      leaves_visited: 0,
      geometric_tests: 0,
      avoided_tests: 0,
      leaf_contained: 0,
      run_bb_contained: 0,
      run_bb_intersected: 0,
      run_bb_disjoint: 0,
      run_bb_tests: 0,
      results: Vec::new(),
      accesses: vec![0; num_tetrahedra],
      seen: FixedBitSet::with_capacity(num_tetrahedra + 1),
      skipped: FixedBitSet::with_capacity(num_tetrahedra + 1),
    }
  }

  /// Clear everything for the next query.
  pub fn reset(&mut self) {
    self.nodes_visited = 0;
    self.leaves_visited = 0;
    self.geometric_tests = 0;
    self.avoided_tests = 0;
    self.leaf_contained = 0;
    self.run_bb_contained = 0;
    self.run_bb_intersected = 0;
    self.run_bb_disjoint = 0;
    self.run_bb_tests = 0;
    self.results.clear();
    self.accesses.fill(0);
    self.seen.clear();
    self.skipped.clear();
  }

  /// Record an access to `t`; returns true the first time.
  #[inline]
  pub(crate) fn first_access(&mut self, t: i32) -> bool {
    self.accesses[(t - 1) as usize] += 1;
    !self.seen.put(t as usize)
  }

  #[inline]
  pub(crate) fn was_seen(&self, t: i32) -> bool {
    self.seen.contains(t as usize)
  }

  /// Count `t` as skipped by a disjoint run bounding box, once.
  #[inline]
  pub(crate) fn mark_skipped(&mut self, t: i32) {
    if !self.seen.contains(t as usize) && !self.skipped.put(t as usize) {
      self.avoided_tests += 1;
    }
  }
}

/// One min/avg/max accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinAvgMax {
  pub min: usize,
  pub max: usize,
  sum: usize,
  samples: usize,
}

impl MinAvgMax {
  pub fn record(&mut self, value: usize) {
    if self.samples == 0 || value < self.min {
      self.min = value;
    }
    self.max = self.max.max(value);
    self.sum += value;
    self.samples += 1;
  }

  pub fn avg(&self) -> f64 {
    if self.samples == 0 {
      0.0
    } else {
      self.sum as f64 / self.samples as f64
    }
  }
}

/// Aggregate statistics over a batch of queries.
#[derive(Clone, Debug, Default)]
pub struct QuerySummary {
  pub nodes: MinAvgMax,
  pub leaves: MinAvgMax,
  pub results: MinAvgMax,
  pub geometric_tests: MinAvgMax,
  pub avoided_tests: MinAvgMax,
  pub leaf_contained: MinAvgMax,
  pub run_bb_contained: MinAvgMax,
  pub run_bb_intersected: MinAvgMax,
  pub run_bb_disjoint: MinAvgMax,
  /// Tetrahedra accessed exactly once during a query.
  pub unique_accesses: MinAvgMax,
  /// Total accesses to tetrahedra touched more than once (leaf overlap).
  pub multiple_accesses: MinAvgMax,
  /// Queries with a non-empty result.
  pub hits: usize,
  /// Queries recorded.
  pub queries: usize,
}

impl QuerySummary {
  /// Fold one finished query into the summary; returns whether it hit.
  pub fn record(&mut self, stats: &QueryStats) -> bool {
    self.nodes.record(stats.nodes_visited);
    self.leaves.record(stats.leaves_visited);
    self.results.record(stats.results.len());
    self.geometric_tests.record(stats.geometric_tests);
    self.avoided_tests.record(stats.avoided_tests);
    self.leaf_contained.record(stats.leaf_contained);
    self.run_bb_contained.record(stats.run_bb_contained);
    self.run_bb_intersected.record(stats.run_bb_intersected);
    self.run_bb_disjoint.record(stats.run_bb_disjoint);

    let mut unique = 0usize;
    let mut multiple = 0usize;
    for &count in &stats.accesses {
      match count {
        0 => {}
        1 => unique += 1,
        n => multiple += n as usize,
      }
    }
    self.unique_accesses.record(unique);
    if multiple > 0 {
      self.multiple_accesses.record(multiple);
    }

    self.queries += 1;
    let hit = !stats.results.is_empty();
    if hit {
      self.hits += 1;
    }
    hit
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn first_access_deduplicates() {
    let mut s = QueryStats::new(4);
    assert!(s.first_access(3));
    assert!(!s.first_access(3));
    assert_eq!(s.accesses[2], 2);
    assert!(s.was_seen(3));
    assert!(!s.was_seen(1));
  }

  #[test]
  fn skipped_marks_count_once_and_never_after_seen() {
    let mut s = QueryStats::new(4);
    s.mark_skipped(2);
    s.mark_skipped(2);
    assert_eq!(s.avoided_tests, 1);
    let _ = s.first_access(3);
    s.mark_skipped(3);
    assert_eq!(s.avoided_tests, 1);
  }

  #[test]
  fn summary_tracks_min_avg_max() {
    let mut summary = QuerySummary::default();
    let mut s = QueryStats::new(2);
    s.nodes_visited = 4;
    s.results.push(1);
    assert!(summary.record(&s));
    s.reset();
    s.nodes_visited = 10;
    assert!(!summary.record(&s));
    assert_eq!(summary.nodes.min, 4);
    assert_eq!(summary.nodes.max, 10);
    assert!((summary.nodes.avg() - 7.0).abs() < 1e-12);
    assert_eq!(summary.hits, 1);
    assert_eq!(summary.queries, 2);
  }
}
