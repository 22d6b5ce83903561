//! Spatial subdivision strategies: how a node domain splits into child
//! domains.
//!
//! A strategy is a fixed arity plus a deterministic `child_domain` function;
//! node boxes are never stored, they are recomputed from the parent box, the
//! level and the child index during every descent.

use std::fmt;
use std::str::FromStr;

use glam::DVec3;

use crate::error::Error;
use crate::mesh::Aabb3;

/// Octant layout of the octree split. Each row selects, per axis, whether
/// the child takes the upper half. The ordering is observable: reindexing
/// follows child-traversal order, so run lengths depend on it.
const OCTANTS: [[bool; 3]; 8] = [
  [true, true, false],
  [true, false, false],
  [false, true, false],
  [false, false, false],
  [true, true, true],
  [true, false, true],
  [false, true, true],
  [false, false, true],
];

/// A subdivision strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subdivision {
  /// Regular octree: all three axes split at their midpoint, 8 children.
  Octree,
  /// KD split: axis `level % 3` splits at its midpoint, 2 children.
  Kd,
}

impl Subdivision {
  /// Number of children of every interior node.
  #[inline]
  pub fn arity(self) -> usize {
    match self {
      Subdivision::Octree => 8,
      Subdivision::Kd => 2,
    }
  }

  /// Domain of child `child` of a node with domain `parent` at `level`.
  pub fn child_domain(self, parent: &Aabb3, level: usize, child: usize) -> Aabb3 {
    debug_assert!(child < self.arity());
    let mid = parent.center();
    match self {
      Subdivision::Octree => {
        let upper = OCTANTS[child];
        let mut min = parent.min;
        let mut max = mid;
        if upper[0] {
          min.x = mid.x;
          max.x = parent.max.x;
        }
        if upper[1] {
          min.y = mid.y;
          max.y = parent.max.y;
        }
        if upper[2] {
          min.z = mid.z;
          max.z = parent.max.z;
        }
        Aabb3::new(min, max)
      }
      Subdivision::Kd => {
        let axis = level % 3;
        let mut min = parent.min.to_array();
        let mut max = parent.max.to_array();
        if child == 1 {
          min[axis] = mid.to_array()[axis];
        } else {
          max[axis] = mid.to_array()[axis];
        }
        Aabb3::new(DVec3::from_array(min), DVec3::from_array(max))
      }
    }
  }

  /// Token used in tree file names.
  pub fn token(self) -> &'static str {
    match self {
      Subdivision::Octree => "ok",
      Subdivision::Kd => "kd",
    }
  }
}

impl fmt::Display for Subdivision {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.token())
  }
}

impl FromStr for Subdivision {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "ok" => Ok(Subdivision::Octree),
      "kd" => Ok(Subdivision::Kd),
      other => Err(Error::Config(format!(
        "unknown subdivision '{other}', expected 'ok' or 'kd'"
      ))),
    }
  }
}
