//! Axis-aligned bounding box with the two point-containment modes used by the
//! index: all-closed, and half-open with a domain-max override.

use glam::DVec3;

/// Double-precision axis-aligned bounding box.
///
/// Node domains, run bounding boxes and query boxes are all `Aabb3`. The
/// min/max invariant (`min.c <= max.c` componentwise) holds for every box the
/// library constructs itself.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
  /// Minimum corner.
  pub min: DVec3,
  /// Maximum corner.
  pub max: DVec3,
}

impl Aabb3 {
  /// Create a new box from min and max corners.
  ///
  /// # Panics
  /// Debug-asserts that min <= max on all axes.
  pub fn new(min: DVec3, max: DVec3) -> Self {
    debug_assert!(
      min.x <= max.x && min.y <= max.y && min.z <= max.z,
      "box min must be <= max on all axes"
    );
    Self { min, max }
  }

  /// Degenerate box around a single point. Used to seed domain growth.
  pub fn point(p: DVec3) -> Self {
    Self { min: p, max: p }
  }

  /// Check whether this box intersects another (closed on all faces).
  #[inline]
  pub fn intersects(&self, other: &Aabb3) -> bool {
    self.min.x <= other.max.x
      && self.max.x >= other.min.x
      && self.min.y <= other.max.y
      && self.max.y >= other.min.y
      && self.min.z <= other.max.z
      && self.max.z >= other.min.z
  }

  /// Check whether this box strictly contains `other` on every axis.
  ///
  /// Tangential contact does not count: a box never encloses itself.
  #[inline]
  pub fn encloses(&self, other: &Aabb3) -> bool {
    self.min.x < other.min.x
      && self.min.y < other.min.y
      && self.min.z < other.min.z
      && self.max.x > other.max.x
      && self.max.y > other.max.y
      && self.max.z > other.max.z
  }

  /// Point containment with all six faces closed.
  ///
  /// This is the "does the point lie in the mesh domain" test; it is not
  /// usable for leaf ownership because adjacent leaves would both claim
  /// points on their shared face.
  #[inline]
  pub fn contains_closed(&self, p: DVec3) -> bool {
    p.x >= self.min.x
      && p.x <= self.max.x
      && p.y >= self.min.y
      && p.y <= self.max.y
      && p.z >= self.min.z
      && p.z <= self.max.z
  }

  /// Point containment, half-open with a domain-max override.
  ///
  /// The three faces incident to `min` are closed, the three incident to
  /// `max` are open, except that a max face lying on the corresponding
  /// coordinate of the global mesh maximum `domain_max` is closed. Over the
  /// leaves of a tree this makes "contains" a partition of the domain.
  #[inline]
  pub fn contains(&self, p: DVec3, domain_max: DVec3) -> bool {
    let pa = p.to_array();
    let mina = self.min.to_array();
    let maxa = self.max.to_array();
    let doma = domain_max.to_array();
    for i in 0..3 {
      if !in_range(mina[i], maxa[i], pa[i], doma[i]) {
        return false;
      }
    }
    true
  }

  /// Grow the box so that it contains `p` (all-closed).
  pub fn expand_to(&mut self, p: DVec3) {
    if self.contains_closed(p) {
      return;
    }
    self.min = self.min.min(p);
    self.max = self.max.max(p);
  }

  /// Length of the box diagonal.
  #[inline]
  pub fn diagonal(&self) -> f64 {
    (self.max - self.min).length()
  }

  /// Center of the box.
  #[inline]
  pub fn center(&self) -> DVec3 {
    (self.min + self.max) * 0.5
  }
}

impl Default for Aabb3 {
  fn default() -> Self {
    Aabb3::point(DVec3::ZERO)
  }
}

/// Range test for one coordinate: closed at `min`, open at `max` unless `max`
/// coincides with the domain maximum for this axis.
#[inline]
fn in_range(min: f64, max: f64, coord: f64, domain_max: f64) -> bool {
  if max == domain_max {
    if max < coord {
      return false;
    }
  } else if max <= coord {
    return false;
  }
  coord >= min
}
