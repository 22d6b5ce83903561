//! Vertex type: a 3D position plus a scalar field value.
//!
//! Positions are plain [`DVec3`]; the field value extends them to a 4D vector
//! space for the discrete-distortion computation.

use std::cmp::Ordering;

use glam::DVec3;

/// Strict lexicographic order on points, by (x, y, z).
///
/// Uses `total_cmp`, so NaN coordinates sort deterministically instead of
/// poisoning comparisons.
pub fn lex_cmp(a: DVec3, b: DVec3) -> Ordering {
  a.x
    .total_cmp(&b.x)
    .then_with(|| a.y.total_cmp(&b.y))
    .then_with(|| a.z.total_cmp(&b.z))
}

/// A mesh vertex: position plus scalar field value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
  /// Position in space.
  pub pos: DVec3,
  /// Scalar field sampled at this vertex.
  pub field: f64,
}

impl Vertex {
  pub fn new(x: f64, y: f64, z: f64, field: f64) -> Self {
    Self {
      pos: DVec3::new(x, y, z),
      field,
    }
  }

  /// Norm of the vector `other - self` in the field-extended 4D space.
  #[inline]
  pub fn norm_4d(&self, other: &Vertex) -> f64 {
    let d = other.pos - self.pos;
    let f = other.field - self.field;
    (d.length_squared() + f * f).sqrt()
  }

  /// Scalar product of the vectors `a - self` and `b - self` in the
  /// field-extended 4D space.
  #[inline]
  pub fn scalar_product_4d(&self, a: &Vertex, b: &Vertex) -> f64 {
    let da = a.pos - self.pos;
    let db = b.pos - self.pos;
    let fa = a.field - self.field;
    let fb = b.field - self.field;
    da.dot(db) + fa * fb
  }

  /// Scalar product of the vectors `a - self` and `b - self`, positions only.
  #[inline]
  pub fn scalar_product_3d(&self, a: &Vertex, b: &Vertex) -> f64 {
    (a.pos - self.pos).dot(b.pos - self.pos)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lex_order_is_by_x_then_y_then_z() {
    let a = DVec3::new(0.0, 9.0, 9.0);
    let b = DVec3::new(1.0, 0.0, 0.0);
    assert_eq!(lex_cmp(a, b), Ordering::Less);
    let c = DVec3::new(1.0, 0.0, 1.0);
    assert_eq!(lex_cmp(b, c), Ordering::Less);
    assert_eq!(lex_cmp(c, c), Ordering::Equal);
  }

  #[test]
  fn norm_includes_field_component() {
    let a = Vertex::new(0.0, 0.0, 0.0, 0.0);
    let b = Vertex::new(3.0, 0.0, 0.0, 4.0);
    assert_eq!(a.norm_4d(&b), 5.0);
  }

  #[test]
  fn scalar_product_4d_matches_hand_computation() {
    let o = Vertex::new(0.0, 0.0, 0.0, 1.0);
    let a = Vertex::new(1.0, 0.0, 0.0, 2.0);
    let b = Vertex::new(0.0, 1.0, 0.0, 3.0);
    // (1,0,0,1) . (0,1,0,2) = 2
    assert_eq!(o.scalar_product_4d(&a, &b), 2.0);
    assert_eq!(o.scalar_product_3d(&a, &b), 0.0);
  }
}
