//! Robust geometric predicates: determinant signs, point-in-simplex tests,
//! Liang–Barsky segment clipping and the tetrahedron-vs-box intersection
//! tests used at build and query time.
//!
//! All predicates work on `f64` with the fixed tolerance [`TOLERANCE`]: a
//! determinant is treated as zero when its magnitude is at most the
//! tolerance. Predicates are pure, total, and never allocate.
//!
//! Two families exist for the box tests. The non-strict family treats the box
//! faces as closed and is used while building a tree (a tetrahedron touching
//! a node face belongs to that node). The strict family treats all faces as
//! open and is used to answer queries (tangential contact is not an
//! intersection).

use glam::{DMat3, DMat4, DVec3};

use crate::mesh::Aabb3;

/// Tolerance under which a determinant counts as zero.
pub const TOLERANCE: f64 = 1e-13;

/// Sign of a counter-clockwise turn.
pub const LEFT_TURN: i32 = -1;
/// Sign of a degenerate (collinear / coplanar) configuration.
pub const NO_TURN: i32 = 0;
/// Sign of a clockwise turn.
pub const RIGHT_TURN: i32 = 1;

#[inline]
fn sign_with_tolerance(d: f64) -> i32 {
  if d.abs() <= TOLERANCE {
    0
  } else if d > 0.0 {
    1
  } else {
    -1
  }
}

/// Sign of the 2x2 determinant `| a b; c d |`.
#[inline]
pub fn det_sign_2d(a: f64, b: f64, c: f64, d: f64) -> i32 {
  let t1 = a * d;
  let t2 = b * c;
  if t1 > t2 + TOLERANCE {
    1
  } else if t2 > t1 + TOLERANCE {
    -1
  } else {
    0
  }
}

/// Sign of the 3x3 determinant with rows `r0`, `r1`, `r2`.
#[inline]
pub fn det_sign_3d(r0: DVec3, r1: DVec3, r2: DVec3) -> i32 {
  // det(M) == det(M^T), so feeding rows as columns is sound.
  sign_with_tolerance(DMat3::from_cols(r0, r1, r2).determinant())
}

/// Sign of the 4x4 determinant whose rows are the four points extended with a
/// unit homogeneous coordinate. This is the 3D orientation test.
#[inline]
pub fn orient_sign(p0: DVec3, p1: DVec3, p2: DVec3, p3: DVec3) -> i32 {
  sign_with_tolerance(
    DMat4::from_cols(
      p0.extend(1.0),
      p1.extend(1.0),
      p2.extend(1.0),
      p3.extend(1.0),
    )
    .determinant(),
  )
}

/// Side of point `p` with respect to the plane through `a`, `b`, `c`.
#[inline]
pub fn four_point_turn(p: DVec3, a: DVec3, b: DVec3, c: DVec3) -> i32 {
  det_sign_3d(a - p, b - a, c - a)
}

/// Side of point `(px, py)` with respect to the directed 2D line `a -> b`.
#[inline]
pub fn point_turn_2d(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> i32 {
  det_sign_2d(px - ax, py - ay, bx - ax, by - ay)
}

/// Strict 2D point-in-triangle test: all three turns must agree and be
/// non-degenerate, so collinear triangles and boundary points are "outside".
pub fn point_in_triangle_2d(
  px: f64,
  py: f64,
  ax: f64,
  ay: f64,
  bx: f64,
  by: f64,
  cx: f64,
  cy: f64,
) -> bool {
  let t0 = point_turn_2d(px, py, ax, ay, bx, by);
  let t1 = point_turn_2d(px, py, bx, by, cx, cy);
  let t2 = point_turn_2d(px, py, cx, cy, ax, ay);
  (t0 == LEFT_TURN && t1 == LEFT_TURN && t2 == LEFT_TURN)
    || (t0 == RIGHT_TURN && t1 == RIGHT_TURN && t2 == RIGHT_TURN)
}

/// Closed point-in-tetrahedron test.
///
/// A point equal to a vertex is inside; a point on the boundary is inside (a
/// zero orientation against a face does not conflict with the reference
/// orientation).
pub fn point_in_tetra(p: DVec3, v: &[DVec3; 4]) -> bool {
  if v.iter().any(|&c| p == c) {
    return true;
  }
  let orientation = orient_sign(v[0], v[1], v[2], v[3]);
  for i in 0..4 {
    let mut rows = *v;
    rows[i] = p;
    let d = orient_sign(rows[0], rows[1], rows[2], rows[3]);
    if d != orientation && d != 0 {
      return false;
    }
  }
  true
}

/// Open point-in-tetrahedron test: boundary points are outside.
pub fn point_in_tetra_strict(p: DVec3, v: &[DVec3; 4]) -> bool {
  let orientation = orient_sign(v[0], v[1], v[2], v[3]);
  for i in 0..4 {
    let mut rows = *v;
    rows[i] = p;
    if orient_sign(rows[0], rows[1], rows[2], rows[3]) != orientation {
      return false;
    }
  }
  true
}

// --- Liang–Barsky interval clipping ---------------------------------------

/// Restrict the admissible interval `u` to the half-line solving
/// `t * p <= q`. Returns false when the interval becomes empty. Boundary
/// contact (`p == 0 && q == 0`, or the interval collapsing to a point) stays
/// admissible.
#[inline]
fn clip_test(p: f64, q: f64, u: &mut (f64, f64)) -> bool {
  if p < 0.0 {
    let r = q / p;
    if r > u.1 {
      return false;
    }
    if r > u.0 {
      u.0 = r;
    }
  } else if p > 0.0 {
    let r = q / p;
    if r < u.0 {
      return false;
    }
    if r < u.1 {
      u.1 = r;
    }
  } else if q < 0.0 {
    // Parallel to the clipping plane and on the outside.
    return false;
  }
  true
}

/// Strict variant of [`clip_test`]: tangential contact empties the interval.
#[inline]
fn clip_test_strict(p: f64, q: f64, u: &mut (f64, f64)) -> bool {
  if p < 0.0 {
    let r = q / p;
    if r >= u.1 {
      return false;
    }
    if r > u.0 {
      u.0 = r;
    }
  } else if p > 0.0 {
    let r = q / p;
    if r <= u.0 {
      return false;
    }
    if r < u.1 {
      u.1 = r;
    }
  } else if q <= 0.0 {
    return false;
  }
  true
}

/// Segment-vs-box, closed faces: true when `a -> b` is at least partially
/// inside `bb` (touching counts).
pub fn clip_segment_3d(bb: &Aabb3, a: DVec3, b: DVec3) -> bool {
  let mut u = (0.0, 1.0);
  let d = b - a;
  clip_test(-d.x, a.x - bb.min.x, &mut u)
    && clip_test(d.x, bb.max.x - a.x, &mut u)
    && clip_test(-d.y, a.y - bb.min.y, &mut u)
    && clip_test(d.y, bb.max.y - a.y, &mut u)
    && clip_test(-d.z, a.z - bb.min.z, &mut u)
    && clip_test(d.z, bb.max.z - a.z, &mut u)
}

/// Segment-vs-box, open faces: tangential contact is not an intersection.
pub fn clip_segment_3d_strict(bb: &Aabb3, a: DVec3, b: DVec3) -> bool {
  let mut u = (0.0, 1.0);
  let d = b - a;
  clip_test_strict(-d.x, a.x - bb.min.x, &mut u)
    && clip_test_strict(d.x, bb.max.x - a.x, &mut u)
    && clip_test_strict(-d.y, a.y - bb.min.y, &mut u)
    && clip_test_strict(d.y, bb.max.y - a.y, &mut u)
    && clip_test_strict(-d.z, a.z - bb.min.z, &mut u)
    && clip_test_strict(d.z, bb.max.z - a.z, &mut u)
}

/// Segment-vs-box with the half-open convention of the tree: minimum faces
/// closed, maximum faces open.
pub fn clip_segment_3d_middle(bb: &Aabb3, a: DVec3, b: DVec3) -> bool {
  let mut u = (0.0, 1.0);
  let d = b - a;
  clip_test(-d.x, a.x - bb.min.x, &mut u)
    && clip_test_strict(d.x, bb.max.x - a.x, &mut u)
    && clip_test(-d.y, a.y - bb.min.y, &mut u)
    && clip_test_strict(d.y, bb.max.y - a.y, &mut u)
    && clip_test(-d.z, a.z - bb.min.z, &mut u)
    && clip_test_strict(d.z, bb.max.z - a.z, &mut u)
}

/// [`clip_segment_3d_middle`] with per-face opt-outs: a cleared flag skips
/// the corresponding face test entirely. `min_flags`/`max_flags` are indexed
/// by axis.
pub fn clip_segment_3d_middle_flags(
  bb: &Aabb3,
  a: DVec3,
  b: DVec3,
  min_flags: [bool; 3],
  max_flags: [bool; 3],
) -> bool {
  let mut u = (0.0, 1.0);
  let d = (b - a).to_array();
  let aa = a.to_array();
  let mins = bb.min.to_array();
  let maxs = bb.max.to_array();
  for axis in 0..3 {
    if min_flags[axis] && !clip_test(-d[axis], aa[axis] - mins[axis], &mut u) {
      return false;
    }
    if max_flags[axis] && !clip_test_strict(d[axis], maxs[axis] - aa[axis], &mut u) {
      return false;
    }
  }
  true
}

// --- 2D box predicates (used by the coplanar-face cases) -------------------

/// Strict 2D segment-vs-rectangle clipping.
pub fn clip_segment_2d_strict(
  min_x: f64,
  min_y: f64,
  max_x: f64,
  max_y: f64,
  x1: f64,
  y1: f64,
  x2: f64,
  y2: f64,
) -> bool {
  let mut u = (0.0, 1.0);
  let dx = x2 - x1;
  let dy = y2 - y1;
  clip_test_strict(-dx, x1 - min_x, &mut u)
    && clip_test_strict(dx, max_x - x1, &mut u)
    && clip_test_strict(-dy, y1 - min_y, &mut u)
    && clip_test_strict(dy, max_y - y1, &mut u)
}

/// True iff the edge `(x1,y1)-(x2,y2)` lies on the vertical line `x = x0`
/// and overlaps the open interval `y01 < y < y02` of it.
fn overlap_x_segment(x1: f64, y1: f64, x2: f64, y2: f64, x0: f64, y01: f64, y02: f64) -> bool {
  if x1 != x0 || x2 != x0 {
    return false;
  }
  if y1 <= y01 && y2 <= y01 {
    return false;
  }
  if y1 >= y02 && y2 >= y02 {
    return false;
  }
  true
}

/// Strict 2D triangle-vs-rectangle intersection.
///
/// Tangential contact does not count, except for a triangle edge aligned
/// with a rectangle edge while the triangle extends to the interior side.
pub fn clip_triangle_2d_strict(
  min_x: f64,
  min_y: f64,
  max_x: f64,
  max_y: f64,
  xs: &[f64; 3],
  ys: &[f64; 3],
) -> bool {
  // All vertices on one side: no intersection.
  if xs.iter().all(|&x| x <= min_x) || xs.iter().all(|&x| x >= max_x) {
    return false;
  }
  if ys.iter().all(|&y| y <= min_y) || ys.iter().all(|&y| y >= max_y) {
    return false;
  }
  // A vertex strictly inside the rectangle.
  for i in 0..3 {
    if xs[i] < max_x && xs[i] > min_x && ys[i] < max_y && ys[i] > min_y {
      return true;
    }
  }
  // An edge at least partially inside.
  for i in 0..3 {
    let j = (i + 1) % 3;
    if clip_segment_2d_strict(min_x, min_y, max_x, max_y, xs[i], ys[i], xs[j], ys[j]) {
      return true;
    }
  }
  // The triangle may contain the whole rectangle: test its center.
  if point_in_triangle_2d(
    0.5 * (min_x + max_x),
    0.5 * (min_y + max_y),
    xs[0],
    ys[0],
    xs[1],
    ys[1],
    xs[2],
    ys[2],
  ) {
    return true;
  }
  // A triangle edge aligned with a rectangle edge, triangle extending to the
  // interior side.
  for i in 0..3 {
    let j = (i + 1) % 3;
    let k = (i + 2) % 3;
    if overlap_x_segment(xs[i], ys[i], xs[j], ys[j], min_x, min_y, max_y) && xs[k] > min_x {
      return true;
    }
    if overlap_x_segment(xs[i], ys[i], xs[j], ys[j], max_x, min_y, max_y) && xs[k] < max_x {
      return true;
    }
    if overlap_x_segment(ys[i], xs[i], ys[j], xs[j], min_y, min_x, max_x) && ys[k] > min_y {
      return true;
    }
    if overlap_x_segment(ys[i], xs[i], ys[j], xs[j], max_y, min_x, max_x) && ys[k] < max_y {
      return true;
    }
  }
  false
}

// --- triangle-vs-box -------------------------------------------------------

/// Segment-vs-triangle via orientation signs of both endpoints: true when
/// the endpoints lie strictly on opposite sides of the triangle plane.
pub fn edge_intersects_triangle_strict(a: DVec3, b: DVec3, tri: &[DVec3; 3]) -> bool {
  let t1 = four_point_turn(a, tri[0], tri[1], tri[2]);
  let t2 = four_point_turn(b, tri[0], tri[1], tri[2]);
  t1 == -t2 && t1 != NO_TURN
}

/// Triangle-vs-box, closed faces: a vertex in the open box or an edge
/// clipping the closed box counts.
pub fn clip_triangle_3d(bb: &Aabb3, tri: &[DVec3; 3]) -> bool {
  for &p in tri {
    if strictly_inside(bb, p) {
      return true;
    }
  }
  for i in 0..3 {
    if clip_segment_3d(bb, tri[i], tri[(i + 1) % 3]) {
      return true;
    }
  }
  false
}

#[inline]
fn strictly_inside(bb: &Aabb3, p: DVec3) -> bool {
  p.x < bb.max.x
    && p.x > bb.min.x
    && p.y < bb.max.y
    && p.y > bb.min.y
    && p.z < bb.max.z
    && p.z > bb.min.z
}

/// Triangle-vs-box, open faces: tangential contact is not an intersection.
pub fn clip_triangle_3d_strict(bb: &Aabb3, tri: &[DVec3; 3]) -> bool {
  let xs = [tri[0].x, tri[1].x, tri[2].x];
  let ys = [tri[0].y, tri[1].y, tri[2].y];
  let zs = [tri[0].z, tri[1].z, tri[2].z];

  // All vertices on one side of the box: no intersection.
  if xs.iter().all(|&x| x <= bb.min.x) || xs.iter().all(|&x| x >= bb.max.x) {
    return false;
  }
  if ys.iter().all(|&y| y <= bb.min.y) || ys.iter().all(|&y| y >= bb.max.y) {
    return false;
  }
  if zs.iter().all(|&z| z <= bb.min.z) || zs.iter().all(|&z| z >= bb.max.z) {
    return false;
  }

  for &p in tri {
    if strictly_inside(bb, p) {
      return true;
    }
  }
  for i in 0..3 {
    if clip_segment_3d_strict(bb, tri[i], tri[(i + 1) % 3]) {
      return true;
    }
  }

  // Edges may lie on the box faces with the interior inside: test the
  // triangle midpoint.
  let center = (tri[0] + tri[1] + tri[2]) / 3.0;
  if strictly_inside(bb, center) {
    return true;
  }

  // The box may cut the triangle interior without any edge crossing: check
  // the twelve box edges against the triangle, each together with the 2D
  // projection test that places the edge line inside the projected triangle.
  let (lo, hi) = (bb.min, bb.max);

  // Edges parallel to the x axis project to a point in (y, z).
  for (y, z) in [(lo.y, lo.z), (hi.y, lo.z), (hi.y, hi.z), (lo.y, hi.z)] {
    if edge_intersects_triangle_strict(
      DVec3::new(lo.x, y, z),
      DVec3::new(hi.x, y, z),
      tri,
    ) && point_in_triangle_2d(y, z, ys[0], zs[0], ys[1], zs[1], ys[2], zs[2])
    {
      return true;
    }
  }
  // Edges parallel to the y axis project to a point in (x, z).
  for (x, z) in [(lo.x, lo.z), (lo.x, hi.z), (hi.x, lo.z), (hi.x, hi.z)] {
    if edge_intersects_triangle_strict(
      DVec3::new(x, lo.y, z),
      DVec3::new(x, hi.y, z),
      tri,
    ) && point_in_triangle_2d(x, z, xs[0], zs[0], xs[1], zs[1], xs[2], zs[2])
    {
      return true;
    }
  }
  // Edges parallel to the z axis project to a point in (x, y).
  for (x, y) in [(lo.x, lo.y), (lo.x, hi.y), (hi.x, lo.y), (hi.x, hi.y)] {
    if edge_intersects_triangle_strict(
      DVec3::new(x, y, lo.z),
      DVec3::new(x, y, hi.z),
      tri,
    ) && point_in_triangle_2d(x, y, xs[0], ys[0], xs[1], ys[1], xs[2], ys[2])
    {
      return true;
    }
  }

  false
}

/// Triangle-vs-box with configurable closed faces.
///
/// `min_closed` additionally accepts a triangle coplanar with (and properly
/// overlapping) any of the three minimum faces; each `max_closed[axis]` does
/// the same for the corresponding maximum face. With all flags cleared only
/// proper interior intersections count.
pub fn clip_triangle_3d_strict_flags(
  bb: &Aabb3,
  tri: &[DVec3; 3],
  min_closed: bool,
  max_closed: [bool; 3],
) -> bool {
  for &p in tri {
    if strictly_inside(bb, p) {
      return true;
    }
  }
  for i in 0..3 {
    if clip_segment_3d_strict(bb, tri[i], tri[(i + 1) % 3]) {
      return true;
    }
  }

  // The triangle may cut clean through the box: a box edge from the minimum
  // corner with endpoints on opposite sides of the triangle plane, whose
  // projection falls inside the projected triangle.
  let xs = [tri[0].x, tri[1].x, tri[2].x];
  let ys = [tri[0].y, tri[1].y, tri[2].y];
  let zs = [tri[0].z, tri[1].z, tri[2].z];
  let (lo, hi) = (bb.min, bb.max);
  let s1 = orient_sign(lo, tri[0], tri[1], tri[2]);
  let s_z = orient_sign(DVec3::new(lo.x, lo.y, hi.z), tri[0], tri[1], tri[2]);
  if s1 != 0
    && s1 == -s_z
    && point_in_triangle_2d(lo.x, lo.y, xs[0], ys[0], xs[1], ys[1], xs[2], ys[2])
  {
    return true;
  }
  let s_x = orient_sign(DVec3::new(hi.x, lo.y, lo.z), tri[0], tri[1], tri[2]);
  if s1 != 0
    && s1 == -s_x
    && point_in_triangle_2d(lo.y, lo.z, ys[0], zs[0], ys[1], zs[1], ys[2], zs[2])
  {
    return true;
  }
  let s_y = orient_sign(DVec3::new(lo.x, hi.y, lo.z), tri[0], tri[1], tri[2]);
  if s1 != 0
    && s1 == -s_y
    && point_in_triangle_2d(lo.x, lo.z, xs[0], zs[0], xs[1], zs[1], xs[2], zs[2])
  {
    return true;
  }

  // Coplanar overlap with a closed face.
  if min_closed {
    if xs.iter().all(|&x| x == lo.x)
      && clip_triangle_2d_strict(lo.y, lo.z, hi.y, hi.z, &ys, &zs)
    {
      return true;
    }
    if ys.iter().all(|&y| y == lo.y)
      && clip_triangle_2d_strict(lo.x, lo.z, hi.x, hi.z, &xs, &zs)
    {
      return true;
    }
    if zs.iter().all(|&z| z == lo.z)
      && clip_triangle_2d_strict(lo.x, lo.y, hi.x, hi.y, &xs, &ys)
    {
      return true;
    }
  }
  if max_closed[0]
    && xs.iter().all(|&x| x == hi.x)
    && clip_triangle_2d_strict(lo.y, lo.z, hi.y, hi.z, &ys, &zs)
  {
    return true;
  }
  if max_closed[1]
    && ys.iter().all(|&y| y == hi.y)
    && clip_triangle_2d_strict(lo.x, lo.z, hi.x, hi.z, &xs, &zs)
  {
    return true;
  }
  if max_closed[2]
    && zs.iter().all(|&z| z == hi.z)
    && clip_triangle_2d_strict(lo.x, lo.y, hi.x, hi.y, &xs, &ys)
  {
    return true;
  }

  false
}

// --- tetrahedron-vs-box ----------------------------------------------------

const BOX_CORNER_SELECTORS: [[bool; 3]; 8] = [
  [false, false, false],
  [false, false, true],
  [false, true, false],
  [true, false, false],
  [true, true, true],
  [true, true, false],
  [true, false, true],
  [false, true, true],
];

#[inline]
fn box_corner(bb: &Aabb3, select_max: [bool; 3]) -> DVec3 {
  DVec3::new(
    if select_max[0] { bb.max.x } else { bb.min.x },
    if select_max[1] { bb.max.y } else { bb.min.y },
    if select_max[2] { bb.max.z } else { bb.min.z },
  )
}

#[inline]
fn tetra_face(v: &[DVec3; 4], i: usize) -> [DVec3; 3] {
  [v[i % 4], v[(i + 1) % 4], v[(i + 2) % 4]]
}

/// Tetrahedron-vs-box with closed box faces, used at build time.
///
/// True when a tetrahedron vertex lies in the closed box, a box corner lies
/// in the closed tetrahedron, or a triangular face clips the box with
/// non-strict rules.
pub fn tetra_in_box(bb: &Aabb3, v: &[DVec3; 4]) -> bool {
  for &p in v {
    if bb.contains_closed(p) {
      return true;
    }
  }
  for selector in BOX_CORNER_SELECTORS {
    if point_in_tetra(box_corner(bb, selector), v) {
      return true;
    }
  }
  for i in 0..4 {
    if clip_triangle_3d(bb, &tetra_face(v, i)) {
      return true;
    }
  }
  false
}

/// Tetrahedron-vs-box with open box faces, used at query time.
///
/// Tangential contact is excluded; a tetrahedron whose face is coplanar with
/// a box face counts only when the rest of the tetrahedron extends to the
/// interior side.
pub fn tetra_in_box_strict(bb: &Aabb3, v: &[DVec3; 4]) -> bool {
  // All vertices on one side of the box: no intersection.
  let lo = bb.min.to_array();
  let hi = bb.max.to_array();
  for axis in 0..3 {
    if v.iter().all(|p| p.to_array()[axis] <= lo[axis]) {
      return false;
    }
    if v.iter().all(|p| p.to_array()[axis] >= hi[axis]) {
      return false;
    }
  }

  for &p in v {
    if strictly_inside(bb, p) {
      return true;
    }
  }
  for selector in BOX_CORNER_SELECTORS {
    if point_in_tetra_strict(box_corner(bb, selector), v) {
      return true;
    }
  }
  if point_in_tetra_strict(bb.center(), v) {
    return true;
  }
  for i in 0..4 {
    if clip_triangle_3d_strict(bb, &tetra_face(v, i)) {
      return true;
    }
  }

  // A triangular face coplanar with a box face, with the fourth vertex on
  // the interior side of that face.
  for i in 0..4 {
    let tri = [
      v[i].to_array(),
      v[(i + 1) % 4].to_array(),
      v[(i + 2) % 4].to_array(),
    ];
    let fourth = v[(i + 3) % 4].to_array();
    for axis in 0..3 {
      let (u, w) = ((axis + 1) % 3, (axis + 2) % 3);
      let us = [tri[0][u], tri[1][u], tri[2][u]];
      let ws = [tri[0][w], tri[1][w], tri[2][w]];
      if tri.iter().all(|p| p[axis] == lo[axis])
        && clip_triangle_2d_strict(lo[u], lo[w], hi[u], hi[w], &us, &ws)
        && fourth[axis] > lo[axis]
      {
        return true;
      }
      if tri.iter().all(|p| p[axis] == hi[axis])
        && clip_triangle_2d_strict(lo[u], lo[w], hi[u], hi[w], &us, &ws)
        && fourth[axis] < hi[axis]
      {
        return true;
      }
    }
  }

  false
}

#[cfg(test)]
#[path = "predicates_test.rs"]
mod predicates_test;
