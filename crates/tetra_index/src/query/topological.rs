//! Topological queries: vertex-to-tetrahedra (VT), tetra-to-tetra adjacency
//! (TT) and per-vertex discrete distortion, in windowed, linearized and
//! batched form.
//!
//! All of them rely on the vertex-to-leaf ownership partition: a vertex is
//! processed by exactly one leaf (range test on reindexed V trees, half-open
//! domain containment otherwise), so per-leaf partial results merge into the
//! global answer without conflicts. TT adjacency is extracted by the
//! sort-and-pair scheme: each accepted tetrahedron contributes one tuple per
//! unresolved face, equal tuples are the two sides of a shared triangle.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use fixedbitset::FixedBitSet;
use glam::DVec3;

use crate::error::Error;
use crate::geometry::{distortion, wrapper};
use crate::mesh::{sort_face_tuples, Aabb3, FaceTuple, Mesh};
use crate::tree::node::Node;
use crate::tree::{Subdivision, TetraTree};

/// How a leaf decides which vertices it owns.
#[derive(Clone, Copy)]
enum Ownership {
  /// Reindexed tree with explicit vertex lists: the leaf's id range.
  Range,
  /// Reindexed tetra-only tree: the id range of the domain-contained
  /// vertices of the leaf's tetrahedra.
  DomainRange,
  /// Not reindexed: half-open domain containment per vertex.
  Domain,
}

fn ownership(tree: &TetraTree) -> Ownership {
  if !tree.is_reindexed() {
    Ownership::Domain
  } else if tree.criterion().uses_vertex_lists() {
    Ownership::Range
  } else {
    Ownership::DomainRange
  }
}

/// The owned vertex range of a leaf under range-based ownership.
fn owned_range(n: &Node, dom: &Aabb3, mesh: &Mesh, ownership: Ownership) -> Option<(i32, i32)> {
  match ownership {
    Ownership::Range => n.vertex_range(),
    Ownership::DomainRange => n.vertex_range_in_domain(dom, mesh),
    Ownership::Domain => None,
  }
}

// --- windowed VT -----------------------------------------------------------

/// Windowed vertex-to-tetrahedra: for every vertex inside the query box
/// (all-closed), the ids of its incident tetrahedra.
pub fn windowed_vt(tree: &TetraTree, b: &Aabb3) -> BTreeMap<i32, Vec<i32>> {
  let mut vt = BTreeMap::new();
  vt_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    b,
    tree.mesh(),
    tree.subdivision(),
    ownership(tree),
    &mut vt,
  );
  vt
}

#[allow(clippy::too_many_arguments)]
fn vt_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  b: &Aabb3,
  mesh: &Mesh,
  subdivision: Subdivision,
  ownership: Ownership,
  vt: &mut BTreeMap<i32, Vec<i32>>,
) {
  if !dom.intersects(b) {
    return;
  }
  if n.is_leaf() {
    vt_leaf(n, dom, Some(b), mesh, ownership, vt);
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    vt_node(child, &child_dom, level + 1, b, mesh, subdivision, ownership, vt);
  }
}

/// Accumulate the VT lists of one leaf; `b == None` means no window
/// (batched extraction).
fn vt_leaf(
  n: &Node,
  dom: &Aabb3,
  b: Option<&Aabb3>,
  mesh: &Mesh,
  ownership: Ownership,
  vt: &mut BTreeMap<i32, Vec<i32>>,
) {
  let domain_max = mesh.domain().max;
  let in_window = |v: i32| match b {
    Some(b) => b.contains_closed(mesh.vertex(v).pos),
    None => true,
  };
  match owned_range(n, dom, mesh, ownership) {
    Some((v_start, v_end)) => {
      if v_start == v_end {
        return;
      }
      let mut local: Vec<Vec<i32>> = vec![Vec::new(); (v_end - v_start) as usize];
      for t in n.tetrahedra().iter() {
        let tet = mesh.tetrahedron(t);
        for pos in 0..4 {
          let v = tet.tv(pos);
          if v >= v_start && v < v_end && in_window(v) {
            local[(v - v_start) as usize].push(t);
          }
        }
      }
      for (i, list) in local.into_iter().enumerate() {
        if !list.is_empty() {
          vt.insert(v_start + i as i32, list);
        }
      }
    }
    None => {
      for t in n.tetrahedra().iter() {
        let tet = mesh.tetrahedron(t);
        for pos in 0..4 {
          let v = tet.tv(pos);
          if dom.contains(mesh.vertex(v).pos, domain_max) && in_window(v) {
            vt.entry(v).or_default().push(t);
          }
        }
      }
    }
  }
}

// --- batched VT ------------------------------------------------------------

/// Result of the batched VT extraction.
pub struct BatchedVt {
  /// Incident tetrahedra per vertex, indexed by `v - 1`.
  pub lists: Vec<Vec<i32>>,
  /// Largest number of VT entries accumulated by a single leaf.
  pub max_leaf_entries: usize,
}

/// Batched vertex-to-tetrahedra over the whole mesh: every leaf contributes
/// the lists of the vertices it owns.
pub fn batched_vt(tree: &TetraTree) -> BatchedVt {
  let mut out = BatchedVt {
    lists: vec![Vec::new(); tree.mesh().num_vertices()],
    max_leaf_entries: 0,
  };
  batched_vt_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    tree.mesh(),
    tree.subdivision(),
    ownership(tree),
    &mut out,
  );
  out
}

fn batched_vt_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  mesh: &Mesh,
  subdivision: Subdivision,
  ownership: Ownership,
  out: &mut BatchedVt,
) {
  if n.is_leaf() {
    let mut local = BTreeMap::new();
    vt_leaf(n, dom, None, mesh, ownership, &mut local);
    let entries: usize = local.values().map(Vec::len).sum();
    out.max_leaf_entries = out.max_leaf_entries.max(entries);
    for (v, list) in local {
      out.lists[(v - 1) as usize] = list;
    }
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    batched_vt_node(child, &child_dom, level + 1, mesh, subdivision, ownership, out);
  }
}

// --- windowed / linearized TT ---------------------------------------------

/// Windowed tetra-to-tetra adjacency: for every tetrahedron intersecting the
/// query box, its four face-neighbours (`-1` for boundary faces and for
/// neighbours outside the query).
pub fn windowed_tt(tree: &TetraTree, b: &Aabb3) -> BTreeMap<i32, [i32; 4]> {
  let mut tt = BTreeMap::new();
  let mut seen = FixedBitSet::with_capacity(tree.mesh().num_tetrahedra() + 1);
  tt_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    b,
    tree.mesh(),
    tree.subdivision(),
    &mut tt,
    &mut seen,
  );
  tt
}

#[allow(clippy::too_many_arguments)]
fn tt_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  b: &Aabb3,
  mesh: &Mesh,
  subdivision: Subdivision,
  tt: &mut BTreeMap<i32, [i32; 4]>,
  seen: &mut FixedBitSet,
) {
  if !dom.intersects(b) {
    return;
  }
  if n.is_leaf() {
    if b.encloses(dom) {
      tt_leaf_add(n, mesh, tt, seen);
    } else {
      tt_leaf_test(n, b, mesh, tt, seen);
    }
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    tt_node(child, &child_dom, level + 1, b, mesh, subdivision, tt, seen);
  }
}

/// Contribute the face tuples of `t` for its still-unresolved adjacency
/// slots, creating the entry on first sight.
fn add_faces(t: i32, faces: &mut Vec<FaceTuple>, mesh: &Mesh, tt: &mut BTreeMap<i32, [i32; 4]>) {
  let tet = mesh.tetrahedron(t);
  let adj = tt.entry(t).or_insert([-1; 4]);
  for pos in 0..4 {
    if adj[pos] == -1 {
      faces.push(tet.face_tuple(pos, t));
    }
  }
}

/// Pair equal consecutive tuples and record the adjacency symmetrically.
fn pair_faces(faces: &mut Vec<FaceTuple>, tt: &mut BTreeMap<i32, [i32; 4]>) {
  sort_face_tuples(faces);
  let mut j = 0;
  while j + 1 < faces.len() {
    if faces[j].same_face(&faces[j + 1]) {
      let (x, y) = (faces[j], faces[j + 1]);
      if let Some(adj) = tt.get_mut(&x.tetra) {
        adj[x.face_pos as usize] = y.tetra;
      }
      if let Some(adj) = tt.get_mut(&y.tetra) {
        adj[y.face_pos as usize] = x.tetra;
      }
      j += 2;
    } else {
      j += 1;
    }
  }
}

/// Whole-leaf acceptance: the query box contains the leaf domain.
fn tt_leaf_add(
  n: &Node,
  mesh: &Mesh,
  tt: &mut BTreeMap<i32, [i32; 4]>,
  seen: &mut FixedBitSet,
) {
  let mut faces = Vec::new();
  for t in n.tetrahedra().iter() {
    seen.insert(t as usize);
    add_faces(t, &mut faces, mesh, tt);
  }
  pair_faces(&mut faces, tt);
}

fn tt_leaf_test(
  n: &Node,
  b: &Aabb3,
  mesh: &Mesh,
  tt: &mut BTreeMap<i32, [i32; 4]>,
  seen: &mut FixedBitSet,
) {
  use crate::tree::runs::RunEntry;
  use crate::tree::node::run_bounding_box;

  let mut faces = Vec::new();
  let mut candidate = |t: i32, faces: &mut Vec<FaceTuple>, tt: &mut BTreeMap<i32, [i32; 4]>, seen: &mut FixedBitSet| {
    let present = tt.contains_key(&t);
    if present || (!seen.contains(t as usize) && wrapper::tetra_in_box_query(t, b, mesh)) {
      add_faces(t, faces, mesh, tt);
    }
    seen.insert(t as usize);
  };
  for entry in n.tetrahedra().entries() {
    match entry {
      RunEntry::Run { first, last } => {
        let bb = run_bounding_box(first, last, mesh);
        if b.encloses(&bb) {
          for t in first..=last {
            seen.insert(t as usize);
            add_faces(t, &mut faces, mesh, tt);
          }
        } else if b.intersects(&bb) {
          for t in first..=last {
            candidate(t, &mut faces, tt, seen);
          }
        }
      }
      RunEntry::Single(t) => candidate(t, &mut faces, tt, seen),
    }
  }
  pair_faces(&mut faces, tt);
}

/// Linearized tetra-to-tetra adjacency along the segment `a -> b`.
///
/// Requires the one-shot face-orientation pass to have run on the tree.
pub fn linearized_tt(
  tree: &TetraTree,
  a: DVec3,
  b: DVec3,
) -> Result<BTreeMap<i32, [i32; 4]>, Error> {
  if !tree.faces_ordered() {
    return Err(Error::Precondition(
      "linearized TT needs order_faces() to have run on the tree",
    ));
  }
  let mut tt = BTreeMap::new();
  let mut seen = FixedBitSet::with_capacity(tree.mesh().num_tetrahedra() + 1);
  ltt_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    a,
    b,
    tree.mesh(),
    tree.subdivision(),
    &mut tt,
    &mut seen,
  );
  Ok(tt)
}

#[allow(clippy::too_many_arguments)]
fn ltt_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  a: DVec3,
  b: DVec3,
  mesh: &Mesh,
  subdivision: Subdivision,
  tt: &mut BTreeMap<i32, [i32; 4]>,
  seen: &mut FixedBitSet,
) {
  if !wrapper::segment_in_domain(a, b, dom) {
    return;
  }
  if n.is_leaf() {
    ltt_leaf(n, a, b, mesh, tt, seen);
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    ltt_node(child, &child_dom, level + 1, a, b, mesh, subdivision, tt, seen);
  }
}

fn ltt_leaf(
  n: &Node,
  a: DVec3,
  b: DVec3,
  mesh: &Mesh,
  tt: &mut BTreeMap<i32, [i32; 4]>,
  seen: &mut FixedBitSet,
) {
  use crate::tree::node::run_bounding_box;
  use crate::tree::runs::RunEntry;

  let mut faces = Vec::new();
  let mut candidate = |t: i32, faces: &mut Vec<FaceTuple>, tt: &mut BTreeMap<i32, [i32; 4]>, seen: &mut FixedBitSet| {
    let present = tt.contains_key(&t);
    if present || (!seen.contains(t as usize) && wrapper::segment_in_tetrahedron(a, b, t, mesh)) {
      add_faces(t, faces, mesh, tt);
    }
    seen.insert(t as usize);
  };
  for entry in n.tetrahedra().entries() {
    match entry {
      RunEntry::Run { first, last } => {
        let bb = run_bounding_box(first, last, mesh);
        if wrapper::segment_in_bounding_box(a, b, &bb) {
          for t in first..=last {
            candidate(t, &mut faces, tt, seen);
          }
        }
      }
      RunEntry::Single(t) => candidate(t, &mut faces, tt, seen),
    }
  }
  pair_faces(&mut faces, tt);
}

// --- batched TT ------------------------------------------------------------

/// Result of the batched TT extraction.
pub struct BatchedTt {
  /// The four face-neighbours of every tetrahedron, indexed by `t - 1`;
  /// `-1` marks a boundary face.
  pub adjacency: Vec<[i32; 4]>,
  /// Largest number of face tuples accumulated by a single leaf.
  pub max_leaf_faces: usize,
}

/// Batched tetra-to-tetra adjacency over the whole mesh.
pub fn batched_tt(tree: &TetraTree) -> BatchedTt {
  let mut out = BatchedTt {
    adjacency: vec![[-1; 4]; tree.mesh().num_tetrahedra()],
    max_leaf_faces: 0,
  };
  batched_tt_node(tree.root(), tree.mesh(), &mut out);
  out
}

fn batched_tt_node(n: &Node, mesh: &Mesh, out: &mut BatchedTt) {
  if n.is_leaf() {
    let mut faces = Vec::new();
    for t in n.tetrahedra().iter() {
      let tet = mesh.tetrahedron(t);
      for pos in 0..4 {
        if out.adjacency[(t - 1) as usize][pos] == -1 {
          faces.push(tet.face_tuple(pos, t));
        }
      }
    }
    sort_face_tuples(&mut faces);
    let mut j = 0;
    while j + 1 < faces.len() {
      if faces[j].same_face(&faces[j + 1]) {
        let (x, y) = (faces[j], faces[j + 1]);
        out.adjacency[(x.tetra - 1) as usize][x.face_pos as usize] = y.tetra;
        out.adjacency[(y.tetra - 1) as usize][y.face_pos as usize] = x.tetra;
        j += 2;
      } else {
        j += 1;
      }
    }
    out.max_leaf_faces = out.max_leaf_faces.max(faces.len());
    return;
  }
  for child in n.children() {
    batched_tt_node(child, mesh, out);
  }
}

// --- windowed distortion ---------------------------------------------------

/// Windowed discrete distortion: for every vertex inside the query box, the
/// angular defect of its star in the field-extended space (`4 pi` minus the
/// accumulated trihedral angles); border vertices instead get the 3D sum
/// minus the field-extended sum.
///
/// Requires the border checker to have run on the tree.
pub fn windowed_distortion(tree: &TetraTree, b: &Aabb3) -> Result<BTreeMap<i32, f64>, Error> {
  if !tree.borders_computed() {
    return Err(Error::Precondition(
      "windowed distortion needs compute_borders() to have run on the tree",
    ));
  }
  let mut dist = BTreeMap::new();
  distortion_node(
    tree.root(),
    tree.mesh().domain(),
    0,
    b,
    tree.mesh(),
    tree.subdivision(),
    ownership(tree),
    &mut dist,
  );
  Ok(dist)
}

#[allow(clippy::too_many_arguments)]
fn distortion_node(
  n: &Node,
  dom: &Aabb3,
  level: usize,
  b: &Aabb3,
  mesh: &Mesh,
  subdivision: Subdivision,
  ownership: Ownership,
  dist: &mut BTreeMap<i32, f64>,
) {
  if !dom.intersects(b) {
    return;
  }
  if n.is_leaf() {
    distortion_leaf(n, dom, b, mesh, ownership, dist);
    return;
  }
  for (i, child) in n.children().iter().enumerate() {
    let child_dom = subdivision.child_domain(dom, level, i);
    distortion_node(child, &child_dom, level + 1, b, mesh, subdivision, ownership, dist);
  }
}

fn distortion_leaf(
  n: &Node,
  dom: &Aabb3,
  b: &Aabb3,
  mesh: &Mesh,
  ownership: Ownership,
  dist: &mut BTreeMap<i32, f64>,
) {
  // Per owned-and-windowed vertex: incident tetrahedra, accumulated
  // field-extended angle, and whether any incident face is on the border.
  let mut vt: BTreeMap<i32, (Vec<i32>, f64, bool)> = BTreeMap::new();
  let domain_max = mesh.domain().max;
  let owned: Box<dyn Fn(i32) -> bool + '_> = match owned_range(n, dom, mesh, ownership) {
    Some((start, end)) => Box::new(move |v| v >= start && v < end),
    None => Box::new(move |v| dom.contains(mesh.vertex(v).pos, domain_max)),
  };

  for t in n.tetrahedra().iter() {
    let tet = mesh.tetrahedron(t);
    for pos in 0..4 {
      let v = tet.tv(pos);
      if !owned(v) || !b.contains_closed(mesh.vertex(v).pos) {
        continue;
      }
      let entry = vt.entry(v).or_insert((Vec::new(), 0.0, false));
      entry.0.push(t);
      entry.1 += distortion::trihedral_angle(tet, v, mesh);
      if !entry.2 && mesh.is_border_vertex_in(t, pos) {
        entry.2 = true;
      }
    }
  }

  for (v, (tetrahedra, sum_4d, is_border)) in vt {
    let value = if is_border {
      let sum_3d: f64 = tetrahedra
        .iter()
        .map(|&t| distortion::trihedral_angle_3d(mesh.tetrahedron(t), v, mesh))
        .sum();
      sum_3d - sum_4d
    } else {
      4.0 * PI - sum_4d
    };
    dist.insert(v, value);
  }
}

#[cfg(test)]
#[path = "topological_test.rs"]
mod topological_test;
