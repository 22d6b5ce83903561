//! Tree construction: the four leaf-overflow criteria over one insertion
//! skeleton.
//!
//! Every build inserts vertices first (criteria with a vertex threshold),
//! then tetrahedra. A vertex descends into the unique child containing it; a
//! tetrahedron descends into every child whose domain it touches with the
//! closed build-time test. A leaf that trips its criterion's threshold is
//! split: children are allocated, the payloads are moved out and re-inserted
//! through the now-interior node.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::geometry::wrapper;
use crate::mesh::{Aabb3, Mesh, VertexTetra};

use super::node::Node;
use super::subdivision::Subdivision;

/// The overflow rule family, without thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CriterionKind {
  /// Split on vertex overflow.
  Pr,
  /// Split on vertex overflow and on tetra overflow with the common-vertex
  /// escape.
  Pm,
  /// Split on tetra overflow with the common-vertex escape.
  Pm2,
  /// Split on tetra overflow, reinserting exactly once.
  Pmr,
}

impl CriterionKind {
  pub fn token(self) -> &'static str {
    match self {
      CriterionKind::Pr => "pr",
      CriterionKind::Pm => "pm",
      CriterionKind::Pm2 => "pm2",
      CriterionKind::Pmr => "pmr",
    }
  }
}

impl FromStr for CriterionKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Error> {
    match s {
      "pr" => Ok(CriterionKind::Pr),
      "pm" => Ok(CriterionKind::Pm),
      "pm2" => Ok(CriterionKind::Pm2),
      "pmr" => Ok(CriterionKind::Pmr),
      other => Err(Error::Config(format!(
        "unknown criterion '{other}', expected pr, pm, pm2 or pmr"
      ))),
    }
  }
}

/// A fully configured leaf-overflow criterion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
  Pr { max_vertices: usize },
  Pm { max_vertices: usize, max_tetrahedra: usize },
  Pm2 { max_tetrahedra: usize },
  Pmr { max_tetrahedra: usize },
}

impl Criterion {
  /// Combine a kind with the thresholds given on the command line, failing
  /// on a missing or zero threshold.
  pub fn from_kind(
    kind: CriterionKind,
    max_vertices: Option<usize>,
    max_tetrahedra: Option<usize>,
  ) -> Result<Self, Error> {
    let need_v = || {
      max_vertices
        .filter(|&v| v > 0)
        .ok_or_else(|| Error::Config(format!("criterion '{}' needs a vertex threshold", kind.token())))
    };
    let need_t = || {
      max_tetrahedra
        .filter(|&t| t > 0)
        .ok_or_else(|| Error::Config(format!("criterion '{}' needs a tetrahedra threshold", kind.token())))
    };
    Ok(match kind {
      CriterionKind::Pr => Criterion::Pr {
        max_vertices: need_v()?,
      },
      CriterionKind::Pm => Criterion::Pm {
        max_vertices: need_v()?,
        max_tetrahedra: need_t()?,
      },
      CriterionKind::Pm2 => Criterion::Pm2 {
        max_tetrahedra: need_t()?,
      },
      CriterionKind::Pmr => Criterion::Pmr {
        max_tetrahedra: need_t()?,
      },
    })
  }

  pub fn kind(&self) -> CriterionKind {
    match self {
      Criterion::Pr { .. } => CriterionKind::Pr,
      Criterion::Pm { .. } => CriterionKind::Pm,
      Criterion::Pm2 { .. } => CriterionKind::Pm2,
      Criterion::Pmr { .. } => CriterionKind::Pmr,
    }
  }

  /// Whether leaves carry explicit vertex sequences (the V node flavor).
  pub fn uses_vertex_lists(&self) -> bool {
    matches!(self, Criterion::Pr { .. } | Criterion::Pm { .. })
  }

  pub fn max_vertices(&self) -> Option<usize> {
    match *self {
      Criterion::Pr { max_vertices } | Criterion::Pm { max_vertices, .. } => Some(max_vertices),
      _ => None,
    }
  }

  pub fn max_tetrahedra(&self) -> Option<usize> {
    match *self {
      Criterion::Pm { max_tetrahedra, .. }
      | Criterion::Pm2 { max_tetrahedra }
      | Criterion::Pmr { max_tetrahedra } => Some(max_tetrahedra),
      _ => None,
    }
  }
}

impl fmt::Display for Criterion {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.kind().token())
  }
}

/// Shared context of one build.
pub(crate) struct Builder<'a> {
  pub mesh: &'a Mesh,
  pub subdivision: Subdivision,
  pub criterion: Criterion,
}

impl Builder<'_> {
  /// Run the full build into `root`.
  pub fn build(&self, root: &mut Node) {
    let domain = *self.mesh.domain();
    if self.criterion.uses_vertex_lists() {
      for v in self.mesh.vertex_ids() {
        self.insert_vertex(root, &domain, 0, v);
      }
    }
    for t in self.mesh.tetrahedron_ids() {
      self.insert_tetra(root, &domain, 0, t);
    }
  }

  fn insert_vertex(&self, n: &mut Node, dom: &Aabb3, level: usize, v: i32) {
    if n.is_leaf() {
      n.add_vertex(v);
      if self.vertex_overflow(n) {
        self.split(n, dom, level);
      }
      return;
    }
    let p = self.mesh.vertex(v).pos;
    let domain_max = self.mesh.domain().max;
    for i in 0..self.subdivision.arity() {
      let child_dom = self.subdivision.child_domain(dom, level, i);
      if child_dom.contains(p, domain_max) {
        self.insert_vertex(&mut n.children_mut()[i], &child_dom, level + 1, v);
        break;
      }
    }
  }

  fn insert_tetra(&self, n: &mut Node, dom: &Aabb3, level: usize, t: i32) {
    if !wrapper::tetra_in_box_build(t, dom, self.mesh) {
      return;
    }
    if n.is_leaf() {
      n.add_tetrahedron(t);
      match self.criterion {
        Criterion::Pr { .. } => {}
        Criterion::Pm { max_tetrahedra, .. } | Criterion::Pm2 { max_tetrahedra } => {
          if self.tetra_overflow_without_common_vertex(n, max_tetrahedra) {
            self.split(n, dom, level);
          }
        }
        Criterion::Pmr { max_tetrahedra } => {
          if n.tetrahedra().raw_len() > max_tetrahedra {
            self.split_reinsert_once(n, dom, level);
          }
        }
      }
      return;
    }
    for i in 0..self.subdivision.arity() {
      let child_dom = self.subdivision.child_domain(dom, level, i);
      self.insert_tetra(&mut n.children_mut()[i], &child_dom, level + 1, t);
    }
  }

  fn vertex_overflow(&self, n: &Node) -> bool {
    match self.criterion.max_vertices() {
      Some(max_vertices) => n.vertices().raw_len() > max_vertices,
      None => false,
    }
  }

  /// Tetra-threshold check with the common-vertex escape: a leaf whose
  /// tetrahedra all share one vertex is never split, which is what
  /// guarantees termination when many tetrahedra are incident in a point.
  fn tetra_overflow_without_common_vertex(&self, n: &Node, max_tetrahedra: usize) -> bool {
    let count = n.tetrahedra().raw_len();
    if count <= max_tetrahedra {
      return false;
    }
    let mut pairs = Vec::with_capacity(4 * count);
    for t in n.tetrahedra().iter() {
      let tet = self.mesh.tetrahedron(t);
      for pos in 0..4 {
        pairs.push(VertexTetra { v: tet.tv(pos), t });
      }
    }
    pairs.sort_unstable();
    let mut longest = 1usize;
    let mut current = 1usize;
    for w in pairs.windows(2) {
      if w[0].v == w[1].v {
        current += 1;
        longest = longest.max(current);
      } else {
        current = 1;
      }
    }
    longest != count
  }

  /// Split and re-insert through the node: children may recursively split in
  /// turn. Used by every criterion except the one-shot rule.
  fn split(&self, n: &mut Node, dom: &Aabb3, level: usize) {
    n.allocate_children(self.subdivision.arity());
    let vertices = n.take_vertices();
    let tetrahedra = n.take_tetrahedra();
    for v in vertices.iter() {
      self.insert_vertex(n, dom, level, v);
    }
    for t in tetrahedra.iter() {
      self.insert_tetra(n, dom, level, t);
    }
  }

  /// The one-shot split: each tetrahedron is re-inserted into the matching
  /// children exactly once, with no overflow check, so a child may legally
  /// end up above the threshold.
  fn split_reinsert_once(&self, n: &mut Node, dom: &Aabb3, level: usize) {
    n.allocate_children(self.subdivision.arity());
    let tetrahedra = n.take_tetrahedra();
    for i in 0..self.subdivision.arity() {
      let child_dom = self.subdivision.child_domain(dom, level, i);
      for t in tetrahedra.iter() {
        if wrapper::tetra_in_box_build(t, &child_dom, self.mesh) {
          n.children_mut()[i].add_tetrahedron(t);
        }
      }
    }
  }
}

#[cfg(test)]
#[path = "builder_test.rs"]
mod builder_test;
