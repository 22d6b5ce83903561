//! ASCII writers: serialized trees and query-input files.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::DVec3;

use crate::error::Error;
use crate::tree::node::Node;
use crate::tree::TetraTree;

/// Write the tree hierarchy in BFS order.
///
/// Interior nodes serialize as `N`; leaves as `L` with their payload counts
/// followed by the expanded id lines (`V` for vertices on trees carrying
/// vertex lists, `T` for tetrahedra). Children are visited in index order.
pub fn write_tree(tree: &TetraTree, path: &Path) -> Result<(), Error> {
  let mut out = BufWriter::new(File::create(path)?);
  let with_vertices = tree.criterion().uses_vertex_lists();
  let mut queue: VecDeque<&Node> = VecDeque::new();
  queue.push_back(tree.root());
  while let Some(n) = queue.pop_front() {
    if n.is_leaf() {
      write_leaf(&mut out, n, with_vertices)?;
    } else {
      writeln!(out, "N")?;
      queue.extend(n.children());
    }
  }
  out.flush()?;
  Ok(())
}

fn write_leaf(out: &mut impl Write, n: &Node, with_vertices: bool) -> Result<(), Error> {
  let num_vertices = n.vertices().count();
  let num_tetrahedra = n.tetrahedra().count();
  if with_vertices {
    writeln!(out, "L {num_vertices} {num_tetrahedra}")?;
  } else {
    writeln!(out, "L {num_tetrahedra}")?;
  }
  if with_vertices && num_vertices > 0 {
    write_id_line(out, "V", n.vertices().iter())?;
  }
  if num_tetrahedra > 0 {
    write_id_line(out, "T", n.tetrahedra().iter())?;
  }
  Ok(())
}

fn write_id_line(
  out: &mut impl Write,
  tag: &str,
  ids: impl Iterator<Item = i32>,
) -> Result<(), Error> {
  write!(out, "  {tag}")?;
  for id in ids {
    write!(out, " {id}")?;
  }
  writeln!(out)?;
  Ok(())
}

/// Write a point-query input file.
pub fn write_points(points: &[DVec3], path: &Path) -> Result<(), Error> {
  let mut out = BufWriter::new(File::create(path)?);
  writeln!(out, "{}", points.len())?;
  for p in points {
    writeln!(out, "{} {} {}", p.x, p.y, p.z)?;
  }
  out.flush()?;
  Ok(())
}

/// Write a box- or segment-query input file (two endpoints per line).
pub fn write_segments(segments: &[(DVec3, DVec3)], path: &Path) -> Result<(), Error> {
  let mut out = BufWriter::new(File::create(path)?);
  writeln!(out, "{}", segments.len())?;
  for (a, b) in segments {
    writeln!(out, "{} {} {} {} {} {}", a.x, a.y, a.z, b.x, b.y, b.z)?;
  }
  out.flush()?;
  Ok(())
}
