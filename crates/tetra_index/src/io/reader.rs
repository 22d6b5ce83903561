//! ASCII readers: `.ts` meshes, query-input files and serialized trees.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glam::DVec3;

use crate::error::Error;
use crate::mesh::{Aabb3, Mesh, Tetrahedron, Vertex};
use crate::tree::node::Node;
use crate::tree::{Criterion, Subdivision, TetraTree};

/// Numbered, non-blank lines of a text file.
struct Lines {
  path: std::path::PathBuf,
  inner: std::io::Lines<BufReader<File>>,
  line: usize,
}

impl Lines {
  fn open(path: &Path) -> Result<Self, Error> {
    let file = File::open(path)?;
    Ok(Self {
      path: path.to_path_buf(),
      inner: BufReader::new(file).lines(),
      line: 0,
    })
  }

  /// Next non-blank line, or an error mentioning `expected`.
  fn expect(&mut self, expected: &str) -> Result<String, Error> {
    loop {
      self.line += 1;
      match self.inner.next() {
        None => {
          return Err(Error::invalid_input(
            &self.path,
            self.line,
            format!("unexpected end of file, expected {expected}"),
          ))
        }
        Some(line) => {
          let line = line?;
          if !line.trim().is_empty() {
            return Ok(line);
          }
        }
      }
    }
  }

  /// Next non-blank line, if any.
  fn next(&mut self) -> Result<Option<String>, Error> {
    loop {
      self.line += 1;
      match self.inner.next() {
        None => return Ok(None),
        Some(line) => {
          let line = line?;
          if !line.trim().is_empty() {
            return Ok(Some(line));
          }
        }
      }
    }
  }

  fn error(&self, message: impl Into<String>) -> Error {
    Error::invalid_input(&self.path, self.line, message)
  }

  fn parse_numbers<T: std::str::FromStr>(&self, line: &str, count: usize) -> Result<Vec<T>, Error> {
    let values: Result<Vec<T>, _> = line.split_whitespace().take(count).map(str::parse).collect();
    match values {
      Ok(v) if v.len() == count => Ok(v),
      _ => Err(self.error(format!("expected {count} numeric fields, got '{line}'"))),
    }
  }
}

/// Read a `.ts` tetrahedral mesh.
///
/// First line: vertex and tetrahedron counts. Then one `x y z field` line
/// per vertex and one line of four 0-based vertex indices per tetrahedron
/// (stored 1-based). The domain grows around the vertices as they load.
pub fn read_mesh(path: &Path) -> Result<Mesh, Error> {
  let mut lines = Lines::open(path)?;
  let header = lines.expect("the vertex and tetrahedron counts")?;
  let counts: Vec<usize> = lines.parse_numbers(&header, 2)?;
  let (num_vertices, num_tetrahedra) = (counts[0], counts[1]);
  if num_vertices == 0 || num_tetrahedra == 0 {
    return Err(lines.error("not a valid .ts file: zero vertices or tetrahedra"));
  }

  let mut mesh = Mesh::with_capacity(num_vertices, num_tetrahedra);
  for _ in 0..num_vertices {
    let line = lines.expect("a vertex line")?;
    let c: Vec<f64> = lines.parse_numbers(&line, 4)?;
    mesh.push_vertex(Vertex::new(c[0], c[1], c[2], c[3]));
  }
  for _ in 0..num_tetrahedra {
    let line = lines.expect("a tetrahedron line")?;
    let ids: Vec<i64> = lines.parse_numbers(&line, 4)?;
    for &id in &ids {
      if id < 0 || id >= num_vertices as i64 {
        return Err(lines.error(format!("vertex index {id} out of range 0..{num_vertices}")));
      }
    }
    mesh.push_tetrahedron(Tetrahedron::new(
      ids[0] as i32 + 1,
      ids[1] as i32 + 1,
      ids[2] as i32 + 1,
      ids[3] as i32 + 1,
    ));
  }
  mesh.validate()?;
  Ok(mesh)
}

/// Read a point-query input: a count line, then one `x y z` line per point.
pub fn read_points(path: &Path) -> Result<Vec<DVec3>, Error> {
  let mut lines = Lines::open(path)?;
  let header = lines.expect("the point count")?;
  let count: Vec<usize> = lines.parse_numbers(&header, 1)?;
  let mut points = Vec::with_capacity(count[0]);
  for _ in 0..count[0] {
    let line = lines.expect("a point line")?;
    let c: Vec<f64> = lines.parse_numbers(&line, 3)?;
    points.push(DVec3::new(c[0], c[1], c[2]));
  }
  Ok(points)
}

/// Read a box-query input: a count line, then one `x1 y1 z1 x2 y2 z2` line
/// per box. Boxes must satisfy the min/max invariant.
pub fn read_boxes(path: &Path) -> Result<Vec<Aabb3>, Error> {
  let mut boxes = Vec::new();
  for (a, b) in read_segments(path)? {
    if a.x > b.x || a.y > b.y || a.z > b.z {
      return Err(Error::invalid_input(
        path,
        0,
        format!("box with min {a:?} beyond max {b:?}"),
      ));
    }
    boxes.push(Aabb3::new(a, b));
  }
  Ok(boxes)
}

/// Read a segment-query input: same layout as boxes, endpoints unordered.
pub fn read_segments(path: &Path) -> Result<Vec<(DVec3, DVec3)>, Error> {
  let mut lines = Lines::open(path)?;
  let header = lines.expect("the entry count")?;
  let count: Vec<usize> = lines.parse_numbers(&header, 1)?;
  let mut segments = Vec::with_capacity(count[0]);
  for _ in 0..count[0] {
    let line = lines.expect("an endpoint line")?;
    let c: Vec<f64> = lines.parse_numbers(&line, 6)?;
    segments.push((DVec3::new(c[0], c[1], c[2]), DVec3::new(c[3], c[4], c[5])));
  }
  Ok(segments)
}

/// One node of a serialized tree.
enum Record {
  Interior,
  Leaf { vertices: Vec<i32>, tetrahedra: Vec<i32> },
}

/// Read a `.tree` hierarchy and attach it to `mesh`.
///
/// The file stores nodes in BFS order: `N` for interior nodes, `L` with the
/// payload counts (and the expanded id lines) for leaves. The subdivision
/// and criterion must match the ones encoded in the file name; they decide
/// the arity and whether leaves carry vertex sequences.
pub fn read_tree(
  path: &Path,
  mesh: Mesh,
  subdivision: Subdivision,
  criterion: Criterion,
) -> Result<TetraTree, Error> {
  let mut lines = Lines::open(path)?;
  let with_vertices = criterion.uses_vertex_lists();
  let mut records = Vec::new();
  while let Some(line) = lines.next()? {
    let mut tokens = line.split_whitespace();
    match tokens.next() {
      Some("N") => records.push(Record::Interior),
      Some("L") => records.push(read_leaf(&mut lines, tokens, with_vertices)?),
      Some(other) => return Err(lines.error(format!("expected 'N' or 'L', got '{other}'"))),
      None => unreachable!("blank lines are skipped"),
    }
  }
  if records.is_empty() {
    return Err(lines.error("empty tree file"));
  }

  // In BFS order, each interior record claims the next `arity` records as
  // its children.
  let arity = subdivision.arity();
  let mut first_child = vec![0usize; records.len()];
  let mut next = 1usize;
  for (i, record) in records.iter().enumerate() {
    if matches!(record, Record::Interior) {
      first_child[i] = next;
      next += arity;
    }
  }
  if next != records.len() {
    return Err(lines.error(format!(
      "malformed tree: {} nodes but BFS layout implies {next}",
      records.len()
    )));
  }

  let root = build_node(0, &records, &first_child, arity);
  Ok(TetraTree::from_parts(mesh, root, subdivision, criterion))
}

fn build_node(i: usize, records: &[Record], first_child: &[usize], arity: usize) -> Node {
  match &records[i] {
    Record::Interior => {
      let mut n = Node::leaf();
      n.allocate_children(arity);
      for k in 0..arity {
        n.children_mut()[k] = build_node(first_child[i] + k, records, first_child, arity);
      }
      n
    }
    Record::Leaf {
      vertices,
      tetrahedra,
    } => {
      let mut n = Node::leaf();
      for &v in vertices {
        n.add_vertex(v);
      }
      for &t in tetrahedra {
        n.add_tetrahedron(t);
      }
      n
    }
  }
}

fn read_leaf(
  lines: &mut Lines,
  mut tokens: std::str::SplitWhitespace<'_>,
  with_vertices: bool,
) -> Result<Record, Error> {
  let mut next_count = |what: &str| -> Result<usize, Error> {
    tokens
      .next()
      .and_then(|t| t.parse().ok())
      .ok_or_else(|| lines.error(format!("leaf line misses the {what} count")))
  };
  let num_vertices = if with_vertices { next_count("vertex")? } else { 0 };
  let num_tetrahedra = next_count("tetrahedron")?;

  let mut vertices = Vec::with_capacity(num_vertices);
  if num_vertices > 0 {
    let line = lines.expect("a 'V' id line")?;
    vertices = parse_id_line(lines, &line, "V", num_vertices)?;
  }
  let mut tetrahedra = Vec::with_capacity(num_tetrahedra);
  if num_tetrahedra > 0 {
    let line = lines.expect("a 'T' id line")?;
    tetrahedra = parse_id_line(lines, &line, "T", num_tetrahedra)?;
  }
  Ok(Record::Leaf {
    vertices,
    tetrahedra,
  })
}

fn parse_id_line(
  lines: &Lines,
  line: &str,
  tag: &str,
  count: usize,
) -> Result<Vec<i32>, Error> {
  let mut tokens = line.split_whitespace();
  if tokens.next() != Some(tag) {
    return Err(lines.error(format!("expected a '{tag}' id line, got '{line}'")));
  }
  let ids: Result<Vec<i32>, _> = tokens.map(str::parse).collect();
  match ids {
    Ok(ids) if ids.len() == count && ids.iter().all(|&id| id > 0) => Ok(ids),
    _ => Err(lines.error(format!("expected {count} positive ids after '{tag}'"))),
  }
}
