//! Query-input generation: random or centroid-anchored points, boxes and
//! segments over the mesh domain, written in the query-input file formats.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use glam::DVec3;
use rand::Rng;

use tetra_index::geometry::wrapper;
use tetra_index::io;
use tetra_index::mesh::Mesh;

/// What to generate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
  Point,
  Box,
  Line,
}

/// Where to anchor the generated shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
  /// Uniformly random within the domain.
  Rand,
  /// Anchored at the centroid of a randomly chosen tetrahedron.
  Near,
}

/// A parsed `-g <kind>-<ratio>-<count>-<mode>` request.
#[derive(Clone, Copy, Debug)]
pub struct GeneratorSpec {
  pub kind: Kind,
  /// Shape size as a fraction of the domain diagonal; must be 0 for points
  /// and positive otherwise.
  pub ratio: f64,
  pub count: usize,
  pub mode: Mode,
}

impl FromStr for GeneratorSpec {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    let tokens: Vec<&str> = s.split('-').collect();
    let [kind, ratio, count, mode] = tokens.as_slice() else {
      bail!("expected <kind>-<ratio>-<count>-<mode>, got '{s}'");
    };
    let kind = match *kind {
      "point" => Kind::Point,
      "box" => Kind::Box,
      "line" => Kind::Line,
      other => bail!("unknown input kind '{other}'"),
    };
    let ratio: f64 = ratio.parse().with_context(|| format!("bad ratio in '{s}'"))?;
    let count: usize = count.parse().with_context(|| format!("bad count in '{s}'"))?;
    let mode = match *mode {
      "rand" => Mode::Rand,
      "near" => Mode::Near,
      other => bail!("unknown generation mode '{other}'"),
    };
    match kind {
      Kind::Point if ratio != 0.0 => bail!("point inputs take a zero ratio"),
      Kind::Box | Kind::Line if ratio <= 0.0 => bail!("box and line inputs need a positive ratio"),
      _ => {}
    }
    if count == 0 {
      bail!("the input count must be positive");
    }
    Ok(Self {
      kind,
      ratio,
      count,
      mode,
    })
  }
}

/// Upper bound on generation attempts before giving up; a tiny mesh cannot
/// yield an unbounded number of distinct centroids.
const MAX_ATTEMPTS_PER_ENTRY: usize = 10_000;

/// Generate the requested inputs next to the working directory, named after
/// the mesh file.
pub fn generate(mesh: &Mesh, spec: &GeneratorSpec, mesh_path: &Path) -> Result<PathBuf> {
  let stem = mesh_path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| "mesh".to_string());
  let edge = mesh.domain().diagonal() * spec.ratio;

  match spec.kind {
    Kind::Point => {
      let points = generate_points(mesh, spec)?;
      let path = PathBuf::from(format!("{stem}_point.pqin"));
      io::write_points(&points, &path)?;
      Ok(path)
    }
    Kind::Box => {
      let boxes = generate_segments(mesh, spec, edge, false)?;
      let path = PathBuf::from(format!("{stem}_box_{}.bqin", spec.ratio));
      io::write_segments(&boxes, &path)?;
      Ok(path)
    }
    Kind::Line => {
      let lines = generate_segments(mesh, spec, edge, true)?;
      let path = PathBuf::from(format!("{stem}_line_{}.lqin", spec.ratio));
      io::write_segments(&lines, &path)?;
      Ok(path)
    }
  }
}

fn generate_points(mesh: &Mesh, spec: &GeneratorSpec) -> Result<Vec<DVec3>> {
  let mut rng = rand::thread_rng();
  let mut seen = HashSet::new();
  let mut points = Vec::with_capacity(spec.count);
  let mut attempts = 0usize;
  while points.len() < spec.count {
    attempts += 1;
    if attempts > spec.count * MAX_ATTEMPTS_PER_ENTRY {
      bail!("could not generate {} distinct points", spec.count);
    }
    let p = match spec.mode {
      Mode::Rand => random_point(&mut rng, mesh),
      Mode::Near => {
        let t = rng.gen_range(1..=mesh.num_tetrahedra() as i32);
        let centroid = wrapper::tetrahedron_centroid(t, mesh);
        if !mesh.domain().contains_closed(centroid) {
          continue;
        }
        centroid
      }
    };
    if seen.insert(bits(p)) {
      points.push(p);
    }
  }
  Ok(points)
}

fn generate_segments(
  mesh: &Mesh,
  spec: &GeneratorSpec,
  edge: f64,
  oriented: bool,
) -> Result<Vec<(DVec3, DVec3)>> {
  let mut rng = rand::thread_rng();
  let mut seen = HashSet::new();
  let mut entries = Vec::with_capacity(spec.count);
  let mut attempts = 0usize;
  while entries.len() < spec.count {
    attempts += 1;
    if attempts > spec.count * MAX_ATTEMPTS_PER_ENTRY {
      bail!("could not generate {} distinct inputs", spec.count);
    }
    let min = match spec.mode {
      Mode::Rand => random_point(&mut rng, mesh),
      Mode::Near => {
        let t = rng.gen_range(1..=mesh.num_tetrahedra() as i32);
        wrapper::tetrahedron_centroid(t, mesh)
      }
    };
    let offset = if oriented {
      // A random direction in the positive octant keeps max above min.
      DVec3::new(rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()) * edge
    } else {
      DVec3::splat(edge)
    };
    let max = min + offset;
    if !mesh.domain().contains_closed(max) {
      continue;
    }
    if seen.insert((bits(min), bits(max))) {
      entries.push((min, max));
    }
  }
  Ok(entries)
}

fn random_point(rng: &mut impl Rng, mesh: &Mesh) -> DVec3 {
  let dom = mesh.domain();
  DVec3::new(
    rng.gen_range(dom.min.x..=dom.max.x),
    rng.gen_range(dom.min.y..=dom.max.y),
    rng.gen_range(dom.min.z..=dom.max.z),
  )
}

fn bits(p: DVec3) -> [u64; 3] {
  [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}
