//! `tt` - build tetrahedral-tree spatial indexes and run queries on them.
//!
//! Typical runs:
//!
//! ```text
//! tt -i mesh.ts -d ok -c pr -v 20 -s -r
//! tt -i mesh.ts -d kd -c pmr -t 40 -q box-mesh_box_0.05.bqin
//! tt -i mesh.ts -f mesh_ok_pr_v_20_.tree -q point-mesh_point.pqin
//! tt -i mesh.ts -g line-0.1-1000-near
//! ```

mod generator;
mod report;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use tetra_index::io;
use tetra_index::query::{self, QueryStats, QuerySummary};
use tetra_index::{index_stats, Criterion, CriterionKind, Subdivision, TetraTree};

use generator::GeneratorSpec;

/// Tetrahedral-tree index builder and query driver.
#[derive(Parser, Debug)]
#[command(name = "tt")]
#[command(about = "Spatial indexes over tetrahedral meshes")]
struct Args {
  /// Input mesh file (.ts).
  #[arg(short = 'i')]
  mesh: PathBuf,

  /// Load the tree from a .tree file; its name encodes the configuration.
  #[arg(short = 'f')]
  tree: Option<PathBuf>,

  /// Subdivision: ok (octree) or kd.
  #[arg(short = 'd')]
  division: Option<String>,

  /// Split criterion: pr, pm, pm2 or pmr.
  #[arg(short = 'c')]
  criterion: Option<String>,

  /// Maximum vertices per leaf (pr, pm).
  #[arg(short = 'v')]
  vertices_per_leaf: Option<usize>,

  /// Maximum tetrahedra per leaf (pm, pm2, pmr).
  #[arg(short = 't')]
  tetrahedra_per_leaf: Option<usize>,

  /// Run queries: <op>-<file> with op one of point, box, line, wvt, wdist,
  /// wtt, ltt; or the single token 'batch'.
  #[arg(short = 'q')]
  query: Option<String>,

  /// Generate query inputs: <kind>-<ratio>-<count>-<mode> with kind one of
  /// point, box, line and mode rand or near.
  #[arg(short = 'g')]
  generate: Option<String>,

  /// Print index statistics.
  #[arg(short = 's')]
  stats: bool,

  /// Spatially reindex the mesh and compress the leaf sequences.
  #[arg(short = 'r')]
  reindex: bool,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let args = Args::parse();

  // Input generation needs the mesh only.
  if let Some(spec) = &args.generate {
    let spec: GeneratorSpec = spec.parse()?;
    let mesh = io::read_mesh(&args.mesh).context("loading the mesh")?;
    let path = generator::generate(&mesh, &spec, &args.mesh)?;
    println!("wrote {}", path.display());
    return Ok(());
  }

  let (subdivision, criterion) = resolve_configuration(&args)?;
  let mesh = io::read_mesh(&args.mesh).context("loading the mesh")?;

  let mut tree = match &args.tree {
    Some(tree_path) => {
      let start = Instant::now();
      let tree = io::read_tree(tree_path, mesh, subdivision, criterion)
        .context("loading the tree file")?;
      info!(elapsed = ?start.elapsed(), "tree loaded");
      tree
    }
    None => {
      let start = Instant::now();
      let tree = TetraTree::build(mesh, subdivision, criterion)?;
      info!(elapsed = ?start.elapsed(), "tree built");
      let out = PathBuf::from(io::tree_filename(&args.mesh, subdivision, &criterion));
      io::write_tree(&tree, &out).context("writing the tree file")?;
      info!(path = %out.display(), "tree written");
      tree
    }
  };

  if args.reindex {
    let start = Instant::now();
    tree.reindex()?;
    info!(elapsed = ?start.elapsed(), "mesh and index reindexed");
  }

  if args.stats {
    println!("{}", index_stats(&tree));
  }

  if let Some(query) = &args.query {
    run_queries(&mut tree, query)?;
  }

  Ok(())
}

/// Resolve subdivision and criterion from the command line, letting a tree
/// file name override when one is loaded.
fn resolve_configuration(args: &Args) -> Result<(Subdivision, Criterion)> {
  let mut division = args.division.clone();
  let mut kind = args.criterion.clone();
  let mut kv = args.vertices_per_leaf;
  let mut kt = args.tetrahedra_per_leaf;

  if let Some(tree_path) = &args.tree {
    let config = io::parse_tree_filename(tree_path);
    if let Some(sub) = config.subdivision {
      division = Some(sub.token().to_string());
    }
    if let Some(found) = config.criterion {
      kind = Some(found.token().to_string());
    }
    kv = config.max_vertices.or(kv);
    kt = config.max_tetrahedra.or(kt);
  }

  let Some(division) = division else {
    bail!("missing subdivision: pass -d ok|kd");
  };
  let Some(kind) = kind else {
    bail!("missing criterion: pass -c pr|pm|pm2|pmr");
  };
  let subdivision: Subdivision = division.parse()?;
  let kind: CriterionKind = kind.parse()?;
  let criterion = Criterion::from_kind(kind, kv, kt)?;
  Ok((subdivision, criterion))
}

fn run_queries(tree: &mut TetraTree, query: &str) -> Result<()> {
  if query == "batch" {
    return run_batched(tree);
  }
  let Some((op, file)) = query.split_once('-') else {
    bail!("expected <op>-<file>, got '{query}'");
  };
  let path = PathBuf::from(file);
  match op {
    "point" => run_point_queries(tree, &path),
    "box" => run_box_queries(tree, &path),
    "line" => run_line_queries(tree, &path),
    "wvt" => run_windowed_vt(tree, &path),
    "wdist" => run_windowed_distortion(tree, &path),
    "wtt" => run_windowed_tt(tree, &path),
    "ltt" => run_linearized_tt(tree, &path),
    other => bail!("unknown query op '{other}'"),
  }
}

fn run_point_queries(tree: &TetraTree, path: &PathBuf) -> Result<()> {
  let points = io::read_points(path)?;
  let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
  let mut summary = QuerySummary::default();
  let start = Instant::now();
  for (i, &p) in points.iter().enumerate() {
    stats.reset();
    match query::locate_point(tree, p, &mut stats) {
      Some(t) => println!("point {i}: tetrahedron {t}"),
      None => println!("point {i}: not in the mesh"),
    }
    summary.record(&stats);
  }
  info!(elapsed = ?start.elapsed(), queries = points.len(), "point locations done");
  report::print_query_summary(&summary);
  Ok(())
}

fn run_box_queries(tree: &TetraTree, path: &PathBuf) -> Result<()> {
  let boxes = io::read_boxes(path)?;
  let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
  let mut summary = QuerySummary::default();
  let start = Instant::now();
  for (i, b) in boxes.iter().enumerate() {
    stats.reset();
    query::box_query(tree, b, &mut stats);
    println!("{} tetrahedra intersect box {i}", stats.results.len());
    summary.record(&stats);
  }
  info!(elapsed = ?start.elapsed(), queries = boxes.len(), "box queries done");
  report::print_query_summary(&summary);
  Ok(())
}

fn run_line_queries(tree: &mut TetraTree, path: &PathBuf) -> Result<()> {
  let segments = io::read_segments(path)?;
  // The segment-vs-tetrahedron test needs consistently oriented faces.
  tree.order_faces();
  let mut stats = QueryStats::new(tree.mesh().num_tetrahedra());
  let mut summary = QuerySummary::default();
  let start = Instant::now();
  for (i, &(a, b)) in segments.iter().enumerate() {
    stats.reset();
    query::line_query(tree, a, b, &mut stats)?;
    println!("{} tetrahedra intersect line {i}", stats.results.len());
    summary.record(&stats);
  }
  info!(elapsed = ?start.elapsed(), queries = segments.len(), "line queries done");
  report::print_query_summary(&summary);
  Ok(())
}

fn run_windowed_vt(tree: &TetraTree, path: &PathBuf) -> Result<()> {
  let boxes = io::read_boxes(path)?;
  let start = Instant::now();
  for (i, b) in boxes.iter().enumerate() {
    let vt = query::windowed_vt(tree, b);
    println!("box {i}: VT for {} vertices", vt.len());
  }
  info!(elapsed = ?start.elapsed(), queries = boxes.len(), "windowed VT done");
  Ok(())
}

fn run_windowed_distortion(tree: &mut TetraTree, path: &PathBuf) -> Result<()> {
  let boxes = io::read_boxes(path)?;
  let start = Instant::now();
  query::compute_borders(tree);
  info!(elapsed = ?start.elapsed(), "mesh borders computed");
  let start = Instant::now();
  for (i, b) in boxes.iter().enumerate() {
    let dist = query::windowed_distortion(tree, b)?;
    println!("box {i}: distortion for {} vertices", dist.len());
  }
  info!(elapsed = ?start.elapsed(), queries = boxes.len(), "windowed distortion done");
  Ok(())
}

fn run_windowed_tt(tree: &TetraTree, path: &PathBuf) -> Result<()> {
  let boxes = io::read_boxes(path)?;
  let start = Instant::now();
  for (i, b) in boxes.iter().enumerate() {
    let tt = query::windowed_tt(tree, b);
    println!("box {i}: adjacency for {} tetrahedra", tt.len());
  }
  info!(elapsed = ?start.elapsed(), queries = boxes.len(), "windowed TT done");
  Ok(())
}

fn run_linearized_tt(tree: &mut TetraTree, path: &PathBuf) -> Result<()> {
  let segments = io::read_segments(path)?;
  tree.order_faces();
  let start = Instant::now();
  for (i, &(a, b)) in segments.iter().enumerate() {
    let tt = query::linearized_tt(tree, a, b)?;
    println!("line {i}: adjacency for {} tetrahedra", tt.len());
  }
  info!(elapsed = ?start.elapsed(), queries = segments.len(), "linearized TT done");
  Ok(())
}


fn run_batched(tree: &TetraTree) -> Result<()> {
  let start = Instant::now();
  let vt = query::batched_vt(tree);
  info!(
    elapsed = ?start.elapsed(),
    max_leaf_entries = vt.max_leaf_entries,
    "batched VT done"
  );
  println!(
    "batched VT: {} vertices, largest leaf holds {} entries",
    vt.lists.len(),
    vt.max_leaf_entries
  );

  let start = Instant::now();
  let tt = query::batched_tt(tree);
  info!(
    elapsed = ?start.elapsed(),
    max_leaf_faces = tt.max_leaf_faces,
    "batched TT done"
  );
  let boundary_faces = tt
    .adjacency
    .iter()
    .flat_map(|adj| adj.iter())
    .filter(|&&n| n == -1)
    .count();
  println!(
    "batched TT: {} tetrahedra, {} boundary faces",
    tt.adjacency.len(),
    boundary_faces
  );
  Ok(())
}
