//! Tree file names encode the index configuration, so a loader can
//! reconstruct subdivision, criterion and thresholds from the name alone.
//!
//! Layout: `<mesh>_<ok|kd>_<pr|pm|pm2|pmr>[_v_<kv>][_t_<kt>]_.tree`, with
//! the threshold tokens present exactly when the criterion uses them.

use std::path::Path;

use crate::tree::{Criterion, CriterionKind, Subdivision};

/// Configuration recovered from a `.tree` file name. Missing tokens stay
/// `None` and must be supplied on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeFileConfig {
  pub subdivision: Option<Subdivision>,
  pub criterion: Option<CriterionKind>,
  pub max_vertices: Option<usize>,
  pub max_tetrahedra: Option<usize>,
}

/// Build the canonical tree file name for a mesh and configuration.
pub fn tree_filename(mesh_path: &Path, subdivision: Subdivision, criterion: &Criterion) -> String {
  let stem = mesh_path
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| "mesh".to_string());
  let mut name = format!("{stem}_{}_{}", subdivision.token(), criterion.kind().token());
  if let Some(kv) = criterion.max_vertices() {
    name.push_str(&format!("_v_{kv}"));
  }
  if let Some(kt) = criterion.max_tetrahedra() {
    name.push_str(&format!("_t_{kt}"));
  }
  name.push_str("_.tree");
  name
}

/// Recover the configuration tokens from a tree file name.
pub fn parse_tree_filename(path: &Path) -> TreeFileConfig {
  let mut config = TreeFileConfig::default();
  let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
    return config;
  };
  let tokens: Vec<&str> = stem.split('_').collect();
  for (i, token) in tokens.iter().enumerate() {
    match *token {
      "ok" | "kd" => config.subdivision = token.parse().ok(),
      "pr" | "pm" | "pm2" | "pmr" => config.criterion = token.parse().ok(),
      "v" => config.max_vertices = tokens.get(i + 1).and_then(|t| t.parse().ok()),
      "t" => config.max_tetrahedra = tokens.get(i + 1).and_then(|t| t.parse().ok()),
      _ => {}
    }
  }
  config
}
