//! Library error type.
//!
//! Four failure families cross the public boundary: I/O, malformed input,
//! invalid configuration, and violated operation preconditions. Numeric
//! degeneracy never surfaces as an error; the geometric tolerance absorbs it.

use std::path::PathBuf;

/// Errors returned by the public API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  /// Malformed mesh, query or tree file.
  #[error("invalid input in {path} (line {line}): {message}")]
  InvalidInput {
    path: PathBuf,
    line: usize,
    message: String,
  },

  /// Mesh content violating a structural invariant.
  #[error("invalid mesh: {0}")]
  InvalidMesh(String),

  /// Threshold/criterion combination that cannot drive a build.
  #[error("configuration error: {0}")]
  Config(String),

  /// An operation was invoked before its prerequisite pass ran.
  #[error("precondition violated: {0}")]
  Precondition(&'static str),
}

impl Error {
  pub(crate) fn invalid_input(
    path: impl Into<PathBuf>,
    line: usize,
    message: impl Into<String>,
  ) -> Self {
    Error::InvalidInput {
      path: path.into(),
      line,
      message: message.into(),
    }
  }
}
