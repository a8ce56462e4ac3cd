//! Error kinds raised while deriving a build configuration.
//!
//! Every variant is fatal: the generator never returns a partial configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the crate.
pub type PlanResult<T> = Result<T, PlanError>;

/// Failures that abort configuration generation.
#[derive(Debug, Error)]
pub enum PlanError {
  /// The page source root is missing, not a directory or unreadable.
  #[error("cannot discover pages under {}: {reason}", .root.display())]
  Discovery {
    /// Source root that was scanned.
    root: PathBuf,
    /// Human readable cause.
    reason: String,
  },

  /// A page script failed the configured lint checks.
  #[error("lint failed for page '{page}' ({} violation(s)):\n{}", .violations.len(), .violations.join("\n"))]
  Lint {
    /// Identifier of the offending page.
    page: String,
    /// Rendered violations, one per line.
    violations: Vec<String>,
  },

  /// A page entry has no co-located markup template.
  #[error("page '{page}' has no template at {}", .template.display())]
  MissingTemplate {
    /// Identifier of the page.
    page: String,
    /// Expected template location.
    template: PathBuf,
  },

  /// Two page entries normalise to the same identifier.
  #[error("pages {} and {} both map to id '{id}'", .first.display(), .second.display())]
  DuplicateId {
    /// Colliding identifier.
    id: String,
    /// Entry that claimed the identifier first.
    first: PathBuf,
    /// Entry that collided with it.
    second: PathBuf,
  },

  /// A template lives outside both recognised template roots.
  #[error("template {} is outside the page and fragment template directories", .path.display())]
  UnroutedTemplate {
    /// Template path.
    path: PathBuf,
  },

  /// A policy value is out of its legal range.
  #[error("invalid policy: {0}")]
  InvalidPolicy(String),

  /// The project configuration file could not be parsed.
  #[error("failed to parse {}: {reason}", .path.display())]
  Config {
    /// Configuration file.
    path: PathBuf,
    /// Parser message.
    reason: String,
  },

  /// Filesystem access failed while reading sources.
  #[error("failed to read {}: {source}", .path.display())]
  Io {
    /// Path being read.
    path: PathBuf,
    /// Underlying I/O error.
    #[source]
    source: std::io::Error,
  },
}

impl PlanError {
  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }
}
