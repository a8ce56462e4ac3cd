//! Resolved project layout shared by every planning stage.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Absolute locations of the project's source and output directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
  /// Project root every other path was resolved against.
  pub project_root: PathBuf,
  /// Root of authored sources.
  pub source_root: PathBuf,
  /// Directory scanned for page entries.
  pub pages_root: PathBuf,
  /// Directory holding fragment templates.
  pub template_root: PathBuf,
  /// Directory holding shared stylesheets.
  pub styles_root: PathBuf,
  /// Directory holding images and fonts.
  pub images_root: PathBuf,
  /// Support-library directory copied verbatim.
  pub lib_root: PathBuf,
  /// Build output root.
  pub output_root: PathBuf,
  /// Name of the copied support-library directory inside the output root.
  pub lib_output_dir: String,
  /// File name marking a page entry.
  pub entry_file: String,
  /// Template extension without the leading dot.
  pub template_extension: String,
}

/// Symbolic import root the bundler resolves before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
  /// Import prefix, e.g. `@styles`.
  pub name: &'static str,
  /// Directory the prefix stands for.
  pub target: PathBuf,
}

impl ProjectLayout {
  /// The fixed alias map, in declaration order.
  pub fn aliases(&self) -> Vec<Alias> {
    vec![
      Alias {
        name: "@",
        target: self.source_root.clone(),
      },
      Alias {
        name: "@styles",
        target: self.styles_root.clone(),
      },
      Alias {
        name: "@images",
        target: self.images_root.clone(),
      },
      Alias {
        name: "@pages",
        target: self.pages_root.clone(),
      },
      Alias {
        name: "@tpl",
        target: self.template_root.clone(),
      },
    ]
  }

  /// Resolve an aliased import specifier such as `@styles/base.css`.
  ///
  /// Returns `None` when the specifier does not start with a known alias.
  pub fn resolve_alias(&self, specifier: &str) -> Option<PathBuf> {
    self.aliases().into_iter().find_map(|alias| {
      let rest = specifier.strip_prefix(alias.name)?;
      if rest.is_empty() {
        Some(alias.target)
      } else {
        rest
          .strip_prefix('/')
          .map(|tail| alias.target.join(tail))
      }
    })
  }

  /// Project-relative, forward-slash form of `path`, used for stable identifiers.
  pub fn project_relative(&self, path: &Path) -> String {
    let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
    relative
      .to_string_lossy()
      .replace('\\', "/")
      .trim_start_matches('/')
      .to_string()
  }
}
