//! Page entry discovery.

use std::path::{Component, Path, PathBuf};

use log::debug;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{PlanError, PlanResult};
use crate::project::ProjectLayout;

/// Separator substituted for path separators when deriving page ids.
pub const ID_DELIMITER: char = '_';

/// Identity and file locations of one buildable page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDescriptor {
  /// Unique page identifier, also the entry chunk name.
  pub id: String,
  /// Entry path relative to the pages root, extension removed, `/`-separated.
  pub relative_path: String,
  /// Absolute path of the page's script entry.
  pub source_entry_path: PathBuf,
  /// Absolute path of the co-located markup template.
  pub template_path: PathBuf,
  /// Destination of the rendered page under the output root.
  pub output_html_path: PathBuf,
}

/// Derive a page id from an entry path relative to the pages root.
///
/// The extension is dropped and every path separator becomes [`ID_DELIMITER`], so
/// `about/index.js` maps to `about_index`. The mapping is injective only for paths whose
/// segments do not themselves contain the delimiter, which is narrower than every legal
/// path. Ids stay readable chunk names this way; `a_b/index.js` and `a/b/index.js` still
/// collide, and [`crate::pages::validate_pages`] rejects that with `DuplicateId`.
pub fn page_id(relative_entry: &Path) -> String {
  let segments = relative_segments(&relative_entry.with_extension(""));
  segments.join(&ID_DELIMITER.to_string())
}

/// Scan the pages root for every entry file, at any depth.
///
/// The result is sorted by relative path so repeated runs over an unchanged tree agree.
/// Templates are not checked here; see [`crate::pages::validate_pages`].
pub fn discover(layout: &ProjectLayout) -> PlanResult<Vec<PageDescriptor>> {
  let root = &layout.pages_root;
  let metadata = std::fs::metadata(root).map_err(|err| PlanError::Discovery {
    root: root.clone(),
    reason: err.to_string(),
  })?;
  if !metadata.is_dir() {
    return Err(PlanError::Discovery {
      root: root.clone(),
      reason: "not a directory".into(),
    });
  }

  let mut pages = Vec::new();
  let walker = WalkDir::new(root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

  for entry in walker {
    let entry = entry.map_err(|err| PlanError::Discovery {
      root: root.clone(),
      reason: err.to_string(),
    })?;

    if !entry.file_type().is_file() || entry.file_name() != layout.entry_file.as_str() {
      continue;
    }

    let entry_path = entry.path();
    let Ok(relative) = entry_path.strip_prefix(root) else {
      continue;
    };
    pages.push(describe_page(layout, entry_path, relative));
  }

  pages.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
  debug!("discovered {} page(s) under {}", pages.len(), root.display());
  Ok(pages)
}

fn describe_page(layout: &ProjectLayout, entry_path: &Path, relative: &Path) -> PageDescriptor {
  let stem = relative.with_extension("");
  let relative_path = relative_segments(&stem).join("/");

  PageDescriptor {
    id: page_id(relative),
    source_entry_path: entry_path.to_path_buf(),
    template_path: entry_path.with_extension(&layout.template_extension),
    output_html_path: layout
      .output_root
      .join(&stem)
      .with_extension(&layout.template_extension),
    relative_path,
  }
}

fn relative_segments(path: &Path) -> Vec<String> {
  path
    .components()
    .filter_map(|component| match component {
      Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
      _ => None,
    })
    .collect()
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
  name.to_string_lossy().starts_with('.')
}
