//! Routing of markup templates to their rule set.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::project::ProjectLayout;

/// Role a template plays, which decides the loader it goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateRole {
  /// Reusable fragment under the fragment template directory.
  Fragment,
  /// Page template under the pages directory.
  Page,
}

/// Role of the template at `path`, or `None` when no rule set processes it.
pub fn route_template(layout: &ProjectLayout, path: &Path) -> Option<TemplateRole> {
  if path.starts_with(&layout.template_root) {
    Some(TemplateRole::Fragment)
  } else if path.starts_with(&layout.pages_root) {
    Some(TemplateRole::Page)
  } else {
    None
  }
}

/// Templates under the source root that neither rule set will process.
///
/// The build output directory is skipped when it lives inside the source root.
pub fn unrouted_templates(layout: &ProjectLayout) -> Vec<PathBuf> {
  if !layout.source_root.is_dir() {
    return Vec::new();
  }

  let extension = layout.template_extension.as_str();
  let mut unrouted: Vec<PathBuf> = WalkDir::new(&layout.source_root)
    .sort_by_file_name()
    .into_iter()
    .filter_entry(|entry| {
      entry.depth() == 0
        || (!entry.file_name().to_string_lossy().starts_with('.')
          && entry.path() != layout.output_root)
    })
    .flatten()
    .filter(|entry| entry.file_type().is_file())
    .map(|entry| entry.into_path())
    .filter(|path| path.extension().is_some_and(|ext| ext == extension))
    .filter(|path| route_template(layout, path).is_none())
    .collect();

  unrouted.sort();
  unrouted
}
