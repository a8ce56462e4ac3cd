//! Asset usage derived from the import statements of each page.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;

use crate::pages::PageDescriptor;
use crate::project::ProjectLayout;

/// How a module reaches a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadKind {
  /// Part of the page's initial load.
  Initial,
  /// Loaded on demand through a dynamic `import()`.
  Lazy,
}

/// Pages referencing one asset, split by how they load it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetUsage {
  /// Size of the asset in bytes.
  pub size: u64,
  /// Pages loading the asset initially.
  pub initial_pages: BTreeSet<String>,
  /// Pages loading the asset only on demand.
  pub lazy_pages: BTreeSet<String>,
}

/// Mapping from project-relative asset id to its usage.
pub type AssetUsageMap = BTreeMap<String, AssetUsage>;

struct ImportPatterns {
  static_import: Regex,
  require: Regex,
  re_export: Regex,
  dynamic_import: Regex,
}

fn import_patterns() -> &'static ImportPatterns {
  static PATTERNS: OnceLock<ImportPatterns> = OnceLock::new();
  PATTERNS.get_or_init(|| ImportPatterns {
    static_import: Regex::new(r#"\bimport\s+(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"]+)['"]"#)
      .expect("invalid static import regex"),
    require: Regex::new(r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#).expect("invalid require regex"),
    re_export: Regex::new(
      r#"\bexport\s+(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"]([^'"]+)['"]"#,
    )
    .expect("invalid re-export regex"),
    dynamic_import: Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#)
      .expect("invalid dynamic import regex"),
  })
}

/// Import specifiers in `source`, in order of appearance within each kind.
pub fn collect_import_specifiers(source: &str) -> Vec<(String, LoadKind)> {
  let patterns = import_patterns();
  let initial = patterns
    .static_import
    .captures_iter(source)
    .chain(patterns.require.captures_iter(source))
    .chain(patterns.re_export.captures_iter(source))
    .map(|caps| (caps[1].to_string(), LoadKind::Initial));
  let lazy = patterns
    .dynamic_import
    .captures_iter(source)
    .map(|caps| (caps[1].to_string(), LoadKind::Lazy));

  initial.chain(lazy).collect()
}

/// Resolve a specifier found in `importer` to a file path.
///
/// Relative and aliased specifiers resolve; bare package names and absolute URLs do not.
pub fn resolve_specifier(layout: &ProjectLayout, importer: &Path, specifier: &str) -> Option<PathBuf> {
  let specifier = specifier.split(['?', '#']).next().unwrap_or(specifier);
  let resolved = if specifier.starts_with("./") || specifier.starts_with("../") {
    importer.parent()?.join(specifier)
  } else {
    layout.resolve_alias(specifier)?
  };

  let mut path = normalize(&resolved);
  if path.extension().is_none() {
    path.set_extension("js");
  }
  Some(path)
}

fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        normalized.pop();
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

/// Every file reachable from `page` and the cheapest way the page loads it.
///
/// Script modules are followed transitively; anything reached through a dynamic import
/// counts as lazy. Files that cannot be resolved are skipped with a warning.
fn walk_page(layout: &ProjectLayout, page: &PageDescriptor) -> BTreeMap<PathBuf, LoadKind> {
  let mut best_kind: BTreeMap<PathBuf, LoadKind> = BTreeMap::new();
  let mut queue = VecDeque::from([(page.source_entry_path.clone(), LoadKind::Initial)]);

  while let Some((module, kind)) = queue.pop_front() {
    let Ok(source) = fs::read_to_string(&module) else {
      warn!("cannot read {} while scanning page '{}'", module.display(), page.id);
      continue;
    };

    for (specifier, edge) in collect_import_specifiers(&source) {
      let Some(target) = resolve_specifier(layout, &module, &specifier) else {
        continue;
      };
      if target == page.source_entry_path {
        continue;
      }
      if !target.is_file() {
        warn!(
          "unresolved import '{}' in {} (page '{}')",
          specifier,
          module.display(),
          page.id
        );
        continue;
      }

      let reached = kind.max(edge);
      let improved = match best_kind.get(&target) {
        Some(existing) => reached < *existing,
        None => true,
      };
      if !improved {
        continue;
      }
      best_kind.insert(target.clone(), reached);

      if is_script(&target) {
        queue.push_back((target, reached));
      }
    }
  }

  best_kind
}

fn is_script(path: &Path) -> bool {
  path.extension().is_some_and(|ext| ext == "js")
}

/// The page entry followed by every script module it reaches, initially or lazily.
pub fn page_scripts(layout: &ProjectLayout, page: &PageDescriptor) -> Vec<PathBuf> {
  let reachable = walk_page(layout, page);
  std::iter::once(page.source_entry_path.clone())
    .chain(reachable.into_keys().filter(|path| is_script(path)))
    .collect()
}

/// Walk each page's import graph and record which pages use which assets.
pub fn collect_asset_usage(layout: &ProjectLayout, pages: &[PageDescriptor]) -> AssetUsageMap {
  let mut usage = AssetUsageMap::new();

  for page in pages {
    for (asset, kind) in walk_page(layout, page) {
      let id = layout.project_relative(&asset);
      let entry = usage.entry(id).or_default();
      entry.size = fs::metadata(&asset).map(|meta| meta.len()).unwrap_or(0);
      match kind {
        LoadKind::Initial => entry.initial_pages.insert(page.id.clone()),
        LoadKind::Lazy => entry.lazy_pages.insert(page.id.clone()),
      };
    }
  }

  debug!("collected usage for {} asset(s)", usage.len());
  usage
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProjectConfig;
  use crate::pages::discover;
  use tempfile::tempdir;

  fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
  }

  #[test]
  fn finds_static_require_and_dynamic_imports() {
    let source = r#"
import '@styles/base.css'
import { render } from "./render"
import * as api from '../api.js';
const legacy = require('./legacy.less');
export { theme } from './theme.css';
export * as icons from "../icons.js"
button.onclick = () => import('./dialog.js');
menu.onclick = () => import ('./menu.css');
"#;
    let specifiers = collect_import_specifiers(source);
    assert_eq!(
      specifiers,
      vec![
        ("@styles/base.css".to_string(), LoadKind::Initial),
        ("./render".to_string(), LoadKind::Initial),
        ("../api.js".to_string(), LoadKind::Initial),
        ("./legacy.less".to_string(), LoadKind::Initial),
        ("./theme.css".to_string(), LoadKind::Initial),
        ("../icons.js".to_string(), LoadKind::Initial),
        ("./dialog.js".to_string(), LoadKind::Lazy),
        ("./menu.css".to_string(), LoadKind::Lazy),
      ]
    );
  }

  #[test]
  fn resolves_relative_and_aliased_specifiers() {
    let layout = ProjectConfig::default().to_layout(Path::new("/site"));
    let importer = Path::new("/site/src/pages/home/index.js");

    assert_eq!(
      resolve_specifier(&layout, importer, "../shared/nav"),
      Some(PathBuf::from("/site/src/pages/shared/nav.js"))
    );
    assert_eq!(
      resolve_specifier(&layout, importer, "@styles/base.css?inline"),
      Some(PathBuf::from("/site/src/styles/base.css"))
    );
    assert_eq!(resolve_specifier(&layout, importer, "lodash"), None);
  }

  #[test]
  fn records_initial_and_lazy_usage_per_page() {
    let dir = tempdir().unwrap();
    let layout = ProjectConfig::default().to_layout(dir.path());
    write_file(&layout.styles_root.join("base.css"), "body{}");
    write_file(&layout.styles_root.join("dialog.css"), ".dialog{}");
    write_file(
      &layout.source_root.join("common/dialog.js"),
      "import '@styles/dialog.css'",
    );
    write_file(
      &layout.pages_root.join("home/index.js"),
      "import '@styles/base.css'\nimport('@/common/dialog.js')",
    );
    write_file(
      &layout.pages_root.join("about/index.js"),
      "import '@styles/base.css'\nimport '@/common/dialog.js'\nimport './missing.css'",
    );

    let pages = discover(&layout).unwrap();
    let usage = collect_asset_usage(&layout, &pages);

    let base = &usage["src/styles/base.css"];
    assert_eq!(base.size, 6);
    assert_eq!(base.initial_pages.len(), 2);

    let dialog_css = &usage["src/styles/dialog.css"];
    assert_eq!(
      dialog_css.initial_pages,
      BTreeSet::from(["about_index".to_string()])
    );
    assert_eq!(
      dialog_css.lazy_pages,
      BTreeSet::from(["home_index".to_string()])
    );
    assert!(!usage.keys().any(|id| id.contains("missing")));
  }

  #[test]
  fn counts_assets_reached_through_re_exports() {
    let dir = tempdir().unwrap();
    let layout = ProjectConfig::default().to_layout(dir.path());
    write_file(&layout.styles_root.join("theme.css"), "body{}");
    write_file(
      &layout.source_root.join("common/theme.js"),
      "export * from '@styles/theme.css'",
    );
    write_file(&layout.pages_root.join("home/index.js"), "import '@/common/theme.js'");
    write_file(
      &layout.pages_root.join("about/index.js"),
      "export { default } from '@/common/theme.js'",
    );

    let pages = discover(&layout).unwrap();
    let usage = collect_asset_usage(&layout, &pages);
    assert_eq!(usage["src/styles/theme.css"].initial_pages.len(), 2);
  }

  #[test]
  fn page_scripts_lists_entry_then_reachable_modules() {
    let dir = tempdir().unwrap();
    let layout = ProjectConfig::default().to_layout(dir.path());
    write_file(&layout.styles_root.join("base.css"), "body{}");
    write_file(&layout.source_root.join("common/util.js"), "import './format.js'");
    write_file(&layout.source_root.join("common/format.js"), "");
    write_file(&layout.source_root.join("common/dialog.js"), "");
    write_file(
      &layout.pages_root.join("home/index.js"),
      "import '@styles/base.css'\nimport '@/common/util.js'\nimport('@/common/dialog.js')",
    );

    let pages = discover(&layout).unwrap();
    let scripts: Vec<String> = page_scripts(&layout, &pages[0])
      .iter()
      .map(|path| layout.project_relative(path))
      .collect();
    assert_eq!(
      scripts,
      vec![
        "src/pages/home/index.js",
        "src/common/dialog.js",
        "src/common/format.js",
        "src/common/util.js",
      ]
    );
  }
}
