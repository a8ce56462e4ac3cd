//! Project configuration loader describing the page source layout and dev-time settings.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::error::{PlanError, PlanResult};
use crate::project::ProjectLayout;

const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mpa.config.json", "mpa.config.yaml", "mpa.config.yml"];

/// Discoverable project configuration describing filesystem layout and dev-time settings.
///
/// Every path is relative to the project root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
  /// Root of all authored sources, target of the `@` alias.
  pub source_dir: String,
  /// Directory scanned for page entries.
  pub pages_dir: String,
  /// Directory holding reusable fragment templates.
  pub template_dir: String,
  /// Directory holding shared stylesheets.
  pub styles_dir: String,
  /// Directory holding images and fonts.
  pub images_dir: String,
  /// Support-library directory copied verbatim into the output.
  pub lib_dir: String,
  /// Build output root.
  pub output_dir: String,
  /// Name of the copied support-library directory inside the output root.
  pub lib_output_dir: String,
  /// File name marking a page entry.
  pub entry_file: String,
  /// Extension of page and fragment templates.
  pub template_extension: String,
  /// Port used by the development server.
  pub dev_port: u16,
  /// Upstream origin for the development proxy. Empty disables the proxy.
  pub proxy_server: String,
  /// Path prefix forwarded to the upstream origin.
  pub proxy_prefix: String,
  /// Public path used for development builds.
  pub dev_public_path: String,
  /// Public path used for production builds.
  pub build_public_path: String,
  /// Regular expressions a page script must not match.
  pub lint_forbid: Vec<String>,
  /// Reject templates that fall outside the page and fragment directories.
  pub strict_templates: bool,
  /// Minimum number of pages that must share an asset before it is extracted.
  pub min_sharing_count: usize,
  /// Minimum aggregate size in bytes of an asset before it is extracted.
  pub min_shared_size: u64,
}

impl Default for ProjectConfig {
  fn default() -> Self {
    Self {
      source_dir: "src".into(),
      pages_dir: "src/pages".into(),
      template_dir: "src/template".into(),
      styles_dir: "src/styles".into(),
      images_dir: "src/images".into(),
      lib_dir: "src/lib".into(),
      output_dir: "dist".into(),
      lib_output_dir: "lib".into(),
      entry_file: "index.js".into(),
      template_extension: "html".into(),
      dev_port: 8087,
      proxy_server: String::new(),
      proxy_prefix: "/proxyApi".into(),
      dev_public_path: String::new(),
      build_public_path: String::new(),
      lint_forbid: Vec::new(),
      strict_templates: false,
      min_sharing_count: 2,
      min_shared_size: 0,
    }
  }
}

impl ProjectConfig {
  /// Load configuration from the first config file found in `project_root`.
  ///
  /// A project without a config file uses the defaults. A config file that exists but
  /// fails to parse is an error.
  pub fn discover(project_root: &Path) -> PlanResult<Self> {
    for candidate in CONFIG_FILE_CANDIDATES {
      let path = project_root.join(candidate);
      if path.is_file() {
        debug!("loading project config from {}", path.display());
        return Self::from_path(&path);
      }
    }

    debug!(
      "no project config under {}, using defaults",
      project_root.display()
    );
    Ok(Self::default())
  }

  /// Read configuration from a specific JSON or YAML file, chosen by extension.
  pub fn from_path(path: &Path) -> PlanResult<Self> {
    let content = fs::read_to_string(path).map_err(|err| PlanError::io(path, err))?;
    let is_yaml = path
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let parsed = if is_yaml {
      serde_yaml::from_str(&content).map_err(|err| err.to_string())
    } else {
      serde_json::from_str(&content).map_err(|err| err.to_string())
    };

    parsed.map_err(|reason| PlanError::Config {
      path: path.to_path_buf(),
      reason,
    })
  }

  /// Resolve every configured directory against `project_root`.
  pub fn to_layout(&self, project_root: &Path) -> ProjectLayout {
    let resolve = |relative: &str| -> PathBuf { project_root.join(relative) };

    ProjectLayout {
      project_root: project_root.to_path_buf(),
      source_root: resolve(&self.source_dir),
      pages_root: resolve(&self.pages_dir),
      template_root: resolve(&self.template_dir),
      styles_root: resolve(&self.styles_dir),
      images_root: resolve(&self.images_dir),
      lib_root: resolve(&self.lib_dir),
      output_root: resolve(&self.output_dir),
      lib_output_dir: self.lib_output_dir.clone(),
      entry_file: self.entry_file.clone(),
      template_extension: self.template_extension.trim_start_matches('.').to_string(),
    }
  }
}
