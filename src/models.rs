//! Serializable sections of the build configuration besides rules and chunks.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::chunks::ChunkScope;
use crate::project::Alias;

/// Module resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveSection {
  /// Extensions tried for extension-less specifiers.
  pub extensions: Vec<String>,
  /// Symbolic import roots.
  pub alias: Vec<Alias>,
}

/// HTML minification flags applied to rendered pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlMinify {
  /// Collapse insignificant whitespace.
  pub collapse_whitespace: bool,
  /// Strip comments.
  pub remove_comments: bool,
  /// Drop attributes equal to their defaults.
  pub remove_redundant_attributes: bool,
  /// Drop `type="text/javascript"` from scripts.
  pub remove_script_type_attributes: bool,
  /// Drop `type="text/css"` from styles and links.
  pub remove_style_link_type_attributes: bool,
  /// Use `<!DOCTYPE html>`.
  pub use_short_doctype: bool,
}

impl HtmlMinify {
  /// Every flag enabled.
  pub fn full() -> Self {
    Self {
      collapse_whitespace: true,
      remove_comments: true,
      remove_redundant_attributes: true,
      remove_script_type_attributes: true,
      remove_style_link_type_attributes: true,
      use_short_doctype: true,
    }
  }
}

/// Engine plugin invocations, in the order the engine should apply them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plugin", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Plugin {
  /// Compile-time constant replacement.
  Define {
    /// Expression to JSON literal.
    definitions: BTreeMap<String, String>,
  },
  /// Empty the output root before writing.
  CleanOutput {
    /// Directory to clean.
    path: PathBuf,
  },
  /// Copy a directory verbatim.
  Copy {
    /// Source directory.
    from: PathBuf,
    /// Destination directory.
    to: PathBuf,
  },
  /// Render one page template.
  HtmlPage {
    /// Page id.
    id: String,
    /// Template path.
    template: PathBuf,
    /// Output HTML path.
    filename: PathBuf,
    /// Chunks injected into the page, in load order.
    chunks: Vec<String>,
    /// Regex of injected files that are inlined into the HTML.
    inline_source: String,
    /// Minification flags, absent when pages are not minified.
    #[serde(skip_serializing_if = "Option::is_none")]
    minify: Option<HtmlMinify>,
  },
  /// Extract stylesheets into files.
  ExtractCss {
    /// Template for entry stylesheets.
    filename: String,
    /// Template for chunk stylesheets.
    chunk_filename: String,
  },
  /// Minimise extracted stylesheets.
  MinimizeCss {
    /// Regex of stylesheets to process.
    asset_pattern: String,
    /// Remove every comment.
    discard_comments: bool,
  },
}

/// Upstream forwarding rule of the development server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRule {
  /// Path prefix that is forwarded.
  pub context: String,
  /// Upstream origin.
  pub target: String,
  /// Rewrite the `Host` header to the upstream origin.
  pub change_origin: bool,
  /// Regex to replacement applied to the forwarded path.
  pub path_rewrite: BTreeMap<String, String>,
}

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevServer {
  /// Directory served as static content.
  pub content_base: PathBuf,
  /// Open a browser on start.
  pub open: bool,
  /// Listening port.
  pub port: u16,
  /// Proxy rules, empty when no upstream is configured.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub proxy: Vec<ProxyRule>,
}

/// Script minimiser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMinimizer {
  /// Reuse results between builds.
  pub cache: bool,
  /// Minify files in parallel.
  pub parallel: bool,
  /// Remove `console.*` calls.
  pub drop_console: bool,
  /// Remove `debugger` statements.
  pub drop_debugger: bool,
  /// Calls treated as side-effect free and removed when unused.
  pub pure_funcs: Vec<String>,
}

/// One shared-chunk extraction group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheGroup {
  /// Output chunk name.
  pub name: String,
  /// Chunks considered.
  pub chunks: ChunkScope,
  /// Regex of candidate modules.
  pub test: String,
  /// Minimum number of referencing chunks.
  pub min_chunks: usize,
  /// Minimum size in bytes.
  pub min_size: u64,
}

/// Shared-chunk extraction settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitChunks {
  /// Chunks the splitter looks at.
  pub chunks: ChunkScope,
  /// Extraction groups by key.
  pub cache_groups: BTreeMap<String, CacheGroup>,
}

/// Name of the runtime chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeChunk {
  /// Chunk name.
  pub name: String,
}

/// Optimization section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
  /// Mark unused exports for removal.
  pub used_exports: bool,
  /// Honour package `sideEffects` flags.
  pub side_effects: bool,
  /// Script minimiser, absent when scripts are not minified.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub minimizer: Option<ScriptMinimizer>,
  /// Shared-chunk extraction, absent when only the runtime chunk is split off.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub split_chunks: Option<SplitChunks>,
  /// Runtime chunk extraction.
  pub runtime_chunk: RuntimeChunk,
}
