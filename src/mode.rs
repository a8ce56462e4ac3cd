//! Development and production policy.
//!
//! [`ModeProfile`] is the only place that knows how the two modes differ. Every other
//! component reads the profile's fields instead of matching on [`Mode`].

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Build mode selected by the invoking process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  /// Fast local iteration.
  Development,
  /// Cache-optimised release output.
  Production,
}

impl Mode {
  /// Lowercase name, also used as the `process.env.NODE_ENV` value.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Development => "development",
      Self::Production => "production",
    }
  }
}

impl fmt::Display for Mode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Source-map fidelity handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceMapLevel {
  /// No source maps.
  #[serde(rename = "none")]
  None,
  /// Line-level maps evaluated inline, cheap to rebuild.
  #[serde(rename = "cheap-module-eval-source-map")]
  CheapModuleEval,
}

/// How output filenames are formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilenameStyle {
  /// `[name]` only, reused between rebuilds.
  Stable,
  /// `[name].[contenthash:N]`, changes exactly when content changes.
  ContentHashed,
}

/// Complete set of mode-dependent choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeProfile {
  /// Mode this profile was derived from.
  pub mode: Mode,
  /// Minify scripts and page HTML.
  pub minify: bool,
  /// Source-map setting.
  pub source_map: SourceMapLevel,
  /// Filename style for scripts and script chunks.
  pub script_filename: FilenameStyle,
  /// Filename style for extracted stylesheets.
  pub style_filename: FilenameStyle,
  /// Filename style for emitted media.
  pub asset_filename: FilenameStyle,
  /// Media strictly smaller than this many bytes is inlined.
  pub asset_inline_threshold_bytes: u64,
  /// Strip `console.*` calls and `debugger` statements.
  pub drop_console_and_debugger: bool,
  /// Run vendor prefixing on stylesheets.
  pub vendor_prefix_css: bool,
  /// Drop unused exports.
  pub tree_shaking: bool,
  /// Extract stylesheets to files instead of injecting them at runtime.
  pub extract_css: bool,
  /// Keep the source directory structure for emitted media.
  pub preserve_asset_paths: bool,
  /// Empty the output root before the engine writes to it.
  pub clean_output: bool,
  /// Configure the development server and proxy.
  pub dev_server: bool,
  /// Extract shared assets into a common chunk in addition to the runtime chunk.
  pub split_chunks: bool,
}

impl ModeProfile {
  /// Map a mode to its profile.
  pub fn for_mode(mode: Mode) -> Self {
    match mode {
      Mode::Development => Self {
        mode,
        minify: false,
        source_map: SourceMapLevel::CheapModuleEval,
        script_filename: FilenameStyle::Stable,
        style_filename: FilenameStyle::Stable,
        asset_filename: FilenameStyle::Stable,
        asset_inline_threshold_bytes: 8192,
        drop_console_and_debugger: false,
        vendor_prefix_css: false,
        tree_shaking: false,
        extract_css: false,
        preserve_asset_paths: true,
        clean_output: false,
        dev_server: true,
        split_chunks: false,
      },
      Mode::Production => Self {
        mode,
        minify: true,
        source_map: SourceMapLevel::None,
        script_filename: FilenameStyle::ContentHashed,
        style_filename: FilenameStyle::ContentHashed,
        asset_filename: FilenameStyle::ContentHashed,
        asset_inline_threshold_bytes: 8192,
        drop_console_and_debugger: true,
        vendor_prefix_css: true,
        tree_shaking: true,
        extract_css: true,
        preserve_asset_paths: false,
        clean_output: true,
        dev_server: false,
        split_chunks: true,
      },
    }
  }
}
