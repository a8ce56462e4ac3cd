//! Output filename templates and their rendering.
//!
//! Development templates never carry a content hash, so the browser and tooling can
//! reuse cached files between rebuilds. Production templates always do, so a changed
//! file gets a new name and an unchanged file keeps its name across builds.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::mode::{FilenameStyle, ModeProfile};
use crate::project::ProjectLayout;

/// Hex digits of the content hash embedded in production filenames.
pub const CONTENT_HASH_LENGTH: usize = 5;

/// Output category with its own directory and filename template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputCategory {
  /// Page entry scripts.
  Script,
  /// Non-entry script chunks (runtime, shared, lazy).
  Chunk,
  /// Extracted stylesheets.
  Style,
  /// Images and fonts emitted as files.
  Asset,
}

impl OutputCategory {
  /// Every category, in output order.
  pub const ALL: [OutputCategory; 4] = [Self::Script, Self::Chunk, Self::Style, Self::Asset];
}

/// Filename template for `category` under `profile`.
pub fn resolve(category: OutputCategory, profile: &ModeProfile) -> String {
  match category {
    OutputCategory::Script | OutputCategory::Chunk => match profile.script_filename {
      FilenameStyle::Stable => "[name].js".into(),
      FilenameStyle::ContentHashed => format!("script/{}.js", hashed_name()),
    },
    OutputCategory::Style => format!("style/{}.css", base_name(profile.style_filename)),
    OutputCategory::Asset => {
      let directory = if profile.preserve_asset_paths {
        "[path]"
      } else {
        "assets/"
      };
      format!("{directory}{}.[ext]", base_name(profile.asset_filename))
    }
  }
}

fn base_name(style: FilenameStyle) -> String {
  match style {
    FilenameStyle::Stable => "[name]".into(),
    FilenameStyle::ContentHashed => hashed_name(),
  }
}

fn hashed_name() -> String {
  format!("[name].[contenthash:{CONTENT_HASH_LENGTH}]")
}

/// Short hex fingerprint of `content`.
pub fn content_hash(content: &[u8], length: usize) -> String {
  let digest = blake3::hash(content).to_hex();
  digest.as_str().chars().take(length).collect()
}

/// Values substituted into a filename template.
#[derive(Debug, Clone, Copy)]
pub struct FileParts<'a> {
  /// Base name without extension.
  pub name: &'a str,
  /// Extension without the leading dot.
  pub ext: &'a str,
  /// Project-relative directory, `/`-separated, with a trailing slash when non-empty.
  pub dir: &'a str,
}

fn placeholder_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"\[(name|ext|path|contenthash)(?::(\d+))?\]").expect("invalid placeholder regex")
  })
}

/// Substitute `[name]`, `[ext]`, `[path]` and `[contenthash:N]` in `template`.
pub fn render(template: &str, parts: FileParts<'_>, content: &[u8]) -> String {
  placeholder_pattern()
    .replace_all(template, |caps: &Captures<'_>| match &caps[1] {
      "name" => parts.name.to_string(),
      "ext" => parts.ext.to_string(),
      "path" => parts.dir.to_string(),
      _ => {
        let length = caps
          .get(2)
          .and_then(|value| value.as_str().parse().ok())
          .unwrap_or(CONTENT_HASH_LENGTH);
        content_hash(content, length)
      }
    })
    .into_owned()
}

/// Output naming section of the build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputNaming {
  /// Output root.
  pub path: PathBuf,
  /// URL prefix the engine writes in front of emitted asset references.
  pub public_path: String,
  /// Entry script template.
  pub filename: String,
  /// Chunk script template.
  pub chunk_filename: String,
  /// Extracted stylesheet template.
  pub style_filename: String,
  /// Emitted media template.
  pub asset_filename: String,
}

impl OutputNaming {
  /// Build the naming section for `profile`.
  pub fn new(profile: &ModeProfile, layout: &ProjectLayout, public_path: &str) -> Self {
    Self {
      path: layout.output_root.clone(),
      public_path: public_path.to_string(),
      filename: resolve(OutputCategory::Script, profile),
      chunk_filename: resolve(OutputCategory::Chunk, profile),
      style_filename: resolve(OutputCategory::Style, profile),
      asset_filename: resolve(OutputCategory::Asset, profile),
    }
  }

  /// Template for `category`.
  pub fn template(&self, category: OutputCategory) -> &str {
    match category {
      OutputCategory::Script => &self.filename,
      OutputCategory::Chunk => &self.chunk_filename,
      OutputCategory::Style => &self.style_filename,
      OutputCategory::Asset => &self.asset_filename,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::mode::Mode;
  use pretty_assertions::assert_eq;

  fn parts<'a>(name: &'a str, ext: &'a str) -> FileParts<'a> {
    FileParts {
      name,
      ext,
      dir: "src/images/",
    }
  }

  #[test]
  fn development_templates_never_hash() {
    let profile = ModeProfile::for_mode(Mode::Development);
    for category in OutputCategory::ALL {
      let template = resolve(category, &profile);
      assert!(!template.contains("contenthash"), "{template}");
      let rendered = render(&template, parts("logo", "png"), b"bytes");
      assert!(!rendered.contains(&content_hash(b"bytes", CONTENT_HASH_LENGTH)));
    }
    assert_eq!(resolve(OutputCategory::Script, &profile), "[name].js");
    assert_eq!(resolve(OutputCategory::Asset, &profile), "[path][name].[ext]");
  }

  #[test]
  fn production_templates_always_hash() {
    let profile = ModeProfile::for_mode(Mode::Production);
    for category in OutputCategory::ALL {
      let template = resolve(category, &profile);
      assert!(template.contains("[contenthash:5]"), "{template}");
    }
    assert_eq!(
      resolve(OutputCategory::Script, &profile),
      "script/[name].[contenthash:5].js"
    );
    assert_eq!(
      resolve(OutputCategory::Style, &profile),
      "style/[name].[contenthash:5].css"
    );
    assert_eq!(
      resolve(OutputCategory::Asset, &profile),
      "assets/[name].[contenthash:5].[ext]"
    );
  }

  #[test]
  fn hashed_names_follow_content() {
    let template = resolve(OutputCategory::Style, &ModeProfile::for_mode(Mode::Production));
    let home = b"body { color: red; }".to_vec();
    let about = b"h1 { margin: 0; }".to_vec();

    let home_first = render(&template, parts("home", "css"), &home);
    let about_first = render(&template, parts("about", "css"), &about);
    assert_eq!(home_first, render(&template, parts("home", "css"), &home));

    let mut edited = home.clone();
    edited[0] = b'B';
    let home_second = render(&template, parts("home", "css"), &edited);
    let about_second = render(&template, parts("about", "css"), &about);

    assert_ne!(home_first, home_second);
    assert_eq!(about_first, about_second);
  }

  #[test]
  fn renders_all_placeholders() {
    let rendered = render("[path][name].[contenthash:8].[ext]", parts("logo", "png"), b"x");
    let hash = content_hash(b"x", 8);
    assert_eq!(rendered, format!("src/images/logo.{hash}.png"));
    assert_eq!(hash.len(), 8);
  }
}
