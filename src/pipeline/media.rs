//! Inline-or-emit placement of concrete media files.

use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::{PlanError, PlanResult};
use crate::mode::ModeProfile;
use crate::naming::{FileParts, OutputCategory, OutputNaming, render};
use crate::pipeline::assembler::MEDIA_PATTERN;
use crate::project::ProjectLayout;

/// Where a media file ends up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum MediaPlacement {
  /// Encoded into the referencing file.
  Inline {
    /// `data:` URI carrying the file.
    data_uri: String,
  },
  /// Written as a separate file.
  Emit {
    /// Path relative to the output root.
    output_path: String,
  },
}

/// Placement of one media file found under the images directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
  /// Project-relative source path.
  pub source: String,
  /// Size in bytes.
  pub size: u64,
  /// Decision for this file.
  pub placement: MediaPlacement,
}

/// Decide where a media file with `content` goes.
pub fn place_media(
  layout: &ProjectLayout,
  profile: &ModeProfile,
  naming: &OutputNaming,
  path: &Path,
  content: &[u8],
) -> MediaPlacement {
  let ext = path
    .extension()
    .map(|ext| ext.to_string_lossy().into_owned())
    .unwrap_or_default();

  if (content.len() as u64) < profile.asset_inline_threshold_bytes {
    let encoded = general_purpose::STANDARD.encode(content);
    return MediaPlacement::Inline {
      data_uri: format!("data:{};base64,{encoded}", mime_type(&ext)),
    };
  }

  let name = path
    .file_stem()
    .map(|stem| stem.to_string_lossy().into_owned())
    .unwrap_or_default();
  let dir = path
    .parent()
    .map(|parent| layout.project_relative(parent))
    .filter(|dir| !dir.is_empty())
    .map(|dir| format!("{dir}/"))
    .unwrap_or_default();

  MediaPlacement::Emit {
    output_path: render(
      naming.template(OutputCategory::Asset),
      FileParts {
        name: &name,
        ext: &ext,
        dir: &dir,
      },
      content,
    ),
  }
}

/// Place every media file under the images directory, sorted by source path.
pub fn plan_media(
  layout: &ProjectLayout,
  profile: &ModeProfile,
  naming: &OutputNaming,
) -> PlanResult<Vec<MediaEntry>> {
  let root = &layout.images_root;
  if !root.is_dir() {
    return Ok(Vec::new());
  }

  let pattern = Regex::new(MEDIA_PATTERN).map_err(|err| PlanError::InvalidPolicy(err.to_string()))?;
  let mut entries = Vec::new();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(|err| {
      let path = err.path().unwrap_or(root).to_path_buf();
      PlanError::io(path, err.into())
    })?;
    if !entry.file_type().is_file() || !pattern.is_match(&entry.path().to_string_lossy()) {
      continue;
    }

    let path = entry.path();
    let content = fs::read(path).map_err(|err| PlanError::io(path, err))?;
    entries.push(MediaEntry {
      source: layout.project_relative(path),
      size: content.len() as u64,
      placement: place_media(layout, profile, naming, path, &content),
    });
  }

  Ok(entries)
}

fn mime_type(ext: &str) -> &'static str {
  match ext.to_ascii_lowercase().as_str() {
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "svg" => "image/svg+xml",
    "woff" => "font/woff",
    "woff2" => "font/woff2",
    "eot" => "application/vnd.ms-fontobject",
    "ttf" => "font/ttf",
    "otf" => "font/otf",
    _ => "application/octet-stream",
  }
}
