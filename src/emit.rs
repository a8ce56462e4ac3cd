//! Write a finished build configuration to disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::builder::BuildConfiguration;

/// Serialise `configuration` to `target`, as YAML for `.yaml`/`.yml` and JSON otherwise.
pub fn write_configuration(configuration: &BuildConfiguration, target: &Path) -> Result<()> {
  if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let rendered = match target.extension().and_then(|ext| ext.to_str()) {
    Some("yaml") | Some("yml") => serde_yaml::to_string(configuration)
      .context("failed to render build configuration as YAML")?,
    _ => {
      let mut json = configuration
        .to_json()
        .context("failed to render build configuration as JSON")?;
      json.push('\n');
      json
    }
  };

  fs::write(target, rendered).with_context(|| format!("failed to write {}", target.display()))?;
  info!("wrote {} configuration to {}", configuration.mode, target.display());
  Ok(())
}
