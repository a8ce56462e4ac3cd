//! Shared and runtime chunk extraction.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::chunks::usage::{AssetUsage, AssetUsageMap};
use crate::error::{PlanError, PlanResult};
use crate::pages::PageDescriptor;

/// Which chunks are considered for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkScope {
  /// Only chunks in a page's initial load.
  Initial,
  /// Initial and on-demand chunks.
  All,
}

/// Rules for extracting the runtime chunk and the shared asset chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkSplittingPolicy {
  /// Name of the bootstrap chunk, always extracted.
  pub runtime_chunk_name: String,
  /// Name of the chunk collecting shared assets.
  pub shared_chunk_name: String,
  /// Minimum number of pages that must reference an asset. At least 2.
  pub min_sharing_count: usize,
  /// Minimum asset size in bytes for extraction.
  pub min_shared_size: u64,
  /// Chunks considered for extraction.
  pub scope: ChunkScope,
  /// Assets whose id does not match this regex are never shared.
  pub asset_pattern: String,
  /// When false only the runtime chunk is extracted.
  pub extract_shared: bool,
}

impl Default for ChunkSplittingPolicy {
  fn default() -> Self {
    Self {
      runtime_chunk_name: "manifest".into(),
      shared_chunk_name: "common".into(),
      min_sharing_count: 2,
      min_shared_size: 0,
      scope: ChunkScope::Initial,
      asset_pattern: r"\.(css|less)$".into(),
      extract_shared: true,
    }
  }
}

/// Assets moved into the shared chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SharedChunk {
  /// Chunk name.
  pub name: String,
  /// Asset ids, sorted.
  pub assets: Vec<String>,
}

/// Chunks one page loads and the assets that stay with its own chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageChunks {
  /// Chunk names in load order.
  pub chunks: Vec<String>,
  /// Initially loaded assets kept in the page chunk.
  pub assets: Vec<String>,
}

/// Result of chunk planning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkPlan {
  /// Runtime chunk name.
  pub runtime_chunk: String,
  /// Shared chunk contents.
  pub shared_chunk: SharedChunk,
  /// Per-page chunk assignment, keyed by page id.
  pub page_chunks: BTreeMap<String, PageChunks>,
}

impl ChunkSplittingPolicy {
  /// Policy with custom thresholds, rejecting a sharing count below 2.
  pub fn with_thresholds(min_sharing_count: usize, min_shared_size: u64) -> PlanResult<Self> {
    let policy = Self {
      min_sharing_count,
      min_shared_size,
      ..Self::default()
    };
    policy.validate()?;
    Ok(policy)
  }

  /// Check value ranges.
  pub fn validate(&self) -> PlanResult<()> {
    if self.min_sharing_count < 2 {
      return Err(PlanError::InvalidPolicy(format!(
        "min_sharing_count must be at least 2, got {}",
        self.min_sharing_count
      )));
    }
    Regex::new(&self.asset_pattern)
      .map(|_| ())
      .map_err(|err| PlanError::InvalidPolicy(format!("asset pattern: {err}")))
  }

  fn sharing_pages<'a>(&self, usage: &'a AssetUsage) -> BTreeSet<&'a String> {
    match self.scope {
      ChunkScope::Initial => usage.initial_pages.iter().collect(),
      ChunkScope::All => usage.initial_pages.union(&usage.lazy_pages).collect(),
    }
  }

  /// Decide which assets move into the shared chunk.
  ///
  /// An asset is shared when it matches the asset pattern, enough distinct pages reference
  /// it within scope, and it is at least `min_shared_size` bytes. Both thresholds must hold.
  /// The runtime chunk is extracted regardless.
  pub fn plan_shared_chunks(
    &self,
    pages: &[PageDescriptor],
    usage: &AssetUsageMap,
  ) -> PlanResult<ChunkPlan> {
    self.validate()?;
    let pattern = Regex::new(&self.asset_pattern)
      .map_err(|err| PlanError::InvalidPolicy(format!("asset pattern: {err}")))?;

    let shared: BTreeSet<&str> = if self.extract_shared {
      usage
        .iter()
        .filter(|(id, _)| pattern.is_match(id))
        .filter(|(_, asset)| {
          self.sharing_pages(asset).len() >= self.min_sharing_count
            && asset.size >= self.min_shared_size
        })
        .map(|(id, _)| id.as_str())
        .collect()
    } else {
      BTreeSet::new()
    };

    let mut page_chunks = BTreeMap::new();
    for page in pages {
      let mut chunks = vec![self.runtime_chunk_name.clone()];
      if !shared.is_empty() {
        chunks.push(self.shared_chunk_name.clone());
      }
      chunks.push(page.id.clone());

      let assets = usage
        .iter()
        .filter(|(id, asset)| asset.initial_pages.contains(&page.id) && !shared.contains(id.as_str()))
        .map(|(id, _)| id.clone())
        .collect();

      page_chunks.insert(page.id.clone(), PageChunks { chunks, assets });
    }

    debug!(
      "shared chunk '{}' holds {} asset(s)",
      self.shared_chunk_name,
      shared.len()
    );

    Ok(ChunkPlan {
      runtime_chunk: self.runtime_chunk_name.clone(),
      shared_chunk: SharedChunk {
        name: self.shared_chunk_name.clone(),
        assets: shared.into_iter().map(str::to_string).collect(),
      },
      page_chunks,
    })
  }
}
