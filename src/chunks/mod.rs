//! Chunk splitting: usage collection and the extraction policy.

mod policy;
mod usage;

pub use policy::{ChunkPlan, ChunkScope, ChunkSplittingPolicy, PageChunks, SharedChunk};
pub use usage::{
  AssetUsage, AssetUsageMap, LoadKind, collect_asset_usage, collect_import_specifiers,
  page_scripts, resolve_specifier,
};
