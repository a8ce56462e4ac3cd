#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod chunks;
pub mod config;
pub mod emit;
pub mod error;
pub mod lint;
pub mod mode;
pub mod models;
pub mod naming;
pub mod pages;
pub mod pipeline;
pub mod project;

pub use builder::{BuildConfiguration, ConfigurationBuilder};
pub use chunks::{ChunkPlan, ChunkSplittingPolicy};
pub use config::ProjectConfig;
pub use emit::write_configuration;
pub use error::{PlanError, PlanResult};
pub use lint::{NoLint, PatternLint, ScriptLint};
pub use mode::{Mode, ModeProfile};
pub use pages::PageDescriptor;
pub use project::ProjectLayout;
