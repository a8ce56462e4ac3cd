//! Transformation pipeline assembly, split by concern so each piece is testable alone.

mod assembler;
mod media;
mod rules;
mod templates;

pub use assembler::{
  MEDIA_PATTERN, PREPROCESSED_STYLESHEET_PATTERN, SCRIPT_PATTERN, STYLESHEET_PATTERN,
  TEMPLATE_PATTERN, assemble,
};
pub use media::{MediaEntry, MediaPlacement, place_media, plan_media};
pub use rules::{AssetCategory, Enforce, RuleMatcher, Stage, TransformationRule};
pub use templates::{TemplateRole, route_template, unrouted_templates};
