//! Per-category transformation chains.

use crate::mode::ModeProfile;
use crate::naming::{OutputCategory, resolve};
use crate::pipeline::rules::{AssetCategory, Enforce, Stage, TransformationRule};
use crate::project::ProjectLayout;

/// Files handled by the script rules.
pub const SCRIPT_PATTERN: &str = r"\.js$";
/// Files handled by the plain stylesheet rule.
pub const STYLESHEET_PATTERN: &str = r"\.css$";
/// Files handled by the preprocessed stylesheet rule.
pub const PREPROCESSED_STYLESHEET_PATTERN: &str = r"\.less$";
/// Files handled by the media rule.
pub const MEDIA_PATTERN: &str = r"(?i)\.(png|jpe?g|gif|svg|woff2?|eot|ttf|otf)(\?.*)?$";
/// Files handled by the template rules.
pub const TEMPLATE_PATTERN: &str = r"\.html$";

const TRANSPILE_TARGET: &str = "es5";
const STYLE_PREPROCESSOR: &str = "less";
const VENDOR_DIR: &str = "node_modules";

/// Assemble every transformation rule for `profile`.
///
/// The rule list and each rule's stage order are fixed. The profile only changes stage
/// parameters, plus the presence of the vendor-prefix and extraction stages.
pub fn assemble(
  profile: &ModeProfile,
  layout: &ProjectLayout,
  public_path: &str,
) -> Vec<TransformationRule> {
  let mut rules = script_rules();
  rules.push(TransformationRule::new(
    AssetCategory::Stylesheet,
    STYLESHEET_PATTERN,
    style_stages(profile, None),
  ));
  rules.push(TransformationRule::new(
    AssetCategory::PreprocessedStylesheet,
    PREPROCESSED_STYLESHEET_PATTERN,
    style_stages(profile, Some(STYLE_PREPROCESSOR)),
  ));
  rules.push(media_rule(profile, public_path));
  rules.extend(template_rules(layout));
  rules
}

fn script_rules() -> Vec<TransformationRule> {
  vec![
    TransformationRule::new(AssetCategory::Script, SCRIPT_PATTERN, vec![Stage::Lint])
      .exclude(VENDOR_DIR)
      .enforce(Enforce::Pre),
    TransformationRule::new(
      AssetCategory::Script,
      SCRIPT_PATTERN,
      vec![Stage::Transpile {
        target: TRANSPILE_TARGET.into(),
      }],
    )
    .exclude(VENDOR_DIR),
  ]
}

fn style_stages(profile: &ModeProfile, preprocessor: Option<&str>) -> Vec<Stage> {
  let mut stages = Vec::new();
  let mut import_loaders = 1;

  if let Some(language) = preprocessor {
    stages.push(Stage::Preprocess {
      language: language.to_string(),
    });
    import_loaders += 1;
  }
  if profile.vendor_prefix_css {
    stages.push(Stage::VendorPrefix);
  }
  stages.push(Stage::ResolveStyle { import_loaders });
  stages.push(if profile.extract_css {
    Stage::ExtractStyle
  } else {
    Stage::InjectStyle
  });

  stages
}

fn media_rule(profile: &ModeProfile, public_path: &str) -> TransformationRule {
  TransformationRule::new(
    AssetCategory::Media,
    MEDIA_PATTERN,
    vec![Stage::InlineOrEmit {
      limit: profile.asset_inline_threshold_bytes,
      name: resolve(OutputCategory::Asset, profile),
      public_path: public_path.to_string(),
    }],
  )
}

fn template_rules(layout: &ProjectLayout) -> Vec<TransformationRule> {
  vec![
    TransformationRule::new(
      AssetCategory::FragmentTemplate,
      TEMPLATE_PATTERN,
      vec![Stage::FragmentMarkup],
    )
    .include(&layout.template_root),
    TransformationRule::new(
      AssetCategory::PageTemplate,
      TEMPLATE_PATTERN,
      vec![Stage::PageMarkup {
        rewrite_images: true,
      }],
    )
    .include(&layout.pages_root),
  ]
}
