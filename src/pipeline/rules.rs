//! Transformation rule types handed to the bundler engine.

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Serialize;

use crate::error::{PlanError, PlanResult};

/// Asset category a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetCategory {
  /// Page and library scripts.
  Script,
  /// Plain stylesheets.
  Stylesheet,
  /// Stylesheets written in a preprocessor language.
  PreprocessedStylesheet,
  /// Images and fonts.
  Media,
  /// Reusable markup fragments.
  FragmentTemplate,
  /// Page-level markup templates.
  PageTemplate,
}

/// Rule ordering hint for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforce {
  /// Run before every normal rule for the same file.
  Pre,
}

/// One transformation step. Stages of a rule are listed in the order they run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
  tag = "stage",
  rename_all = "kebab-case",
  rename_all_fields = "camelCase"
)]
pub enum Stage {
  /// Style and correctness checks; any violation aborts the build.
  Lint,
  /// Transpile to a baseline syntax target.
  Transpile {
    /// Syntax target.
    target: String,
  },
  /// Compile a preprocessor language to plain CSS.
  Preprocess {
    /// Source language.
    language: String,
  },
  /// Add vendor prefixes.
  VendorPrefix,
  /// Resolve `@import` and `url()` references.
  ResolveStyle {
    /// Number of stages before this one that also run on `@import`ed files.
    import_loaders: u8,
  },
  /// Inject styles into the running page.
  InjectStyle,
  /// Extract styles to a standalone file.
  ExtractStyle,
  /// Embed small files inline, emit larger ones.
  InlineOrEmit {
    /// Files strictly smaller than this many bytes are inlined.
    limit: u64,
    /// Filename template for emitted files.
    name: String,
    /// URL prefix written in front of emitted file references.
    public_path: String,
  },
  /// Generic markup loader.
  FragmentMarkup,
  /// Markup loader for page templates.
  PageMarkup {
    /// Rewrite embedded image references to resolved asset paths.
    rewrite_images: bool,
  },
}

/// Transformation chain for the files matching `test`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRule {
  /// Category handled by this rule.
  pub category: AssetCategory,
  /// Regular expression matched against the file path.
  pub test: String,
  /// Only files under this directory match.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub include: Option<PathBuf>,
  /// Files whose path contains this segment never match.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub exclude: Option<String>,
  /// Ordering hint.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub enforce: Option<Enforce>,
  /// Stages in execution order.
  pub stages: Vec<Stage>,
}

impl TransformationRule {
  pub(crate) fn new(category: AssetCategory, test: &str, stages: Vec<Stage>) -> Self {
    Self {
      category,
      test: test.to_string(),
      include: None,
      exclude: None,
      enforce: None,
      stages,
    }
  }

  pub(crate) fn include(mut self, dir: &Path) -> Self {
    self.include = Some(dir.to_path_buf());
    self
  }

  pub(crate) fn exclude(mut self, segment: &str) -> Self {
    self.exclude = Some(segment.to_string());
    self
  }

  pub(crate) fn enforce(mut self, enforce: Enforce) -> Self {
    self.enforce = Some(enforce);
    self
  }

  /// Compile the rule's pattern once for repeated path checks.
  pub fn matcher(&self) -> PlanResult<RuleMatcher<'_>> {
    let pattern = Regex::new(&self.test)
      .map_err(|err| PlanError::InvalidPolicy(format!("rule pattern '{}': {err}", self.test)))?;
    Ok(RuleMatcher {
      rule: self,
      pattern,
    })
  }
}

/// A [`TransformationRule`] with its pattern compiled.
#[derive(Debug, Clone)]
pub struct RuleMatcher<'a> {
  rule: &'a TransformationRule,
  pattern: Regex,
}

impl RuleMatcher<'_> {
  /// Whether the rule applies to `path`, the way the engine would decide.
  pub fn matches(&self, path: &Path) -> bool {
    if let Some(include) = &self.rule.include
      && !path.starts_with(include)
    {
      return false;
    }

    let text = path.to_string_lossy().replace('\\', "/");
    if let Some(exclude) = &self.rule.exclude
      && text.split('/').any(|segment| segment == exclude)
    {
      return false;
    }

    self.pattern.is_match(&text)
  }
}
