//! Lint seam run over every page script before a configuration is produced.
//!
//! The rule set itself belongs to an external linter. [`PatternLint`] covers the simple
//! case of forbidding source patterns listed in the project configuration.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::chunks::page_scripts;
use crate::error::{PlanError, PlanResult};
use crate::pages::PageDescriptor;
use crate::project::ProjectLayout;

/// A single style or correctness violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintViolation {
  /// One-based line number.
  pub line: usize,
  /// Description of the violated rule.
  pub message: String,
}

/// Lint rule set applied to page scripts.
pub trait ScriptLint {
  /// Return every violation found in `source`.
  fn check(&self, path: &Path, source: &str) -> Vec<LintViolation>;
}

/// Accepts every script.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLint;

impl ScriptLint for NoLint {
  fn check(&self, _path: &Path, _source: &str) -> Vec<LintViolation> {
    Vec::new()
  }
}

/// Rejects lines matching any of a list of regular expressions.
#[derive(Debug, Clone, Default)]
pub struct PatternLint {
  forbidden: Vec<Regex>,
}

impl PatternLint {
  /// Compile the forbidden patterns.
  pub fn new<I, S>(patterns: I) -> PlanResult<Self>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let forbidden = patterns
      .into_iter()
      .map(|pattern| {
        Regex::new(pattern.as_ref()).map_err(|err| {
          PlanError::InvalidPolicy(format!("lint pattern '{}': {err}", pattern.as_ref()))
        })
      })
      .collect::<PlanResult<Vec<_>>>()?;

    Ok(Self { forbidden })
  }
}

impl ScriptLint for PatternLint {
  fn check(&self, _path: &Path, source: &str) -> Vec<LintViolation> {
    let mut violations = Vec::new();
    for (index, line) in source.lines().enumerate() {
      for pattern in &self.forbidden {
        if pattern.is_match(line) {
          violations.push(LintViolation {
            line: index + 1,
            message: format!("matches forbidden pattern `{}`", pattern.as_str()),
          });
        }
      }
    }
    violations
  }
}

/// Lint every script each page loads; the first page with violations aborts the run.
///
/// A module shared by several pages is checked once, under the first page that reaches it.
pub fn lint_pages<L: ScriptLint + ?Sized>(
  lint: &L,
  layout: &ProjectLayout,
  pages: &[PageDescriptor],
) -> PlanResult<()> {
  let mut checked = BTreeSet::new();

  for page in pages {
    for path in page_scripts(layout, page) {
      if !checked.insert(path.clone()) {
        continue;
      }

      let source = fs::read_to_string(&path).map_err(|err| PlanError::io(&path, err))?;
      let violations = lint.check(&path, &source);
      if !violations.is_empty() {
        return Err(PlanError::Lint {
          page: page.id.clone(),
          violations: violations
            .iter()
            .map(|violation| {
              format!(
                "{}:{}: {}",
                path.display(),
                violation.line,
                violation.message
              )
            })
            .collect(),
        });
      }
    }
  }

  debug!(
    "lint passed for {} script(s) across {} page(s)",
    checked.len(),
    pages.len()
  );
  Ok(())
}
