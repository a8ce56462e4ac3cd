//! Checks run on the discovered page set before anything else consumes it.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{PlanError, PlanResult};
use crate::pages::PageDescriptor;

/// Fail fast on duplicate ids and on entries without a template.
pub fn validate_pages(pages: &[PageDescriptor]) -> PlanResult<()> {
  ensure_unique_ids(pages)?;
  ensure_templates_exist(pages)
}

fn ensure_unique_ids(pages: &[PageDescriptor]) -> PlanResult<()> {
  let mut claimed: BTreeMap<&str, &Path> = BTreeMap::new();

  for page in pages {
    if let Some(first) = claimed.insert(&page.id, &page.source_entry_path) {
      return Err(PlanError::DuplicateId {
        id: page.id.clone(),
        first: first.to_path_buf(),
        second: page.source_entry_path.clone(),
      });
    }
  }

  Ok(())
}

fn ensure_templates_exist(pages: &[PageDescriptor]) -> PlanResult<()> {
  match pages.iter().find(|page| !page.template_path.is_file()) {
    Some(page) => Err(PlanError::MissingTemplate {
      page: page.id.clone(),
      template: page.template_path.clone(),
    }),
    None => Ok(()),
  }
}
