//! Page discovery and the validation passes that run right after it.

mod discovery;
mod validation;

pub use discovery::{ID_DELIMITER, PageDescriptor, discover, page_id};
pub use validation::validate_pages;
