//! Domain models: database rows, API payloads, and response shapes.

pub mod book;
pub mod entity_ref;
pub mod stats;
pub mod taxonomy;
pub mod video;

use std::borrow::Cow;
use validator::ValidationError;

/// Titles are stored trimmed, so a whitespace-only value would collapse to
/// the empty string; reject it before it reaches the database.
pub(crate) fn validate_title(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("title");
        err.message = Some(Cow::from("title must not be blank"));
        return Err(err);
    }
    Ok(())
}

pub use book::{Book, BookDetail, BookPayload};
pub use entity_ref::EntityRef;
pub use stats::Stats;
pub use taxonomy::{Category, Person, Place, Tag};
pub use video::{Video, VideoDetail, VideoPayload};
