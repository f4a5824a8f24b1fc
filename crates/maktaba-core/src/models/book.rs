//! Book model and payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::entity_ref::{validate_entity_ref, validate_entity_refs, EntityRef};
use super::taxonomy::{Category, Person, Place, Tag};

/// Database row for a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub author_id: i64,
    pub category_id: i64,
    pub place_id: Option<i64>,
    pub language: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub downloads: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Book with its related entities, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub author: Person,
    pub category: Category,
    pub place: Option<Place>,
    pub tags: Vec<Tag>,
    pub language: Option<String>,
    pub file_size: Option<i64>,
    pub has_file: bool,
    pub downloads: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload. Updates are full replacements: omitting a
/// previously linked tag unlinks it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BookPayload {
    #[validate(
        length(min = 1, max = 500, message = "title must be 1-500 characters"),
        custom(function = super::validate_title)
    )]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom(function = validate_entity_ref))]
    pub author: EntityRef,
    #[validate(range(min = 1, message = "category_id must be a positive id"))]
    pub category_id: i64,
    #[validate(custom(function = validate_entity_ref))]
    pub place: Option<EntityRef>,
    #[serde(default)]
    #[validate(custom(function = validate_entity_refs))]
    pub tags: Vec<EntityRef>,
    #[validate(length(max = 32))]
    pub language: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_accepts_mixed_references() {
        let payload: BookPayload = serde_json::from_value(serde_json::json!({
            "title": "Tafsir al-Qur'an al-'Azim",
            "author": "Ibn Kathir",
            "category_id": 3,
            "tags": [1, "tafsir", 2]
        }))
        .unwrap();
        assert_eq!(payload.author, EntityRef::ByName("Ibn Kathir".into()));
        assert_eq!(payload.tags[0], EntityRef::ById(1));
        assert_eq!(payload.tags[1], EntityRef::ByName("tafsir".into()));
        assert!(payload.active);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn payload_rejects_blank_tag_name() {
        let payload: BookPayload = serde_json::from_value(serde_json::json!({
            "title": "Riyadh as-Salihin",
            "author": 1,
            "category_id": 2,
            "tags": ["  "]
        }))
        .unwrap();
        assert!(validator::Validate::validate(&payload).is_err());
    }

    #[test]
    fn payload_rejects_whitespace_only_title() {
        let payload: BookPayload = serde_json::from_value(serde_json::json!({
            "title": "   ",
            "author": "Someone",
            "category_id": 2
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_rejects_non_positive_author_id() {
        let payload: BookPayload = serde_json::from_value(serde_json::json!({
            "title": "Bulugh al-Maram",
            "author": 0,
            "category_id": 2
        }))
        .unwrap();
        assert!(validator::Validate::validate(&payload).is_err());
    }
}
