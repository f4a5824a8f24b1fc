//! Video model and payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::entity_ref::{validate_entity_ref, validate_entity_refs, EntityRef};
use super::taxonomy::{Category, Person, Place, Tag};

/// Database row for a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category_id: i64,
    pub place_id: Option<i64>,
    pub language: Option<String>,
    pub file_path: Option<String>,
    pub file_size: Option<i64>,
    pub views: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Video with its related entities, as returned by the API.
/// Speakers keep the order they were supplied in.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VideoDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub speakers: Vec<Person>,
    pub category: Category,
    pub place: Option<Place>,
    pub tags: Vec<Tag>,
    pub language: Option<String>,
    pub file_size: Option<i64>,
    pub has_file: bool,
    pub views: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload. Speaker and tag sets are replaced wholesale on
/// update.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct VideoPayload {
    #[validate(
        length(min = 1, max = 500, message = "title must be 1-500 characters"),
        custom(function = super::validate_title)
    )]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(
        length(min = 1, message = "at least one speaker is required"),
        custom(function = validate_entity_refs)
    )]
    pub speakers: Vec<EntityRef>,
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
    fn payload_requires_a_speaker() {
        let payload: VideoPayload = serde_json::from_value(serde_json::json!({
            "title": "Sirah lecture 1",
            "speakers": [],
            "category_id": 1
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_rejects_whitespace_only_title() {
        let payload: VideoPayload = serde_json::from_value(serde_json::json!({
            "title": " \t ",
            "speakers": ["Someone"],
            "category_id": 1
        }))
        .unwrap();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_accepts_id_and_name_speakers() {
        let payload: VideoPayload = serde_json::from_value(serde_json::json!({
            "title": "Sirah lecture 2",
            "speakers": [7, "Al-Shaykh Ahmad"],
            "category_id": 1
        }))
        .unwrap();
        assert!(payload.validate().is_ok());
        assert_eq!(payload.speakers.len(), 2);
    }
}
