//! Polymorphic entity references.
//!
//! Write payloads accept related entities (author, speakers, place, tags)
//! either as an existing row id or as a free-text name to be created during
//! resolution. Modeled as a sum type so both branches are exhaustive and
//! compiler-checked.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use utoipa::ToSchema;
use validator::ValidationError;

/// An existing row id or a name to find-or-create.
///
/// Deserializes untagged: a JSON integer becomes `ById`, a JSON string
/// becomes `ByName`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EntityRef {
    ById(i64),
    ByName(String),
}

impl EntityRef {
    /// Payload-level validity: ids must be positive, names non-blank.
    pub fn is_valid(&self) -> bool {
        match self {
            EntityRef::ById(id) => *id > 0,
            EntityRef::ByName(name) => !name.trim().is_empty(),
        }
    }
}

/// validator hook for a single reference field.
pub fn validate_entity_ref(value: &EntityRef) -> Result<(), ValidationError> {
    if value.is_valid() {
        Ok(())
    } else {
        let mut err = ValidationError::new("entity_ref");
        err.message = Some(Cow::from(
            "must be a positive id or a non-empty name",
        ));
        Err(err)
    }
}

/// validator hook for a list of references (tags, speakers).
pub fn validate_entity_refs(values: &Vec<EntityRef>) -> Result<(), ValidationError> {
    if values.iter().all(EntityRef::is_valid) {
        Ok(())
    } else {
        let mut err = ValidationError::new("entity_refs");
        err.message = Some(Cow::from(
            "each element must be a positive id or a non-empty name",
        ));
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_deserializes_to_id() {
        let r: EntityRef = serde_json::from_str("42").unwrap();
        assert_eq!(r, EntityRef::ById(42));
    }

    #[test]
    fn string_deserializes_to_name() {
        let r: EntityRef = serde_json::from_str("\"Ibn Kathir\"").unwrap();
        assert_eq!(r, EntityRef::ByName("Ibn Kathir".to_string()));
    }

    #[test]
    fn numeric_string_stays_a_name() {
        // "12" the string is a name, not an id; only JSON integers resolve by id.
        let r: EntityRef = serde_json::from_str("\"12\"").unwrap();
        assert_eq!(r, EntityRef::ByName("12".to_string()));
    }

    #[test]
    fn validity_rules() {
        assert!(EntityRef::ById(1).is_valid());
        assert!(!EntityRef::ById(0).is_valid());
        assert!(!EntityRef::ById(-5).is_valid());
        assert!(EntityRef::ByName("Qurtubi".to_string()).is_valid());
        assert!(!EntityRef::ByName("   ".to_string()).is_valid());
        assert!(!EntityRef::ByName(String::new()).is_valid());
    }
}
