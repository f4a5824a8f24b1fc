//! Find-or-create entity resolution.
//!
//! Write payloads reference related entities either by id or by free-text
//! name (see [`EntityRef`]). Resolution turns every reference into a concrete
//! row id, creating rows where a name was supplied:
//!
//! - **Tags** upsert by their unique name, so concurrent requests with the
//!   same new tag name converge on a single row.
//! - **People and places** always insert a fresh row for a name, even when an
//!   identically named row exists. Their names are not unique (distinct
//!   scholars share names); catalogers dedupe by picking an id.
//! - **Categories** are id-only; there is no creation branch.
//!
//! All functions take the write transaction so a failed reference aborts the
//! whole batch with nothing applied.

use maktaba_core::{AppError, EntityRef};
use sqlx::{Postgres, Transaction};

/// Which role a person reference plays; only affects error wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonRole {
    Author,
    Speaker,
}

impl PersonRole {
    fn label(self) -> &'static str {
        match self {
            PersonRole::Author => "Author",
            PersonRole::Speaker => "Speaker",
        }
    }
}

/// Resolve an author/speaker reference to a person id.
pub async fn resolve_person(
    tx: &mut Transaction<'_, Postgres>,
    role: PersonRole,
    reference: &EntityRef,
) -> Result<i64, AppError> {
    match reference {
        EntityRef::ById(id) => {
            let exists = sqlx::query_scalar::<Postgres, bool>(
                "SELECT EXISTS(SELECT 1 FROM people WHERE id = $1)",
            )
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;
            if !exists {
                return Err(AppError::BadRequest(format!(
                    "{} with id {} not found",
                    role.label(),
                    id
                )));
            }
            Ok(*id)
        }
        EntityRef::ByName(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::InvalidInput(format!(
                    "{} name must not be empty",
                    role.label()
                )));
            }
            let id = sqlx::query_scalar::<Postgres, i64>(
                "INSERT INTO people (name) VALUES ($1) RETURNING id",
            )
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;
            tracing::debug!(person_id = id, name = %name, "Created person from free-text reference");
            Ok(id)
        }
    }
}

/// Resolve a place reference to a place id.
pub async fn resolve_place(
    tx: &mut Transaction<'_, Postgres>,
    reference: &EntityRef,
) -> Result<i64, AppError> {
    match reference {
        EntityRef::ById(id) => {
            let exists = sqlx::query_scalar::<Postgres, bool>(
                "SELECT EXISTS(SELECT 1 FROM places WHERE id = $1)",
            )
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;
            if !exists {
                return Err(AppError::BadRequest(format!(
                    "Place with id {} not found",
                    id
                )));
            }
            Ok(*id)
        }
        EntityRef::ByName(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::InvalidInput(
                    "Place name must not be empty".to_string(),
                ));
            }
            let id = sqlx::query_scalar::<Postgres, i64>(
                "INSERT INTO places (name) VALUES ($1) RETURNING id",
            )
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;
            tracing::debug!(place_id = id, name = %name, "Created place from free-text reference");
            Ok(id)
        }
    }
}

/// Resolve a single tag reference. Names upsert atomically on the unique
/// name column, so two concurrent creates of the same tag name return the
/// same id.
pub async fn resolve_tag(
    tx: &mut Transaction<'_, Postgres>,
    reference: &EntityRef,
) -> Result<i64, AppError> {
    match reference {
        EntityRef::ById(id) => {
            let exists = sqlx::query_scalar::<Postgres, bool>(
                "SELECT EXISTS(SELECT 1 FROM tags WHERE id = $1)",
            )
            .bind(id)
            .fetch_one(&mut **tx)
            .await?;
            if !exists {
                return Err(AppError::BadRequest(format!("Tag with id {} not found", id)));
            }
            Ok(*id)
        }
        EntityRef::ByName(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::InvalidInput(
                    "Tag name must not be empty".to_string(),
                ));
            }
            // DO UPDATE instead of DO NOTHING so RETURNING always yields the
            // surviving row's id.
            let id = sqlx::query_scalar::<Postgres, i64>(
                "INSERT INTO tags (name) VALUES ($1) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
                 RETURNING id",
            )
            .bind(name)
            .fetch_one(&mut **tx)
            .await?;
            Ok(id)
        }
    }
}

/// Resolve a list of tag references in the supplied order. The first
/// unresolvable reference fails the whole batch.
pub async fn resolve_tags(
    tx: &mut Transaction<'_, Postgres>,
    references: &[EntityRef],
) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::with_capacity(references.len());
    for reference in references {
        let id = resolve_tag(tx, reference).await?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Resolve a list of speaker references in the supplied order.
pub async fn resolve_speakers(
    tx: &mut Transaction<'_, Postgres>,
    references: &[EntityRef],
) -> Result<Vec<i64>, AppError> {
    let mut ids = Vec::with_capacity(references.len());
    for reference in references {
        let id = resolve_person(tx, PersonRole::Speaker, reference).await?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Validate that a category id exists. Categories have no free-text creation
/// path and a missing id is a 404-class error.
pub async fn require_category(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
) -> Result<i64, AppError> {
    let exists = sqlx::query_scalar::<Postgres, bool>(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = $1)",
    )
    .bind(id)
    .fetch_one(&mut **tx)
    .await?;
    if !exists {
        return Err(AppError::NotFound(format!(
            "Category with id {} not found",
            id
        )));
    }
    Ok(id)
}
