//! Library-wide aggregate counters.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{extract::State, Json};
use maktaba_core::models::Stats;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Aggregate download and view counters", body = Stats),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<Stats>, HttpAppError> {
    let stats = state.stats.get().await?;
    Ok(Json(stats))
}
