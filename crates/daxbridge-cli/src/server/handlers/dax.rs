//! Handlers working on DAX text directly.

use std::sync::Arc;

use axum::{extract::State, Json};
use daxbridge::repair::repair;
use daxbridge::{CancelFlag, QueryCandidate, ResultSet};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::query::{run_blocking, ConnectionStr};
use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request to run caller-written DAX.
#[derive(Debug, Deserialize)]
pub struct ExecuteDaxRequest {
    #[serde(default)]
    pub dax_query: String,

    #[serde(default)]
    pub connection_str: ConnectionStr,
}

#[derive(Debug, Serialize)]
pub struct ExecuteDaxResponse {
    /// The query as sent to the engine, after repair.
    pub dax: String,
    pub result_set: ResultSet,
}

/// Request to repair a raw model reply.
#[derive(Debug, Deserialize)]
pub struct CleanDaxRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct CleanDaxResponse {
    pub original: String,
    pub cleaned: String,
    pub removed_characters: usize,
}

/// POST /api/powerbi/execute-dax - Repair and run caller-supplied DAX.
pub async fn execute_dax(
    State(state): State<AppState>,
    Json(request): Json<ExecuteDaxRequest>,
) -> Result<Json<ExecuteDaxResponse>, ApiError> {
    let dataset = request.connection_str.dataset_ref()?;
    if request.dax_query.trim().is_empty() {
        return Err(ApiError::BadRequest("dax_query is required".to_string()));
    }
    info!(dataset = %dataset, "execute-dax request");

    let cancel = CancelFlag::new();
    let guard = cancel.cancel_on_drop();
    let service = Arc::clone(&state.service);
    let dax = request.dax_query;

    let result = run_blocking(move || service.execute_dax(&dataset, &dax, &cancel)).await;
    guard.disarm();

    let (query, result_set) = result??;
    Ok(Json(ExecuteDaxResponse {
        dax: query.into_string(),
        result_set,
    }))
}

/// POST /api/powerbi/clean-dax - Repair a raw reply without running it.
pub async fn clean_dax(Json(request): Json<CleanDaxRequest>) -> Result<Json<CleanDaxResponse>, ApiError> {
    if request.query.trim().is_empty() {
        return Err(ApiError::BadRequest("Query is required".to_string()));
    }

    let candidate = QueryCandidate::from_reply(&request.query);
    let cleaned = repair(&candidate.text).into_string();
    let removed_characters = request
        .query
        .chars()
        .count()
        .saturating_sub(cleaned.chars().count());

    Ok(Json(CleanDaxResponse {
        original: request.query,
        cleaned,
        removed_characters,
    }))
}
