//! Schema handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use daxbridge::{DatasetRef, Schema};
use serde::{Deserialize, Serialize};

use super::query::ConnectionStr;
use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request naming a dataset.
#[derive(Debug, Deserialize)]
pub struct DatasetRequest {
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
}

impl DatasetRequest {
    fn dataset_ref(self) -> Result<DatasetRef, ApiError> {
        ConnectionStr {
            workspace: self.workspace,
            dataset: self.dataset,
        }
        .dataset_ref()
    }
}

/// Table and column counts of a loaded schema.
#[derive(Debug, Serialize)]
pub struct SchemaSummary {
    pub workspace: String,
    pub dataset: String,
    pub tables: Vec<TableSummary>,
    pub column_count: usize,
}

#[derive(Debug, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub columns: usize,
    pub derived_columns: usize,
}

impl SchemaSummary {
    fn new(dataset: &DatasetRef, schema: &Schema) -> Self {
        let tables = schema
            .table_names()
            .into_iter()
            .map(|name| {
                let columns = schema.table(name).unwrap_or_default();
                TableSummary {
                    name: name.to_string(),
                    columns: columns.len(),
                    derived_columns: columns.iter().filter(|c| c.derived).count(),
                }
            })
            .collect();
        Self {
            workspace: dataset.workspace.clone(),
            dataset: dataset.dataset.clone(),
            tables,
            column_count: schema.column_count(),
        }
    }
}

/// GET /api/schema - Get a dataset's schema, loading it if needed.
pub async fn get_schema(
    State(state): State<AppState>,
    Query(request): Query<DatasetRequest>,
) -> Result<Json<Schema>, ApiError> {
    let dataset = request.dataset_ref()?;
    let service = Arc::clone(&state.service);
    let schema = tokio::task::spawn_blocking(move || service.schema(&dataset))
        .await
        .map_err(|e| ApiError::Internal(format!("Schema task failed: {}", e)))??;
    Ok(Json(schema.as_ref().clone()))
}

/// POST /api/schema/refresh - Reload a dataset's schema from its source.
pub async fn refresh_schema(
    State(state): State<AppState>,
    Json(request): Json<DatasetRequest>,
) -> Result<Json<SchemaSummary>, ApiError> {
    let dataset = request.dataset_ref()?;
    let service = Arc::clone(&state.service);
    let summary = tokio::task::spawn_blocking(move || {
        service
            .refresh_schema(&dataset)
            .map(|schema| SchemaSummary::new(&dataset, &schema))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Schema task failed: {}", e)))??;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<String>,
}

/// GET /api/powerbi/suggest-questions - Questions worth asking about a dataset.
pub async fn suggest_questions(
    State(state): State<AppState>,
    Query(request): Query<DatasetRequest>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let dataset = request.dataset_ref()?;
    let service = Arc::clone(&state.service);
    let suggestions = tokio::task::spawn_blocking(move || service.suggest_questions(&dataset))
        .await
        .map_err(|e| ApiError::Internal(format!("Suggestion task failed: {}", e)))??;
    Ok(Json(SuggestionsResponse { suggestions }))
}
