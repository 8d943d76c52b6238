//! Question handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use daxbridge::{
    AnswerResult, CancelFlag, Conversation, DatasetRef, SuggestionEngine, TranslationOutcome,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Identifies the dataset a question targets.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectionStr {
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub dataset: Option<String>,
}

impl ConnectionStr {
    /// Both identifiers, or a 400.
    pub fn dataset_ref(&self) -> Result<DatasetRef, ApiError> {
        match (non_blank(&self.workspace), non_blank(&self.dataset)) {
            (Some(workspace), Some(dataset)) => Ok(DatasetRef::new(workspace, dataset)),
            _ => Err(ApiError::BadRequest(
                "Workspace and dataset must be provided".to_string(),
            )),
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Request for a natural-language question.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// The question to answer.
    #[serde(default)]
    pub question: String,

    /// Target workspace and dataset.
    #[serde(default)]
    pub connection_str: ConnectionStr,

    /// Earlier turns of this conversation, owned by the caller.
    #[serde(default)]
    pub conversation: Conversation,
}

impl QueryRequest {
    fn question(&self) -> Result<String, ApiError> {
        let question = self.question.trim();
        if question.is_empty() {
            return Err(ApiError::BadRequest("Question must not be empty".to_string()));
        }
        Ok(question.to_string())
    }
}

/// Response of the translate-only endpoint.
#[derive(Debug, Serialize)]
pub struct QueryNaturalResponse {
    /// Repaired DAX; empty when none could be generated.
    pub dax: String,
    /// The model's description of the answer.
    pub answer: Option<String>,
    /// Alternative questions.
    pub suggestions: Vec<String>,
}

/// Response of the full pipeline endpoint.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    #[serde(flatten)]
    pub result: AnswerResult,
    /// The conversation with this exchange appended.
    pub conversation: Conversation,
}

/// Run pipeline work off the async runtime.
pub(super) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Pipeline task failed: {}", e)))
}

/// POST /api/powerbi/query-natural - Translate a question into repaired DAX.
pub async fn query_natural(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryNaturalResponse>, ApiError> {
    let dataset = request.connection_str.dataset_ref()?;
    let question = request.question()?;
    info!(dataset = %dataset, question = %question, "query-natural request");

    let service = Arc::clone(&state.service);
    let outcome = run_blocking(move || -> daxbridge::Result<TranslationOutcome> {
        let mut outcome = service.translate(&dataset, &question)?;
        if !outcome.is_usable() && outcome.suggestions.is_empty() {
            outcome.suggestions = SuggestionEngine::for_schema(&*service.schema(&dataset)?);
        }
        Ok(outcome)
    })
    .await??;

    Ok(Json(QueryNaturalResponse {
        dax: outcome.query.into_string(),
        answer: outcome.answer,
        suggestions: outcome.suggestions,
    }))
}

/// POST /api/powerbi/ask - Translate, repair and execute a question.
///
/// Execution is cancelled if the client goes away before it finishes.
pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let dataset = request.connection_str.dataset_ref()?;
    let question = request.question()?;
    let mut conversation = request.conversation;
    info!(dataset = %dataset, question = %question, turns = conversation.len(), "ask request");

    let cancel = CancelFlag::new();
    let guard = cancel.cancel_on_drop();
    let service = Arc::clone(&state.service);

    let result = run_blocking(move || {
        service
            .answer_cancellable(&dataset, &question, &mut conversation, &cancel)
            .map(|result| (result, conversation))
    })
    .await;
    guard.disarm();

    let (result, conversation) = result??;
    Ok(Json(AskResponse {
        result,
        conversation,
    }))
}
