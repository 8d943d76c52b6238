//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use daxbridge::DaxBridgeError;
use serde::Serialize;
use tracing::error;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// Internal server error.
    Internal(String),
    /// Error from the daxbridge pipeline.
    Pipeline(DaxBridgeError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ApiError::Pipeline(e) => match e {
                DaxBridgeError::SchemaUnavailable(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "schema_unavailable")
                }
                DaxBridgeError::Translation(_)
                | DaxBridgeError::TranslationTimeout(_)
                | DaxBridgeError::TranslationExhausted { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "translation_failed")
                }
                DaxBridgeError::NoQuery => (StatusCode::BAD_REQUEST, "no_query"),
                DaxBridgeError::Execution(_) => (StatusCode::INTERNAL_SERVER_ERROR, "execution_failed"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        let message = match self {
            ApiError::BadRequest(msg) | ApiError::Internal(msg) => msg,
            ApiError::Pipeline(e) => e.to_string(),
        };

        if status.is_server_error() {
            error!(status = status.as_u16(), error, %message, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<DaxBridgeError> for ApiError {
    fn from(err: DaxBridgeError) -> Self {
        ApiError::Pipeline(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}
