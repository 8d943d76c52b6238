//! Typed engine failures and message classification.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static COLUMN_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)column '([^']+)'").unwrap());
static TABLE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)table '([^']+)'").unwrap());

/// What kind of failure the engine reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineErrorKind {
    /// The query ended before it was complete.
    IncompleteQuery,
    /// A referenced column or table does not exist in the model.
    NotFound {
        #[serde(skip_serializing_if = "Option::is_none")]
        column: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
    },
    /// The query was rejected by the parser.
    Syntax,
    /// The engine could not be reached.
    Connectivity,
    /// The engine call exceeded its timeout.
    Timeout,
    /// Anything else.
    Other,
}

impl EngineErrorKind {
    /// Classify an engine error message.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();

        if lower.contains("timed out") || lower.contains("timeout") {
            EngineErrorKind::Timeout
        } else if lower.contains("end of the input was reached") {
            EngineErrorKind::IncompleteQuery
        } else if lower.contains("cannot be found") || lower.contains("not found") {
            EngineErrorKind::NotFound {
                column: COLUMN_NAME
                    .captures(message)
                    .map(|c| c[1].to_string()),
                table: TABLE_NAME.captures(message).map(|c| c[1].to_string()),
            }
        } else if lower.contains("syntax") {
            EngineErrorKind::Syntax
        } else if lower.contains("could not connect")
            || lower.contains("connection refused")
            || lower.contains("unreachable")
        {
            EngineErrorKind::Connectivity
        } else {
            EngineErrorKind::Other
        }
    }

    /// A short remediation hint for operators and end users.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            EngineErrorKind::IncompleteQuery => {
                Some("Check that the DAX query is complete and properly formatted")
            }
            EngineErrorKind::NotFound { .. } => {
                Some("Check column and table names against the dataset schema")
            }
            EngineErrorKind::Syntax => Some(
                "Check DAX syntax - common issues: missing EVALUATE, incorrect function usage",
            ),
            EngineErrorKind::Connectivity => Some("Check that the data source is reachable"),
            EngineErrorKind::Timeout => Some("Simplify the question or raise the engine timeout"),
            EngineErrorKind::Other => None,
        }
    }

    /// Whether a retry may succeed without changing the query.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineErrorKind::Connectivity)
    }
}

/// An engine-reported failure, carrying the original message.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ExecutionFailure {
    /// Classified failure kind.
    #[serde(flatten)]
    pub kind: EngineErrorKind,
    /// The engine's message, verbatim.
    pub message: String,
}

impl ExecutionFailure {
    /// Create a failure with an explicit kind.
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Create a failure, classifying the message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: EngineErrorKind::classify(&message),
            message,
        }
    }

    /// Connectivity failure.
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Connectivity, message)
    }

    /// Timeout failure.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Timeout, message)
    }
}

/// Result type for engine adapter calls.
pub type EngineResult<T> = std::result::Result<T, ExecutionFailure>;
