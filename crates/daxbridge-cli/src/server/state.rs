//! Application state for the web server.

use std::sync::Arc;

use daxbridge::OrchestrationService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The question-answering pipeline. Holds the only shared mutable state,
    /// the schema cache.
    pub service: Arc<OrchestrationService>,
}

impl AppState {
    /// Create new application state.
    pub fn new(service: OrchestrationService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
