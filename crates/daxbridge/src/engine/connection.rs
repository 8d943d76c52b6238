//! Engine adapter traits.

use std::time::Duration;

use serde_json::Value;

use super::descriptor::ConnectionDescriptor;
use super::failure::EngineResult;

/// Configuration shared by engine adapters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Timeout for a single engine call.
    pub timeout: Duration,
    /// Base URL of the engine's REST API.
    pub api_base: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            api_base: "https://api.powerbi.com/v1.0/myorg".to_string(),
        }
    }
}

/// Something that can execute a DAX query string against a dataset.
///
/// Adapters are chosen at startup and shared across requests, so they must be
/// thread-safe. Connections are not: each execution acquires its own.
pub trait QueryEngine: Send + Sync {
    /// Open a connection for one execution.
    fn connect(&self, descriptor: &ConnectionDescriptor) -> EngineResult<Box<dyn EngineConnection>>;

    /// Get the name of this engine (for logging/debugging).
    fn name(&self) -> &str;
}

/// An open engine connection.
pub trait EngineConnection: Send {
    /// Issue a query and return a cursor over its result.
    fn execute<'c>(&'c mut self, query: &str) -> EngineResult<Box<dyn Cursor + 'c>>;

    /// Release the connection. Must be idempotent.
    fn close(&mut self);
}

/// A forward-only cursor over a query result.
pub trait Cursor {
    /// Column names, in engine order.
    fn columns(&self) -> &[String];

    /// Fetch the next row, or `None` when exhausted.
    fn next_row(&mut self) -> EngineResult<Option<Vec<Value>>>;

    /// Close the cursor. Must be idempotent.
    fn close(&mut self);
}
