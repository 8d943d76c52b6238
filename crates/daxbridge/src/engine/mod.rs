//! Query execution against a DAX engine.
//!
//! Engine adapters implement [`QueryEngine`]; the [`QueryExecutor`] owns
//! connection and cursor lifetimes so nothing leaks on error or cancellation.

mod connection;
mod descriptor;
mod executor;
mod failure;
mod memory;
mod powerbi;
mod result;

pub use connection::{Cursor, EngineConfig, EngineConnection, QueryEngine};
pub use descriptor::{ConnectionDescriptor, Credentials};
pub use executor::{CancelFlag, CancelOnDrop, ExecutorConfig, QueryExecutor};
pub use failure::{EngineErrorKind, EngineResult, ExecutionFailure};
pub use memory::InMemoryEngine;
pub use powerbi::{ACCESS_TOKEN_VAR, PowerBiRestEngine};
pub use result::{ResultSet, Row};
