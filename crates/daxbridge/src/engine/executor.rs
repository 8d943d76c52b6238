//! Query execution with scoped connections.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::error::{DaxBridgeError, Result};
use crate::repair::RepairedQuery;
use crate::schema::DatasetRef;

use super::connection::{Cursor, EngineConnection, QueryEngine};
use super::descriptor::{ConnectionDescriptor, Credentials};
use super::result::{ResultSet, dedupe_columns};

/// Configuration for the query executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Extra connection attempts after a connectivity failure.
    pub connect_retries: u32,
    /// Credentials used for every connection.
    pub credentials: Credentials,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            connect_retries: 1,
            credentials: Credentials::None,
        }
    }
}

/// Shared flag a caller raises to abandon an in-flight execution.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a new, unraised flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether the flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// A guard that raises this flag when dropped, unless disarmed first.
    pub fn cancel_on_drop(&self) -> CancelOnDrop {
        CancelOnDrop {
            flag: self.clone(),
            armed: true,
        }
    }
}

/// Raises a [`CancelFlag`] on drop.
pub struct CancelOnDrop {
    flag: CancelFlag,
    armed: bool,
}

impl CancelOnDrop {
    /// Consume the guard without cancelling.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}

struct ConnectionGuard(Box<dyn EngineConnection>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.close();
    }
}

struct CursorGuard<'c>(Box<dyn Cursor + 'c>);

impl Drop for CursorGuard<'_> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Runs repaired queries against one dataset.
pub struct QueryExecutor {
    engine: Arc<dyn QueryEngine>,
    descriptor: ConnectionDescriptor,
    config: ExecutorConfig,
}

impl QueryExecutor {
    /// Create an executor for an explicit connection descriptor.
    pub fn new(
        engine: Arc<dyn QueryEngine>,
        descriptor: ConnectionDescriptor,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            engine,
            descriptor,
            config,
        }
    }

    /// Create an executor for a dataset using the configured credentials.
    pub fn for_dataset(
        engine: Arc<dyn QueryEngine>,
        dataset: &DatasetRef,
        config: &ExecutorConfig,
    ) -> Self {
        let descriptor = ConnectionDescriptor::new(dataset.clone(), config.credentials.clone());
        Self::new(engine, descriptor, config.clone())
    }

    /// Execute a repaired query and materialize every row.
    pub fn execute(&self, query: &RepairedQuery) -> Result<ResultSet> {
        self.execute_cancellable(query, &CancelFlag::new())
    }

    /// Execute a repaired query, stopping early if `cancel` is raised.
    pub fn execute_cancellable(
        &self,
        query: &RepairedQuery,
        cancel: &CancelFlag,
    ) -> Result<ResultSet> {
        self.run(query.as_str(), cancel)
    }

    pub(crate) fn run(&self, query: &str, cancel: &CancelFlag) -> Result<ResultSet> {
        if query.trim().is_empty() {
            return Err(DaxBridgeError::NoQuery);
        }
        if cancel.is_cancelled() {
            return Err(DaxBridgeError::Cancelled);
        }

        debug!(engine = self.engine.name(), query, "executing DAX");

        let result = self.fetch_all(query, cancel);
        match &result {
            Ok(rs) => info!(
                dataset = %self.descriptor.dataset,
                rows = rs.row_count(),
                "DAX executed successfully"
            ),
            Err(DaxBridgeError::Cancelled) => {
                warn!(dataset = %self.descriptor.dataset, "DAX execution cancelled")
            }
            Err(e) => error!(dataset = %self.descriptor.dataset, error = %e, "error executing DAX"),
        }
        result
    }

    fn fetch_all(&self, query: &str, cancel: &CancelFlag) -> Result<ResultSet> {
        let mut connection = self.connect()?;
        let mut cursor = CursorGuard(connection.0.execute(query)?);

        let columns = dedupe_columns(cursor.0.columns().to_vec());
        let mut rows = Vec::new();
        loop {
            if cancel.is_cancelled() {
                return Err(DaxBridgeError::Cancelled);
            }
            match cursor.0.next_row()? {
                Some(row) => rows.push(row),
                None => break,
            }
        }

        Ok(ResultSet::from_values(columns, rows))
    }

    fn connect(&self) -> Result<ConnectionGuard> {
        let attempts = self.config.connect_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            match self.engine.connect(&self.descriptor) {
                Ok(connection) => return Ok(ConnectionGuard(connection)),
                Err(failure) if failure.kind.is_transient() && attempt < attempts => {
                    warn!(
                        engine = self.engine.name(),
                        attempt,
                        error = %failure,
                        "engine connection failed, retrying"
                    );
                    attempt += 1;
                }
                Err(failure) => return Err(failure.into()),
            }
        }
    }
}
