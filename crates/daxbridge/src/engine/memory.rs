//! In-memory engine with canned responses, for tests and offline demos.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{DaxBridgeError, Result};

use super::connection::{Cursor, EngineConnection, QueryEngine};
use super::descriptor::ConnectionDescriptor;
use super::executor::CancelFlag;
use super::failure::{EngineResult, ExecutionFailure};

/// What the engine answers for a registered query.
#[derive(Debug, Clone)]
enum CannedResponse {
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
    Error(String),
}

/// One entry of a fixtures file.
#[derive(Debug, Deserialize)]
struct Fixture {
    query: String,
    #[serde(default)]
    columns: Vec<String>,
    #[serde(default)]
    rows: Vec<Vec<Value>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default)]
struct Stats {
    connect_attempts: AtomicUsize,
    connections_opened: AtomicUsize,
    open_connections: AtomicUsize,
    open_cursors: AtomicUsize,
    executions: AtomicUsize,
    rows_read: AtomicUsize,
    closed_with_open_cursor: AtomicUsize,
}

#[derive(Debug, Default)]
struct Inner {
    responses: IndexMap<String, CannedResponse>,
    fallback: Option<CannedResponse>,
    connect_failures: AtomicUsize,
    cancel_after: Option<(usize, CancelFlag)>,
    stats: Stats,
    executed: Mutex<Vec<String>>,
}

/// Engine answering from a table of registered queries.
///
/// Queries are matched after collapsing whitespace. Counters expose how many
/// connections and cursors are open so tests can check they are released.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEngine {
    inner: Arc<Inner>,
}

fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl InMemoryEngine {
    /// Create an engine with no registered queries.
    pub fn new() -> Self {
        Self::default()
    }

    fn inner_mut(&mut self) -> &mut Inner {
        detach(&mut self.inner)
    }

    /// Register a tabular result for a query.
    pub fn with_result(
        mut self,
        query: &str,
        columns: Vec<&str>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        let columns = columns.into_iter().map(String::from).collect();
        self.inner_mut()
            .responses
            .insert(normalize_query(query), CannedResponse::Table { columns, rows });
        self
    }

    /// Register an engine error for a query.
    pub fn with_error(mut self, query: &str, message: impl Into<String>) -> Self {
        self.inner_mut()
            .responses
            .insert(normalize_query(query), CannedResponse::Error(message.into()));
        self
    }

    /// Answer unregistered queries with this error instead of the default one.
    pub fn with_fallback_error(mut self, message: impl Into<String>) -> Self {
        self.inner_mut().fallback = Some(CannedResponse::Error(message.into()));
        self
    }

    /// Fail the next `n` connection attempts with a connectivity error.
    pub fn with_connect_failures(self, n: usize) -> Self {
        self.inner.connect_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Raise `flag` once a cursor has handed out `rows` rows.
    pub fn with_cancel_after(mut self, rows: usize, flag: CancelFlag) -> Self {
        self.inner_mut().cancel_after = Some((rows, flag));
        self
    }

    /// Load registered queries from a JSON fixtures file.
    ///
    /// The file holds an array of `{"query", "columns", "rows"}` or
    /// `{"query", "error"}` objects.
    pub fn from_fixtures_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| DaxBridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_fixtures_json(&content)
    }

    /// Load registered queries from fixtures JSON text.
    pub fn from_fixtures_json(json: &str) -> Result<Self> {
        let fixtures: Vec<Fixture> = serde_json::from_str(json)?;
        let mut engine = Self::new();
        for fixture in fixtures {
            let response = match fixture.error {
                Some(message) => CannedResponse::Error(message),
                None => CannedResponse::Table {
                    columns: fixture.columns,
                    rows: fixture.rows,
                },
            };
            engine
                .inner_mut()
                .responses
                .insert(normalize_query(&fixture.query), response);
        }
        Ok(engine)
    }

    /// Number of registered queries.
    pub fn registered_count(&self) -> usize {
        self.inner.responses.len()
    }

    /// Connection attempts, including failed ones.
    pub fn connect_attempts(&self) -> usize {
        self.inner.stats.connect_attempts.load(Ordering::SeqCst)
    }

    /// Successfully opened connections.
    pub fn connections_opened(&self) -> usize {
        self.inner.stats.connections_opened.load(Ordering::SeqCst)
    }

    /// Connections currently open.
    pub fn open_connections(&self) -> usize {
        self.inner.stats.open_connections.load(Ordering::SeqCst)
    }

    /// Cursors currently open.
    pub fn open_cursors(&self) -> usize {
        self.inner.stats.open_cursors.load(Ordering::SeqCst)
    }

    /// Queries issued.
    pub fn execution_count(&self) -> usize {
        self.inner.stats.executions.load(Ordering::SeqCst)
    }

    /// Rows handed out by cursors.
    pub fn rows_read(&self) -> usize {
        self.inner.stats.rows_read.load(Ordering::SeqCst)
    }

    /// Connections closed while one of their cursors was still open.
    pub fn connections_closed_with_open_cursor(&self) -> usize {
        self.inner.stats.closed_with_open_cursor.load(Ordering::SeqCst)
    }

    /// Queries issued, in order, as received.
    pub fn executed_queries(&self) -> Vec<String> {
        self.inner
            .executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Builders on a shared engine detach it into a fresh copy with zeroed counters.
fn detach(this: &mut Arc<Inner>) -> &mut Inner {
    if Arc::get_mut(this).is_none() {
        let copy = Inner {
            responses: this.responses.clone(),
            fallback: this.fallback.clone(),
            connect_failures: AtomicUsize::new(this.connect_failures.load(Ordering::SeqCst)),
            cancel_after: this.cancel_after.clone(),
            ..Inner::default()
        };
        *this = Arc::new(copy);
    }
    match Arc::get_mut(this) {
        Some(inner) => inner,
        None => unreachable!("freshly created Arc is unique"),
    }
}

impl QueryEngine for InMemoryEngine {
    fn connect(&self, _descriptor: &ConnectionDescriptor) -> EngineResult<Box<dyn EngineConnection>> {
        let stats = &self.inner.stats;
        stats.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let failures = &self.inner.connect_failures;
        if failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(ExecutionFailure::connectivity(
                "Could not connect to the in-memory engine",
            ));
        }

        stats.connections_opened.fetch_add(1, Ordering::SeqCst);
        stats.open_connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            inner: Arc::clone(&self.inner),
            open: true,
            cursor_open: Arc::new(AtomicBool::new(false)),
        }))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

struct MemoryConnection {
    inner: Arc<Inner>,
    open: bool,
    cursor_open: Arc<AtomicBool>,
}

impl EngineConnection for MemoryConnection {
    fn execute<'c>(&'c mut self, query: &str) -> EngineResult<Box<dyn Cursor + 'c>> {
        if !self.open {
            return Err(ExecutionFailure::connectivity("Connection is closed"));
        }

        let stats = &self.inner.stats;
        stats.executions.fetch_add(1, Ordering::SeqCst);
        self.inner
            .executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        let response = self
            .inner
            .responses
            .get(&normalize_query(query))
            .or(self.inner.fallback.as_ref());

        match response {
            Some(CannedResponse::Table { columns, rows }) => {
                stats.open_cursors.fetch_add(1, Ordering::SeqCst);
                self.cursor_open.store(true, Ordering::SeqCst);
                Ok(Box::new(MemoryCursor {
                    inner: Arc::clone(&self.inner),
                    columns: columns.clone(),
                    rows: rows.clone().into_iter(),
                    delivered: 0,
                    open: Arc::clone(&self.cursor_open),
                }))
            }
            Some(CannedResponse::Error(message)) => Err(ExecutionFailure::from_message(message.clone())),
            None => Err(ExecutionFailure::from_message(
                "Query is not registered with the in-memory engine",
            )),
        }
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            let stats = &self.inner.stats;
            if self.cursor_open.load(Ordering::SeqCst) {
                stats.closed_with_open_cursor.fetch_add(1, Ordering::SeqCst);
            }
            stats.open_connections.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.close();
    }
}

struct MemoryCursor {
    inner: Arc<Inner>,
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<Value>>,
    delivered: usize,
    open: Arc<AtomicBool>,
}

impl Cursor for MemoryCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> EngineResult<Option<Vec<Value>>> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(ExecutionFailure::from_message("Cursor is closed"));
        }
        let row = self.rows.next();
        if row.is_some() {
            self.delivered += 1;
            self.inner.stats.rows_read.fetch_add(1, Ordering::SeqCst);
            if let Some((after, flag)) = &self.inner.cancel_after {
                if self.delivered >= *after {
                    flag.cancel();
                }
            }
        }
        Ok(row)
    }

    fn close(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.inner.stats.open_cursors.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MemoryCursor {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Credentials, EngineErrorKind};
    use crate::schema::DatasetRef;
    use serde_json::json;

    fn descriptor() -> ConnectionDescriptor {
        ConnectionDescriptor::new(DatasetRef::new("ws", "ds"), Credentials::None)
    }

    #[test]
    fn test_whitespace_insensitive_matching() {
        let engine = InMemoryEngine::new().with_result(
            "EVALUATE\n  Sales",
            vec!["Amount"],
            vec![vec![json!(5)]],
        );
        let mut conn = engine.connect(&descriptor()).unwrap();
        let mut cursor = conn.execute("EVALUATE Sales").unwrap();
        assert_eq!(cursor.columns(), ["Amount".to_string()]);
        assert_eq!(cursor.next_row().unwrap(), Some(vec![json!(5)]));
        assert_eq!(cursor.next_row().unwrap(), None);
    }

    #[test]
    fn test_unregistered_query_fails() {
        let engine = InMemoryEngine::new();
        let mut conn = engine.connect(&descriptor()).unwrap();
        let err = conn.execute("EVALUATE Nope").err().unwrap();
        assert_eq!(err.kind, EngineErrorKind::Other);
        assert_eq!(engine.executed_queries(), vec!["EVALUATE Nope"]);
    }

    #[test]
    fn test_fixtures_json() {
        let json = r#"[
            {"query": "EVALUATE Sales", "columns": ["A"], "rows": [[1], [2]]},
            {"query": "EVALUATE Bad", "error": "Column 'X' cannot be found"}
        ]"#;
        let engine = InMemoryEngine::from_fixtures_json(json).unwrap();
        assert_eq!(engine.registered_count(), 2);

        let mut conn = engine.connect(&descriptor()).unwrap();
        let err = conn.execute("EVALUATE Bad").err().unwrap();
        assert!(matches!(err.kind, EngineErrorKind::NotFound { .. }));
    }

    #[test]
    fn test_counters_track_open_handles() {
        let engine = InMemoryEngine::new().with_result("EVALUATE T", vec!["A"], vec![]);
        {
            let mut conn = engine.connect(&descriptor()).unwrap();
            assert_eq!(engine.open_connections(), 1);
            {
                let _cursor = conn.execute("EVALUATE T").unwrap();
                assert_eq!(engine.open_cursors(), 1);
            }
            assert_eq!(engine.open_cursors(), 0);
        }
        assert_eq!(engine.open_connections(), 0);
        assert_eq!(engine.connections_opened(), 1);
    }
}
