//! Schema loaders: JSON files on disk and live engine metadata.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::engine::{CancelFlag, ExecutorConfig, QueryEngine, QueryExecutor, ResultSet};
use crate::error::{DaxBridgeError, Result};

use super::column::ColumnDescriptor;
use super::provider::{DatasetRef, SchemaLoader};
use super::table::Schema;
use super::types::{ColumnType, DatePart};

/// Metadata query listing every model column with its value range.
pub const COLUMN_STATISTICS_QUERY: &str = "EVALUATE COLUMNSTATISTICS()";

static DATE_VALUE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2}(\.\d+)?)?)?Z?$").unwrap());

/// Table name prefixes of engine-generated helper tables.
const HIDDEN_TABLE_PREFIXES: &[&str] = &["DateTableTemplate", "LocalDateTable"];

/// Loads schemas from `<dir>/<workspace>/<dataset>.json`.
#[derive(Debug, Clone)]
pub struct FileSchemaLoader {
    root: PathBuf,
}

impl FileSchemaLoader {
    /// Create a loader rooted at a directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the schema file for a dataset.
    pub fn path_for(&self, dataset: &DatasetRef) -> PathBuf {
        self.root
            .join(&dataset.workspace)
            .join(format!("{}.json", dataset.dataset))
    }

    /// Read a schema file directly.
    pub fn load_path(path: &Path) -> Result<Schema> {
        let content = std::fs::read_to_string(path).map_err(|source| DaxBridgeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl SchemaLoader for FileSchemaLoader {
    fn load(&self, dataset: &DatasetRef) -> Result<Schema> {
        let path = self.path_for(dataset);
        debug!(path = %path.display(), "reading schema file");
        Self::load_path(&path)
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Loads schemas by querying column statistics through a [`QueryEngine`].
pub struct EngineSchemaLoader {
    engine: Arc<dyn QueryEngine>,
    config: ExecutorConfig,
}

impl EngineSchemaLoader {
    /// Create a loader over an engine.
    pub fn new(engine: Arc<dyn QueryEngine>, config: ExecutorConfig) -> Self {
        Self { engine, config }
    }
}

impl SchemaLoader for EngineSchemaLoader {
    fn load(&self, dataset: &DatasetRef) -> Result<Schema> {
        let executor = QueryExecutor::for_dataset(Arc::clone(&self.engine), dataset, &self.config);
        let stats = executor.run(COLUMN_STATISTICS_QUERY, &CancelFlag::new())?;
        Ok(schema_from_statistics(&stats))
    }

    fn name(&self) -> &str {
        "engine"
    }
}

/// Build a schema from a `COLUMNSTATISTICS()` result.
pub fn schema_from_statistics(stats: &ResultSet) -> Schema {
    let mut tables: IndexMap<String, Vec<ColumnDescriptor>> = IndexMap::new();

    for row in &stats.rows {
        let (Some(table), Some(column)) = (
            row.get("Table Name").and_then(Value::as_str),
            row.get("Column Name").and_then(Value::as_str),
        ) else {
            continue;
        };

        if table.contains('$')
            || HIDDEN_TABLE_PREFIXES.iter().any(|p| table.starts_with(p))
            || column.starts_with("RowNumber-")
        {
            continue;
        }

        let data_type = infer_type(row.get("Min"), row.get("Max"));
        tables
            .entry(table.to_string())
            .or_default()
            .push(ColumnDescriptor::new(column, data_type));
    }

    for columns in tables.values_mut() {
        if columns.iter().any(|c| c.data_type.is_temporal()) {
            for column in columns.iter_mut() {
                if DatePart::from_column_name(&column.name).is_some() {
                    column.derived = true;
                }
            }
        }
    }

    Schema { tables }
}

fn infer_type(min: Option<&Value>, max: Option<&Value>) -> ColumnType {
    let types: Vec<ColumnType> = [min, max]
        .into_iter()
        .flatten()
        .filter(|v| !v.is_null())
        .map(value_type)
        .collect();

    match types.as_slice() {
        [] => ColumnType::Unknown,
        [only] => *only,
        [a, b] if a == b => *a,
        [a, b] if a.is_numeric() && b.is_numeric() => ColumnType::Decimal,
        _ => ColumnType::String,
    }
}

fn value_type(value: &Value) -> ColumnType {
    match value {
        Value::Bool(_) => ColumnType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => ColumnType::Integer,
        Value::Number(_) => ColumnType::Decimal,
        Value::String(s) if DATE_VALUE.is_match(s) => ColumnType::DateTime,
        Value::String(_) => ColumnType::String,
        _ => ColumnType::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    use crate::engine::InMemoryEngine;

    fn stats_row(table: &str, column: &str, min: Value, max: Value) -> Vec<Value> {
        vec![json!(table), json!(column), min, max]
    }

    fn stats() -> ResultSet {
        ResultSet::from_values(
            vec![
                "Table Name".into(),
                "Column Name".into(),
                "Min".into(),
                "Max".into(),
            ],
            vec![
                stats_row("Sales", "RowNumber-2662979B", Value::Null, Value::Null),
                stats_row("Sales", "OrderDate", json!("2023-01-01T00:00:00"), json!("2024-12-31T00:00:00")),
                stats_row("Sales", "Year", json!(2023), json!(2024)),
                stats_row("Sales", "Amount", json!(1.5), json!(900)),
                stats_row("Product", "Name", json!("Apple"), json!("Pear")),
                stats_row("Product", "Year", json!(1990), json!(2024)),
                stats_row("DateTableTemplate_abc", "Date", json!("2020-01-01"), json!("2024-01-01")),
                stats_row("LocalDateTable_123", "Date", json!("2020-01-01"), json!("2024-01-01")),
            ],
        )
    }

    #[test]
    fn test_schema_from_statistics_filters_and_types() {
        let schema = schema_from_statistics(&stats());
        assert_eq!(schema.table_names(), vec!["Sales", "Product"]);

        let sales = schema.table("Sales").unwrap();
        let names: Vec<_> = sales.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["OrderDate", "Year", "Amount"]);
        assert_eq!(sales[0].data_type, ColumnType::DateTime);
        assert_eq!(sales[1].data_type, ColumnType::Integer);
        assert!(sales[1].derived);
        assert_eq!(sales[2].data_type, ColumnType::Decimal);
    }

    #[test]
    fn test_year_without_date_column_not_derived() {
        let schema = schema_from_statistics(&stats());
        let product = schema.table("Product").unwrap();
        assert!(!product[1].derived);
        assert_eq!(product[0].data_type, ColumnType::String);
    }

    #[test]
    fn test_engine_loader_runs_statistics_query() {
        let stats = stats();
        let rows: Vec<Vec<Value>> = stats
            .rows
            .iter()
            .map(|r| r.values().cloned().collect())
            .collect();
        let engine = Arc::new(InMemoryEngine::new().with_result(
            COLUMN_STATISTICS_QUERY,
            vec!["Table Name", "Column Name", "Min", "Max"],
            rows,
        ));
        let loader = EngineSchemaLoader::new(engine.clone(), ExecutorConfig::default());

        let schema = loader.load(&DatasetRef::new("ws", "ds")).unwrap();
        assert_eq!(schema.table_count(), 2);
        assert_eq!(engine.executed_queries(), vec![COLUMN_STATISTICS_QUERY]);
    }

    #[test]
    fn test_file_loader_reads_workspace_layout() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("PBI_Testing")).unwrap();
        fs::write(
            dir.path().join("PBI_Testing").join("Sales.json"),
            r#"{"tables": {"Sales": [
                {"name": "Amount", "type": "decimal"},
                {"name": "Year", "type": "integer", "derived": true}
            ]}}"#,
        )
        .unwrap();

        let loader = FileSchemaLoader::new(dir.path());
        let schema = loader.load(&DatasetRef::new("PBI_Testing", "Sales")).unwrap();
        let sales = schema.table("Sales").unwrap();
        assert_eq!(sales.len(), 2);
        assert!(sales[1].derived);
    }

    #[test]
    fn test_file_loader_missing_file() {
        let dir = TempDir::new().unwrap();
        let loader = FileSchemaLoader::new(dir.path());
        let err = loader.load(&DatasetRef::new("ws", "missing")).unwrap_err();
        assert!(matches!(err, DaxBridgeError::Io { .. }));
    }
}
