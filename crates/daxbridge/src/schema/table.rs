//! Dataset-level schema definition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::column::ColumnDescriptor;

/// Table and column metadata for one dataset.
///
/// Tables keep the order in which the source listed them so prompts are
/// reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Columns of each table, keyed by table name.
    #[serde(default)]
    pub tables: IndexMap<String, Vec<ColumnDescriptor>>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any table with the same name.
    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        self.tables.insert(name.into(), columns);
        self
    }

    /// Get the columns of a table.
    pub fn table(&self, name: &str) -> Option<&[ColumnDescriptor]> {
        self.tables.get(name).map(Vec::as_slice)
    }

    /// Get all table names in order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    /// Number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of columns across all tables.
    pub fn column_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// True when there are no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate over derived date-part columns as `(table, column)` pairs.
    pub fn derived_columns(&self) -> impl Iterator<Item = (&str, &ColumnDescriptor)> {
        self.tables.iter().flat_map(|(table, columns)| {
            columns
                .iter()
                .filter(|c| c.derived)
                .map(move |c| (table.as_str(), c))
        })
    }

    /// Render the schema as prompt text.
    pub fn to_prompt_string(&self) -> String {
        if self.tables.is_empty() {
            return "No tables available".to_string();
        }

        let mut out = String::new();
        for (table, columns) in &self.tables {
            out.push_str(&format!("Table '{}':\n", table));
            for column in columns {
                let marker = if column.derived {
                    ", derived date column"
                } else {
                    ""
                };
                out.push_str(&format!(
                    "  - '{}'[{}] ({}{})\n",
                    table,
                    column.name,
                    column.data_type.label(),
                    marker
                ));
            }
        }
        out.trim_end().to_string()
    }
}
