//! Materialized query results.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One result row, keyed by column name in engine column order.
pub type Row = IndexMap<String, Value>;

/// Column names plus all rows of one successful execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Unique column names in the engine's order.
    pub columns: Vec<String>,
    /// Rows as column-to-value maps.
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Create a result set from column names and positional row values.
    ///
    /// Rows shorter than the column list are padded with nulls; extra values are
    /// dropped.
    pub fn from_values(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|values| {
                let mut values = values.into_iter();
                columns
                    .iter()
                    .map(|c| (c.clone(), values.next().unwrap_or(Value::Null)))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when no rows came back.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column, in row order.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(column))
    }

    /// The single value of a one-row, one-column result.
    pub fn scalar(&self) -> Option<(&str, &Value)> {
        match (self.columns.as_slice(), self.rows.as_slice()) {
            ([column], [row]) => row.get(column).map(|v| (column.as_str(), v)),
            _ => None,
        }
    }
}

/// Make column names unique by suffixing repeats with ` (2)`, ` (3)`, ...
///
/// A suffixed name never collides with a name the engine returned later on.
pub(crate) fn dedupe_columns(columns: Vec<String>) -> Vec<String> {
    let mut taken: IndexSet<String> = IndexSet::with_capacity(columns.len());
    for name in columns {
        if taken.contains(&name) {
            let mut n = 2;
            let mut candidate = format!("{} ({})", name, n);
            while taken.contains(&candidate) {
                n += 1;
                candidate = format!("{} ({})", name, n);
            }
            taken.insert(candidate);
        } else {
            taken.insert(name);
        }
    }
    taken.into_iter().collect()
}
