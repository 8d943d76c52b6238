//! Plain-language summaries of query results.

use serde_json::Value;

use crate::engine::ResultSet;

/// Describe a result set in one sentence.
///
/// A single scalar reads as "The X is V"; anything else reports the row count.
pub fn interpret(result_set: &ResultSet) -> String {
    if let Some((column, value)) = result_set.scalar() {
        return format!("The {} is {}", column, display_value(value));
    }

    match result_set.row_count() {
        0 => "Found 0 results for your question.".to_string(),
        n => format!("Found {} results for your question. Here are the results:", n),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "blank".to_string(),
        other => other.to_string(),
    }
}
