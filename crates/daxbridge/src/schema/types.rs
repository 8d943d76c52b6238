//! Core type definitions for schema representation.

use serde::{Deserialize, Serialize};

/// Data type of a model column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers.
    Integer,
    /// Decimal and floating-point numbers.
    Decimal,
    /// Text values.
    String,
    /// Boolean values (true/false).
    Boolean,
    /// Date and/or time values.
    DateTime,
    /// Unable to determine type.
    Unknown,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Decimal)
    }

    /// Returns true if this type is temporal.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::DateTime)
    }

    /// Lowercase label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Decimal => "decimal",
            ColumnType::String => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::DateTime => "date",
            ColumnType::Unknown => "unknown",
        }
    }
}

impl Default for ColumnType {
    fn default() -> Self {
        ColumnType::Unknown
    }
}

/// A date part that a model may expose as a precomputed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePart {
    Year,
    Month,
    Quarter,
}

impl DatePart {
    /// All supported date parts.
    pub const ALL: [DatePart; 3] = [DatePart::Year, DatePart::Month, DatePart::Quarter];

    /// DAX function name extracting this part (`YEAR`, `MONTH`, `QUARTER`).
    pub fn function_name(&self) -> &'static str {
        match self {
            DatePart::Year => "YEAR",
            DatePart::Month => "MONTH",
            DatePart::Quarter => "QUARTER",
        }
    }

    /// Attribute name of the derived column (`Year`, `Month`, `Quarter`).
    pub fn attribute(&self) -> &'static str {
        match self {
            DatePart::Year => "Year",
            DatePart::Month => "Month",
            DatePart::Quarter => "Quarter",
        }
    }

    /// Match a column name against a date part, ignoring case.
    pub fn from_column_name(name: &str) -> Option<DatePart> {
        DatePart::ALL
            .into_iter()
            .find(|part| part.attribute().eq_ignore_ascii_case(name.trim()))
    }
}
