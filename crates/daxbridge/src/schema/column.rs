//! Column descriptor definition.

use serde::{Deserialize, Serialize};

use super::types::{ColumnType, DatePart};

/// Description of a single model column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// Inferred data type.
    #[serde(rename = "type", default)]
    pub data_type: ColumnType,
    /// Whether this is a precomputed date part (Year, Month, Quarter).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub derived: bool,
}

impl ColumnDescriptor {
    /// Create a new column descriptor.
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            derived: false,
        }
    }

    /// Create a derived date-part column.
    pub fn derived(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            derived: true,
        }
    }

    /// The date part this column stands for, if it is a derived one.
    pub fn date_part(&self) -> Option<DatePart> {
        if self.derived {
            DatePart::from_column_name(&self.name)
        } else {
            None
        }
    }
}
