//! Dataset schema representation and loading.
//!
//! This module provides types for representing table/column metadata that
//! grounds the translation prompt, plus the cached provider that supplies it.

mod column;
mod loader;
mod provider;
mod table;
mod types;

pub use column::ColumnDescriptor;
pub use loader::{COLUMN_STATISTICS_QUERY, EngineSchemaLoader, FileSchemaLoader, schema_from_statistics};
pub use provider::{CachedSchemaProvider, DatasetRef, SchemaLoader, SchemaProvider};
pub use table::Schema;
pub use types::{ColumnType, DatePart};
