//! Schema provider trait and the shared in-process cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{DaxBridgeError, Result};

use super::table::Schema;

/// Identifies a dataset inside a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRef {
    /// Workspace (group) name or id.
    pub workspace: String,
    /// Dataset (semantic model) name or id.
    pub dataset: String,
}

impl DatasetRef {
    /// Create a new dataset reference.
    pub fn new(workspace: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            dataset: dataset.into(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workspace, self.dataset)
    }
}

/// Performs a live metadata fetch for a dataset.
pub trait SchemaLoader: Send + Sync {
    /// Load the schema of a dataset.
    fn load(&self, dataset: &DatasetRef) -> Result<Schema>;

    /// Get the name of this loader (for logging/debugging).
    fn name(&self) -> &str;
}

/// Supplies dataset schemas to the pipeline.
///
/// Implementations must be thread-safe: many in-flight questions read the same
/// schema concurrently.
pub trait SchemaProvider: Send + Sync {
    /// Return the cached schema, loading it on first use.
    fn get_or_load_schema(&self, dataset: &DatasetRef) -> Result<Arc<Schema>>;

    /// Reload the schema from its source and replace the cached copy.
    fn refresh(&self, dataset: &DatasetRef) -> Result<Arc<Schema>>;
}

/// Caches schemas per dataset in front of a [`SchemaLoader`].
///
/// A load happens outside the lock; the finished schema is swapped in as a
/// whole, so readers see either the old or the new schema, never a mix.
pub struct CachedSchemaProvider<L> {
    loader: L,
    cache: RwLock<HashMap<DatasetRef, Arc<Schema>>>,
}

impl<L: SchemaLoader> CachedSchemaProvider<L> {
    /// Create a provider with an empty cache.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get the cached schema without loading.
    pub fn cached(&self, dataset: &DatasetRef) -> Option<Arc<Schema>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(dataset)
            .cloned()
    }

    /// Drop a cached schema.
    pub fn invalidate(&self, dataset: &DatasetRef) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(dataset);
    }

    /// Number of cached datasets.
    pub fn cached_count(&self) -> usize {
        self.cache.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn load_and_store(&self, dataset: &DatasetRef) -> Result<Arc<Schema>> {
        let schema = self.loader.load(dataset).map_err(|e| match e {
            DaxBridgeError::SchemaUnavailable(_) => e,
            other => DaxBridgeError::SchemaUnavailable(other.to_string()),
        })?;

        if schema.is_empty() {
            warn!(dataset = %dataset, loader = self.loader.name(), "loaded schema has no tables");
            return Err(DaxBridgeError::SchemaUnavailable(format!(
                "Schema is empty for {}",
                dataset
            )));
        }

        info!(
            dataset = %dataset,
            loader = self.loader.name(),
            tables = schema.table_count(),
            columns = schema.column_count(),
            "schema loaded"
        );

        let schema = Arc::new(schema);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(dataset.clone(), Arc::clone(&schema));
        Ok(schema)
    }
}

impl<L: SchemaLoader> SchemaProvider for CachedSchemaProvider<L> {
    fn get_or_load_schema(&self, dataset: &DatasetRef) -> Result<Arc<Schema>> {
        if let Some(schema) = self.cached(dataset) {
            debug!(dataset = %dataset, "using cached schema");
            return Ok(schema);
        }
        self.load_and_store(dataset)
    }

    fn refresh(&self, dataset: &DatasetRef) -> Result<Arc<Schema>> {
        self.load_and_store(dataset)
    }
}
