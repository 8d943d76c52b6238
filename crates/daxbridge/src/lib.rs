//! daxbridge: natural-language questions answered with DAX.
//!
//! A question about a tabular dataset is turned into a DAX query by a language
//! model, the generated text is repaired deterministically, and the query is
//! run against an analytical engine.
//!
//! # Pipeline
//!
//! - **Translate**: build a schema-grounded prompt and call the model once
//! - **Repair**: rewrite known generation defects and strip prose/fences
//! - **Execute**: run the query on a per-request engine connection
//!
//! When no query comes out of translation the caller gets re-askable
//! suggestions instead of an error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use daxbridge::{
//!     CachedSchemaProvider, Conversation, DatasetRef, FileSchemaLoader, InMemoryEngine,
//!     MockProvider, OrchestrationService, PipelineConfig,
//! };
//!
//! let schemas = CachedSchemaProvider::new(FileSchemaLoader::new("schemas"));
//! let service = OrchestrationService::new(
//!     Arc::new(schemas),
//!     Arc::new(MockProvider::new()),
//!     Arc::new(InMemoryEngine::new()),
//!     PipelineConfig::default(),
//! );
//!
//! let dataset = DatasetRef::new("Sales Workspace", "SalesAnalysis");
//! let mut conversation = Conversation::new();
//! let result = service
//!     .answer(&dataset, "total sales by year", &mut conversation)
//!     .unwrap();
//! println!("{}", result.narrative());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod repair;
pub mod schema;
pub mod service;
pub mod suggestion;
pub mod translate;

pub use config::PipelineConfig;
pub use engine::{
    CancelFlag, ConnectionDescriptor, Credentials, EngineConfig, EngineErrorKind,
    ExecutionFailure, ExecutorConfig, InMemoryEngine, PowerBiRestEngine, QueryEngine,
    QueryExecutor, ResultSet,
};
pub use error::{DaxBridgeError, Result};
pub use llm::{AnthropicProvider, LlmConfig, LlmProvider, MockProvider, OllamaProvider, OpenAIProvider};
pub use repair::{RepairedQuery, repair};
pub use schema::{
    CachedSchemaProvider, ColumnDescriptor, ColumnType, DatasetRef, EngineSchemaLoader,
    FileSchemaLoader, Schema, SchemaLoader, SchemaProvider,
};
pub use service::{AnswerResult, Conversation, OrchestrationService, TranslationOutcome, Turn};
pub use suggestion::SuggestionEngine;
pub use translate::{QueryCandidate, RuleSet, Translator};
