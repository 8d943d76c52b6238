//! The question-answering pipeline: translate, repair, execute.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::engine::{CancelFlag, QueryEngine, QueryExecutor, ResultSet};
use crate::error::{DaxBridgeError, Result};
use crate::llm::LlmProvider;
use crate::repair::{RepairedQuery, repair};
use crate::schema::{DatasetRef, Schema, SchemaProvider};
use crate::suggestion::SuggestionEngine;
use crate::translate::{QueryCandidate, Translator};

use super::conversation::Conversation;
use super::narrative;

/// Narrative used when no query could be generated and the model said nothing.
pub const NO_QUERY_APOLOGY: &str = "Could not generate a DAX query.";

/// What the user gets back for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerResult {
    /// The query ran; rows are attached.
    Answer {
        result_set: ResultSet,
        query: RepairedQuery,
        narrative: String,
    },
    /// No usable query came out of translation.
    Suggestions {
        suggestions: Vec<String>,
        narrative: String,
    },
    /// A query was produced but the engine failed to run it.
    ExecutionError {
        message: String,
        query: RepairedQuery,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
}

impl AnswerResult {
    /// The user-facing sentence for this result.
    pub fn narrative(&self) -> &str {
        match self {
            AnswerResult::Answer { narrative, .. } | AnswerResult::Suggestions { narrative, .. } => {
                narrative
            }
            AnswerResult::ExecutionError { message, .. } => message,
        }
    }

    /// The query that was run or attempted.
    pub fn query(&self) -> Option<&RepairedQuery> {
        match self {
            AnswerResult::Answer { query, .. } | AnswerResult::ExecutionError { query, .. } => {
                Some(query)
            }
            AnswerResult::Suggestions { .. } => None,
        }
    }
}

/// Result of the translation half of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationOutcome {
    /// Repaired query; empty when no attempt produced one.
    pub query: RepairedQuery,
    /// The model's description of the answer, if any.
    pub answer: Option<String>,
    /// Alternative questions offered by the model.
    pub suggestions: Vec<String>,
    /// Attempts used.
    pub attempts: u32,
}

impl TranslationOutcome {
    /// Whether a query is ready to execute.
    pub fn is_usable(&self) -> bool {
        !self.query.is_empty()
    }

    fn from_candidate(query: RepairedQuery, candidate: QueryCandidate, attempts: u32) -> Self {
        Self {
            query,
            answer: candidate.answer,
            suggestions: candidate.suggestions,
            attempts,
        }
    }
}

/// Answers questions about datasets.
///
/// Stateless apart from the schema cache behind the provider; each question
/// runs independently and may run concurrently with others.
pub struct OrchestrationService {
    schemas: Arc<dyn SchemaProvider>,
    translator: Translator,
    engine: Arc<dyn QueryEngine>,
    config: PipelineConfig,
}

impl OrchestrationService {
    /// Create a service from its collaborators.
    pub fn new(
        schemas: Arc<dyn SchemaProvider>,
        llm: Arc<dyn LlmProvider>,
        engine: Arc<dyn QueryEngine>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            schemas,
            translator: Translator::new(llm),
            engine,
            config,
        }
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Get the schema of a dataset, loading it if needed.
    pub fn schema(&self, dataset: &DatasetRef) -> Result<Arc<Schema>> {
        self.schemas.get_or_load_schema(dataset)
    }

    /// Reload a dataset's schema from its source.
    pub fn refresh_schema(&self, dataset: &DatasetRef) -> Result<Arc<Schema>> {
        self.schemas.refresh(dataset)
    }

    /// Questions worth asking about a dataset, drawn from its schema.
    pub fn suggest_questions(&self, dataset: &DatasetRef) -> Result<Vec<String>> {
        let schema = self.schemas.get_or_load_schema(dataset)?;
        Ok(SuggestionEngine::for_schema(&schema))
    }

    /// Repair caller-supplied DAX and run it as-is otherwise.
    ///
    /// Engine failures are returned as errors; nothing is translated.
    pub fn execute_dax(
        &self,
        dataset: &DatasetRef,
        dax: &str,
        cancel: &CancelFlag,
    ) -> Result<(RepairedQuery, ResultSet)> {
        let query = repair(dax);
        info!(dataset = %dataset, "executing caller-supplied DAX");
        let executor =
            QueryExecutor::for_dataset(Arc::clone(&self.engine), dataset, &self.config.executor);
        let result_set = executor.execute_cancellable(&query, cancel)?;
        Ok((query, result_set))
    }

    /// Answer a question, recording both turns in the conversation.
    ///
    /// The conversation is left untouched when an error is returned.
    pub fn answer(
        &self,
        dataset: &DatasetRef,
        question: &str,
        conversation: &mut Conversation,
    ) -> Result<AnswerResult> {
        self.answer_cancellable(dataset, question, conversation, &CancelFlag::new())
    }

    /// Answer a question, abandoning execution when `cancel` is raised.
    pub fn answer_cancellable(
        &self,
        dataset: &DatasetRef,
        question: &str,
        conversation: &mut Conversation,
        cancel: &CancelFlag,
    ) -> Result<AnswerResult> {
        info!(dataset = %dataset, question, "answering question");

        let schema = self.schemas.get_or_load_schema(dataset)?;
        let outcome = self.translate_with_schema(&schema, question)?;

        let result = if outcome.is_usable() {
            self.execute(dataset, outcome, cancel)?
        } else {
            let suggestions = if outcome.suggestions.is_empty() {
                SuggestionEngine::for_schema(&schema)
            } else {
                outcome.suggestions
            };
            AnswerResult::Suggestions {
                suggestions,
                narrative: outcome
                    .answer
                    .unwrap_or_else(|| NO_QUERY_APOLOGY.to_string()),
            }
        };

        // A failed question leaves no turn behind.
        conversation.push_user(question);
        conversation.push_assistant(result.clone());
        Ok(result)
    }

    /// Translate and repair a question without executing it.
    pub fn translate(&self, dataset: &DatasetRef, question: &str) -> Result<TranslationOutcome> {
        let schema = self.schemas.get_or_load_schema(dataset)?;
        self.translate_with_schema(&schema, question)
    }

    fn translate_with_schema(&self, schema: &Schema, question: &str) -> Result<TranslationOutcome> {
        let max_attempts = self.config.max_attempts();
        let mut last_error: Option<DaxBridgeError> = None;
        let mut last_empty: Option<QueryCandidate> = None;

        for attempt in 1..=max_attempts {
            match self.translator.generate(question, schema, &self.config.rules) {
                Ok(candidate) => {
                    let query = repair(&candidate.text);
                    if !query.is_empty() {
                        info!(attempt, "DAX query generated");
                        return Ok(TranslationOutcome::from_candidate(query, candidate, attempt));
                    }
                    warn!(attempt, max_attempts, "model returned no usable query");
                    last_empty = Some(candidate);
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "translation attempt failed");
                    last_error = Some(e);
                }
            }
        }

        match (last_empty, last_error) {
            (Some(candidate), _) => Ok(TranslationOutcome::from_candidate(
                RepairedQuery::default(),
                candidate,
                max_attempts,
            )),
            (None, last_error) => Err(DaxBridgeError::TranslationExhausted {
                attempts: max_attempts,
                last_error: last_error.map(|e| e.to_string()).unwrap_or_default(),
            }),
        }
    }

    fn execute(
        &self,
        dataset: &DatasetRef,
        outcome: TranslationOutcome,
        cancel: &CancelFlag,
    ) -> Result<AnswerResult> {
        let executor =
            QueryExecutor::for_dataset(Arc::clone(&self.engine), dataset, &self.config.executor);

        match executor.execute_cancellable(&outcome.query, cancel) {
            Ok(result_set) => {
                let narrative = outcome
                    .answer
                    .unwrap_or_else(|| narrative::interpret(&result_set));
                Ok(AnswerResult::Answer {
                    result_set,
                    query: outcome.query,
                    narrative,
                })
            }
            Err(DaxBridgeError::Execution(failure)) => Ok(AnswerResult::ExecutionError {
                message: format!("Error executing DAX: {}", failure),
                hint: failure.kind.hint().map(str::to_string),
                query: outcome.query,
            }),
            Err(e) => Err(e),
        }
    }
}
