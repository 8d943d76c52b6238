//! End-to-end tests of the question-answering pipeline.
//!
//! Every test wires a scripted [`MockProvider`] and an [`InMemoryEngine`]
//! behind the real orchestration service, so the full translate, repair and
//! execute path runs without network access.

use std::fs;
use std::sync::Arc;

use daxbridge::service::NO_QUERY_APOLOGY;
use daxbridge::{
    AnswerResult, CachedSchemaProvider, ColumnDescriptor, ColumnType, Conversation, DatasetRef,
    DaxBridgeError, EngineErrorKind, FileSchemaLoader, InMemoryEngine, MockProvider,
    OrchestrationService, PipelineConfig, Schema, SchemaProvider, Turn,
};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

const WORKSPACE: &str = "PBI_Testing";
const DATASET: &str = "SalesAnalysis";

fn sales_schema() -> Schema {
    Schema::new()
        .with_table(
            "Sales",
            vec![
                ColumnDescriptor::new("OrderDate", ColumnType::DateTime),
                ColumnDescriptor::new("Amount", ColumnType::Decimal),
                ColumnDescriptor::new("Region", ColumnType::String),
            ],
        )
        .with_table(
            "Date",
            vec![
                ColumnDescriptor::new("Date", ColumnType::DateTime),
                ColumnDescriptor::derived("Year", ColumnType::Integer),
            ],
        )
}

/// Schema directory laid out as `<dir>/<workspace>/<dataset>.json`.
fn schema_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join(WORKSPACE);
    fs::create_dir_all(&workspace).unwrap();
    fs::write(
        workspace.join(format!("{}.json", DATASET)),
        serde_json::to_string_pretty(&sales_schema()).unwrap(),
    )
    .unwrap();
    dir
}

fn dataset() -> DatasetRef {
    DatasetRef::new(WORKSPACE, DATASET)
}

fn service(
    dir: &TempDir,
    llm: &Arc<MockProvider>,
    engine: &Arc<InMemoryEngine>,
    config: PipelineConfig,
) -> OrchestrationService {
    let schemas = CachedSchemaProvider::new(FileSchemaLoader::new(dir.path()));
    OrchestrationService::new(Arc::new(schemas), llm.clone(), engine.clone(), config)
}

const REPAIRED_BY_YEAR: &str = "EVALUATE\nSUMMARIZECOLUMNS(Sales[OrderDate].[Year], \"TotalSales\", SUM(Sales[Amount]))";

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_total_sales_by_year_is_repaired_and_executed() {
    let dir = schema_dir();
    let llm = Arc::new(MockProvider::new().with_reply(
        "```dax\nEVALUATE\nSUMMARIZECOLUMNS(YEAR(Sales[OrderDate]), \"TotalSales\", SUM(Sales[Amount]))\n```",
    ));
    let engine = Arc::new(InMemoryEngine::new().with_result(
        REPAIRED_BY_YEAR,
        vec!["Year", "TotalSales"],
        vec![
            vec![json!(2023), json!(125000.5)],
            vec![json!(2024), json!(143210.0)],
        ],
    ));
    let svc = service(&dir, &llm, &engine, PipelineConfig::default());
    let mut conversation = Conversation::new();

    let result = svc
        .answer(&dataset(), "total sales by year", &mut conversation)
        .unwrap();

    match &result {
        AnswerResult::Answer {
            result_set,
            query,
            narrative,
        } => {
            assert_eq!(query.as_str(), REPAIRED_BY_YEAR);
            assert_eq!(result_set.columns, vec!["Year", "TotalSales"]);
            assert_eq!(result_set.row_count(), 2);
            assert_eq!(result_set.rows[0]["Year"], json!(2023));
            assert_eq!(
                narrative,
                "Found 2 results for your question. Here are the results:"
            );
        }
        other => panic!("expected an answer, got {other:?}"),
    }

    assert_eq!(engine.executed_queries(), vec![REPAIRED_BY_YEAR]);
    assert_eq!(engine.open_connections(), 0);
    assert_eq!(llm.call_count(), 1);
    assert!(llm.prompts()[0].contains("'Sales'[OrderDate] (date)"));
}

#[test]
fn test_commentary_only_yields_suggestions_without_execution() {
    let dir = schema_dir();
    let llm = Arc::new(
        MockProvider::new()
            .with_reply("Note: I cannot answer this")
            .with_reply("Note: I cannot answer this"),
    );
    let engine = Arc::new(InMemoryEngine::new());
    let svc = service(&dir, &llm, &engine, PipelineConfig::default());
    let mut conversation = Conversation::new();

    let result = svc
        .answer(&dataset(), "what is the meaning of life", &mut conversation)
        .unwrap();

    match &result {
        AnswerResult::Suggestions {
            suggestions,
            narrative,
        } => {
            assert_eq!(narrative, NO_QUERY_APOLOGY);
            assert!(suggestions.len() >= 5);
            assert!(suggestions.contains(&"What are the total sales by year?".to_string()));
        }
        other => panic!("expected suggestions, got {other:?}"),
    }
    assert_eq!(engine.connect_attempts(), 0);
    assert_eq!(llm.call_count(), 2);
}

#[test]
fn test_engine_rejection_becomes_execution_error() {
    let dir = schema_dir();
    let llm = Arc::new(MockProvider::new().with_reply(
        r#"{"dax": "EVALUATE SUMMARIZECOLUMNS(Sales[Colour])", "answer": "Sales by colour"}"#,
    ));
    let engine_message = "Query (1, 28) Column 'Colour' in table 'Sales' cannot be found or may not be used in this expression.";
    let engine = Arc::new(
        InMemoryEngine::new().with_error("EVALUATE SUMMARIZECOLUMNS(Sales[Colour])", engine_message),
    );
    let svc = service(&dir, &llm, &engine, PipelineConfig::default());
    let mut conversation = Conversation::new();

    let result = svc
        .answer(&dataset(), "sales by colour", &mut conversation)
        .unwrap();

    match &result {
        AnswerResult::ExecutionError {
            message,
            query,
            hint,
        } => {
            assert!(message.contains(engine_message));
            assert_eq!(query.as_str(), "EVALUATE SUMMARIZECOLUMNS(Sales[Colour])");
            assert_eq!(
                hint.as_deref(),
                Some("Check column and table names against the dataset schema")
            );
        }
        other => panic!("expected an execution error, got {other:?}"),
    }
    assert_eq!(engine.execution_count(), 1);
    assert_eq!(llm.call_count(), 1);
}

#[test]
fn test_repeated_translation_failure_is_exhausted() {
    let dir = schema_dir();
    let llm = Arc::new(
        MockProvider::new()
            .with_failure("API error (503): overloaded")
            .with_timeout("request timed out after 60s"),
    );
    let engine = Arc::new(InMemoryEngine::new());
    let svc = service(&dir, &llm, &engine, PipelineConfig::default().with_retries(1));
    let mut conversation = Conversation::new();

    let err = svc
        .answer(&dataset(), "total sales by year", &mut conversation)
        .unwrap_err();

    match err {
        DaxBridgeError::TranslationExhausted {
            attempts,
            last_error,
        } => {
            assert_eq!(attempts, 2);
            assert!(last_error.contains("timed out"));
        }
        other => panic!("expected exhaustion, got {other}"),
    }
    assert_eq!(llm.call_count(), 2);
    assert_eq!(engine.connect_attempts(), 0);
    assert!(conversation.is_empty());
}

// =============================================================================
// Conversation and schema handling
// =============================================================================

#[test]
fn test_conversation_records_both_turns() {
    let dir = schema_dir();
    let llm = Arc::new(MockProvider::new().with_reply("EVALUATE ROW(\"Total\", SUM(Sales[Amount]))"));
    let engine = Arc::new(InMemoryEngine::new().with_result(
        "EVALUATE ROW(\"Total\", SUM(Sales[Amount]))",
        vec!["Total"],
        vec![vec![json!(268210.5)]],
    ));
    let svc = service(&dir, &llm, &engine, PipelineConfig::default());
    let mut conversation = Conversation::new();

    svc.answer(&dataset(), "total sales", &mut conversation)
        .unwrap();

    assert_eq!(conversation.len(), 2);
    assert!(matches!(&conversation.turns()[0], Turn::User { question, .. } if question == "total sales"));
    assert_eq!(
        conversation.last_answer().map(AnswerResult::narrative),
        Some("The Total is 268210.5")
    );
}

#[test]
fn test_missing_schema_fails_before_translation() {
    let dir = TempDir::new().unwrap();
    let llm = Arc::new(MockProvider::new());
    let engine = Arc::new(InMemoryEngine::new());
    let svc = service(&dir, &llm, &engine, PipelineConfig::default());

    let err = svc.translate(&dataset(), "total sales").unwrap_err();
    assert!(matches!(err, DaxBridgeError::SchemaUnavailable(_)));
    assert!(err.to_string().starts_with("Schema fetch failed:"));
    assert_eq!(llm.call_count(), 0);
}

#[test]
fn test_failed_question_leaves_conversation_untouched() {
    let dir = schema_dir();
    let llm = Arc::new(MockProvider::new().with_reply("EVALUATE ROW(\"Total\", SUM(Sales[Amount]))"));
    let engine = Arc::new(InMemoryEngine::new().with_result(
        "EVALUATE ROW(\"Total\", SUM(Sales[Amount]))",
        vec!["Total"],
        vec![vec![json!(1)]],
    ));
    let svc = service(&dir, &llm, &engine, PipelineConfig::default());
    let mut conversation = Conversation::new();
    svc.answer(&dataset(), "total sales", &mut conversation)
        .unwrap();

    let missing = DatasetRef::new("PBI_Testing", "NoSuchDataset");
    let err = svc
        .answer(&missing, "and by region?", &mut conversation)
        .unwrap_err();

    assert!(matches!(err, DaxBridgeError::SchemaUnavailable(_)));
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation.questions().collect::<Vec<_>>(), vec!["total sales"]);
}

#[test]
fn test_schema_refresh_replaces_cached_copy() {
    let dir = schema_dir();
    let provider = CachedSchemaProvider::new(FileSchemaLoader::new(dir.path()));

    let first = provider.get_or_load_schema(&dataset()).unwrap();
    assert_eq!(first.table_count(), 2);

    let updated = sales_schema().with_table("Product", Vec::new());
    fs::write(
        dir.path().join(WORKSPACE).join(format!("{}.json", DATASET)),
        serde_json::to_string(&updated).unwrap(),
    )
    .unwrap();

    assert_eq!(provider.get_or_load_schema(&dataset()).unwrap().table_count(), 2);
    assert_eq!(provider.refresh(&dataset()).unwrap().table_count(), 3);
    // Earlier readers keep their snapshot.
    assert_eq!(first.table_count(), 2);
}

#[test]
fn test_concurrent_questions_share_one_service() {
    let dir = schema_dir();
    let llm = Arc::new(MockProvider::new().with_fallback("EVALUATE Sales"));
    let engine = Arc::new(InMemoryEngine::new().with_result(
        "EVALUATE Sales",
        vec!["Region", "Amount"],
        vec![vec![json!("North"), json!(10)]],
    ));
    let svc = service(&dir, &llm, &engine, PipelineConfig::default());

    std::thread::scope(|scope| {
        for i in 0..8 {
            let svc = &svc;
            scope.spawn(move || {
                let mut conversation = Conversation::new();
                let result = svc
                    .answer(&dataset(), &format!("question {}", i), &mut conversation)
                    .unwrap();
                assert!(matches!(result, AnswerResult::Answer { .. }));
            });
        }
    });

    assert_eq!(engine.execution_count(), 8);
    assert_eq!(engine.open_connections(), 0);
    assert_eq!(engine.open_cursors(), 0);
}

#[test]
fn test_answer_result_serializes_with_kind_tag() {
    let result = AnswerResult::Suggestions {
        suggestions: vec!["Show me a summary of the data".into()],
        narrative: NO_QUERY_APOLOGY.into(),
    };
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["kind"], "suggestions");
    assert_eq!(value["narrative"], NO_QUERY_APOLOGY);
}

#[test]
fn test_engine_error_kind_serialization() {
    let kind = EngineErrorKind::classify("Column 'Colour' in table 'Sales' cannot be found");
    let value = serde_json::to_value(&kind).unwrap();
    assert_eq!(value, json!({"kind": "not_found", "column": "Colour", "table": "Sales"}));
}
