//! Wiring of providers, engines and schema loaders from CLI flags.

use std::sync::Arc;

use colored::Colorize;
use daxbridge::engine::ACCESS_TOKEN_VAR;
use daxbridge::{
    AnthropicProvider, CachedSchemaProvider, Credentials, EngineSchemaLoader, ExecutorConfig,
    FileSchemaLoader, InMemoryEngine, LlmConfig, LlmProvider, MockProvider, OllamaProvider,
    OpenAIProvider, OrchestrationService, PipelineConfig, PowerBiRestEngine, QueryEngine,
    SchemaProvider,
};
use tracing::info;

use crate::cli::{BackendArgs, EngineChoice, LlmProviderChoice};

/// Build the LLM provider selected on the command line.
pub fn build_llm(
    choice: &LlmProviderChoice,
    model: Option<&str>,
) -> Result<Arc<dyn LlmProvider>, Box<dyn std::error::Error>> {
    let provider: Arc<dyn LlmProvider> = match choice {
        LlmProviderChoice::Anthropic => {
            let config = with_model(LlmConfig::default(), model);
            Arc::new(AnthropicProvider::from_env_with_config(config)?)
        }
        LlmProviderChoice::OpenAI => {
            let config = LlmConfig::default().with_model(model.unwrap_or("gpt-4o"));
            Arc::new(OpenAIProvider::from_env_with_config(config)?)
        }
        LlmProviderChoice::Groq => {
            let config = LlmConfig::default()
                .with_model(model.unwrap_or(OpenAIProvider::groq_default_model()));
            Arc::new(OpenAIProvider::groq_from_env(config)?)
        }
        LlmProviderChoice::Ollama => match model {
            Some(m) => Arc::new(OllamaProvider::with_model(m)?),
            None => Arc::new(OllamaProvider::new()?),
        },
        LlmProviderChoice::Mock => Arc::new(MockProvider::new()),
    };

    info!(provider = provider.name(), model = %provider.config().model, "LLM provider ready");
    Ok(provider)
}

fn with_model(config: LlmConfig, model: Option<&str>) -> LlmConfig {
    match model {
        Some(m) => config.with_model(m),
        None => config,
    }
}

/// Build the query engine selected on the command line.
pub fn build_engine(args: &BackendArgs) -> Result<Arc<dyn QueryEngine>, Box<dyn std::error::Error>> {
    let engine: Arc<dyn QueryEngine> = match args.engine {
        EngineChoice::PowerBi => Arc::new(PowerBiRestEngine::new()?),
        EngineChoice::Memory => match &args.fixtures {
            Some(path) => Arc::new(InMemoryEngine::from_fixtures_file(path)?),
            None => {
                eprintln!(
                    "{} in-memory engine has no fixtures; every query will fail",
                    "Warning:".yellow()
                );
                Arc::new(InMemoryEngine::new())
            }
        },
    };
    Ok(engine)
}

/// Executor settings, with credentials taken from the environment.
pub fn executor_config() -> ExecutorConfig {
    ExecutorConfig {
        credentials: Credentials::from_env(ACCESS_TOKEN_VAR),
        ..ExecutorConfig::default()
    }
}

/// Build the schema provider: files when a schema directory is given,
/// otherwise column statistics through the engine.
pub fn build_schemas(args: &BackendArgs, engine: Arc<dyn QueryEngine>) -> Arc<dyn SchemaProvider> {
    match &args.schema_dir {
        Some(dir) => Arc::new(CachedSchemaProvider::new(FileSchemaLoader::new(dir))),
        None => Arc::new(CachedSchemaProvider::new(EngineSchemaLoader::new(
            engine,
            executor_config(),
        ))),
    }
}

/// Build the full pipeline.
pub fn build_service(args: &BackendArgs) -> Result<OrchestrationService, Box<dyn std::error::Error>> {
    let llm = build_llm(&args.llm, args.model.as_deref())?;
    let engine = build_engine(args)?;
    let schemas = build_schemas(args, Arc::clone(&engine));

    let config = PipelineConfig {
        executor: executor_config(),
        ..PipelineConfig::default()
    }
    .with_retries(args.retries);

    Ok(OrchestrationService::new(schemas, llm, engine, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_args() -> BackendArgs {
        BackendArgs {
            llm: LlmProviderChoice::Mock,
            model: None,
            engine: EngineChoice::Memory,
            fixtures: None,
            schema_dir: None,
            retries: 3,
        }
    }

    #[test]
    fn test_mock_backend_builds() {
        let service = build_service(&mock_args()).unwrap();
        assert_eq!(service.config().retries, 3);
        assert_eq!(service.config().max_attempts(), 4);
    }

    #[test]
    fn test_missing_fixtures_file_is_error() {
        let args = BackendArgs {
            fixtures: Some("/nonexistent/fixtures.json".into()),
            ..mock_args()
        };
        assert!(build_engine(&args).is_err());
    }

    #[test]
    fn test_fixtures_file_loads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("fixtures.json");
        std::fs::write(
            &path,
            r#"[{"query": "EVALUATE Sales", "columns": ["Amount"], "rows": [[1]]}]"#,
        )
        .unwrap();
        let args = BackendArgs {
            fixtures: Some(path),
            ..mock_args()
        };
        let engine = build_engine(&args).unwrap();
        assert_eq!(engine.name(), "memory");
    }
}
