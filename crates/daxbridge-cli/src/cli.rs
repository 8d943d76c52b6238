//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// daxbridge: ask questions of Power BI datasets in plain language
#[derive(Parser)]
#[command(name = "daxbridge")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer one question and print the result
    Ask {
        /// The question, in plain language
        #[arg(value_name = "QUESTION")]
        question: String,

        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        backend: BackendArgs,

        /// Print the answer as JSON
        #[arg(long)]
        json: bool,

        /// Only translate and repair; do not execute
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask questions interactively, keeping the conversation
    Chat {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        backend: BackendArgs,
    },

    /// Repair a generated query read from a file or stdin
    Repair {
        /// File holding the raw model reply (default: stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Show the schema of a dataset
    Schema {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[command(flatten)]
        backend: BackendArgs,

        /// Reload the schema from its source instead of the cache
        #[arg(long)]
        refresh: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the HTTP API
    Serve {
        #[command(flatten)]
        backend: BackendArgs,

        /// Port for web server
        #[arg(short, long, default_value = "8000")]
        port: u16,
    },
}

/// Which dataset a question targets.
#[derive(Args, Clone, Debug)]
pub struct DatasetArgs {
    /// Power BI workspace name
    #[arg(long, env = "DAXBRIDGE_WORKSPACE")]
    pub workspace: String,

    /// Dataset (semantic model) name
    #[arg(long, env = "DAXBRIDGE_DATASET")]
    pub dataset: String,
}

/// How the pipeline reaches the model, the engine and the schema.
#[derive(Args, Clone, Debug)]
pub struct BackendArgs {
    /// LLM provider used for translation
    #[arg(long, default_value = "anthropic")]
    pub llm: LlmProviderChoice,

    /// Model to use (provider-specific, e.g., "gpt-4o", "llama3.2")
    #[arg(long)]
    pub model: Option<String>,

    /// Query engine
    #[arg(long, default_value = "powerbi")]
    pub engine: EngineChoice,

    /// Canned responses for the in-memory engine (JSON)
    #[arg(long, value_name = "FILE")]
    pub fixtures: Option<PathBuf>,

    /// Load schemas from <DIR>/<workspace>/<dataset>.json instead of the engine
    #[arg(long, value_name = "DIR")]
    pub schema_dir: Option<PathBuf>,

    /// Extra translation attempts when no usable query comes back
    #[arg(long, default_value = "1")]
    pub retries: u32,
}

/// LLM provider choice for translation
#[derive(Clone, Debug, Default)]
pub enum LlmProviderChoice {
    /// Anthropic Claude API (requires ANTHROPIC_API_KEY)
    #[default]
    Anthropic,
    /// OpenAI GPT API (requires OPENAI_API_KEY)
    OpenAI,
    /// Groq through its OpenAI-compatible API (requires GROQ_API_KEY)
    Groq,
    /// Ollama local models (requires Ollama running)
    Ollama,
    /// Mock provider for testing
    Mock,
}

impl std::str::FromStr for LlmProviderChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LlmProviderChoice::Anthropic),
            "openai" | "gpt" => Ok(LlmProviderChoice::OpenAI),
            "groq" => Ok(LlmProviderChoice::Groq),
            "ollama" | "local" => Ok(LlmProviderChoice::Ollama),
            "mock" | "test" => Ok(LlmProviderChoice::Mock),
            _ => Err(format!(
                "Unknown provider: {}. Use: anthropic, openai, groq, ollama, or mock.",
                s
            )),
        }
    }
}

impl std::fmt::Display for LlmProviderChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProviderChoice::Anthropic => write!(f, "anthropic"),
            LlmProviderChoice::OpenAI => write!(f, "openai"),
            LlmProviderChoice::Groq => write!(f, "groq"),
            LlmProviderChoice::Ollama => write!(f, "ollama"),
            LlmProviderChoice::Mock => write!(f, "mock"),
        }
    }
}

/// Query engine choice
#[derive(Clone, Debug, Default)]
pub enum EngineChoice {
    /// Power BI executeQueries REST API (requires POWERBI_ACCESS_TOKEN)
    #[default]
    PowerBi,
    /// Canned responses loaded from --fixtures
    Memory,
}

impl std::str::FromStr for EngineChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "powerbi" | "pbi" | "rest" => Ok(EngineChoice::PowerBi),
            "memory" | "mem" | "fixtures" => Ok(EngineChoice::Memory),
            _ => Err(format!("Unknown engine: {}. Use: powerbi or memory.", s)),
        }
    }
}

impl std::fmt::Display for EngineChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineChoice::PowerBi => write!(f, "powerbi"),
            EngineChoice::Memory => write!(f, "memory"),
        }
    }
}
