//! LLM provider integration for question translation.
//!
//! A provider turns one system + user prompt pair into reply text. Prompt
//! construction and reply parsing live in [`crate::translate`].
//!
//! # Supported Providers
//!
//! - **Anthropic** - Claude models via API (requires `ANTHROPIC_API_KEY`)
//! - **OpenAI** - GPT models via API (requires `OPENAI_API_KEY`); also Groq
//!   through its OpenAI-compatible endpoint (requires `GROQ_API_KEY`)
//! - **Ollama** - Local models, no API key needed (requires Ollama installed)
//! - **Mock** - Scripted replies for tests
//!
//! # Example
//!
//! ```no_run
//! use daxbridge::{LlmProvider, OllamaProvider};
//!
//! let provider = OllamaProvider::new().unwrap();
//! let reply = provider.complete("Reply with DAX only.", "total sales").unwrap();
//! ```

mod anthropic;
mod mock;
mod ollama;
mod openai;
mod provider;

pub use anthropic::AnthropicProvider;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use provider::{LlmConfig, LlmProvider};
