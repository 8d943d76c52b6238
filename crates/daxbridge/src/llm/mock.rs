//! Mock LLM provider for testing.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::error::{DaxBridgeError, Result};

use super::provider::{LlmConfig, LlmProvider};

/// Reply the mock gives when nothing is scripted.
const DEFAULT_REPLY: &str =
    r#"{"dax": "", "answer": "The mock provider has no scripted reply.", "suggestions": []}"#;

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Failure(String),
    Timeout(String),
}

/// Mock LLM provider that plays back scripted replies in order.
///
/// Once the script runs out every call gets the fallback reply. Prompts are
/// recorded so tests can inspect what was sent.
pub struct MockProvider {
    config: LlmConfig,
    script: Mutex<VecDeque<Scripted>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty script.
    pub fn new() -> Self {
        Self::with_config(LlmConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(config: LlmConfig) -> Self {
        Self {
            config,
            script: Mutex::new(VecDeque::new()),
            fallback: DEFAULT_REPLY.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn push(self, item: Scripted) -> Self {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
        self
    }

    /// Queue a reply.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.push(Scripted::Reply(text.into()))
    }

    /// Queue a translation failure.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Failure(message.into()))
    }

    /// Queue a timeout.
    pub fn with_timeout(self, message: impl Into<String>) -> Self {
        self.push(Scripted::Timeout(message.into()))
    }

    /// Reply used once the script is exhausted.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// User prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for MockProvider {
    fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Failure(message)) => Err(DaxBridgeError::Translation(message)),
            Some(Scripted::Timeout(message)) => Err(DaxBridgeError::TranslationTimeout(message)),
            None => Ok(self.fallback.clone()),
        }
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "mock"
    }
}
