//! LLM provider trait and types.

use std::time::Duration;

use crate::error::{DaxBridgeError, Result};

/// Configuration for LLM providers.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model to use (e.g., "claude-sonnet-4-20250514").
    pub model: String,

    /// Maximum tokens in response.
    pub max_tokens: usize,

    /// Temperature for generation (0.0-1.0).
    pub temperature: f64,

    /// Timeout for one model call.
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    /// Use a different model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Trait for LLM providers.
///
/// Implementations must be thread-safe (Send + Sync) so one provider can serve
/// concurrent questions. Each call is a single request with no retry.
pub trait LlmProvider: Send + Sync {
    /// Send one system + user prompt pair and return the reply text.
    ///
    /// Transport failures, non-success statuses, malformed envelopes and empty
    /// replies are [`DaxBridgeError::Translation`]; an elapsed timeout is
    /// [`DaxBridgeError::TranslationTimeout`].
    fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the configuration for this provider.
    fn config(&self) -> &LlmConfig;

    /// Get the name of this provider (for logging/debugging).
    fn name(&self) -> &str;
}

/// Map a transport error to a translation error.
pub(crate) fn request_error(provider: &str, e: reqwest::Error) -> DaxBridgeError {
    if e.is_timeout() {
        DaxBridgeError::TranslationTimeout(format!("{} request timed out: {}", provider, e))
    } else {
        DaxBridgeError::Translation(format!("{} request failed: {}", provider, e))
    }
}

/// Reject replies that carry no text.
pub(crate) fn non_empty(provider: &str, text: String) -> Result<String> {
    if text.trim().is_empty() {
        Err(DaxBridgeError::Translation(format!(
            "Empty response from {}",
            provider
        )))
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert!(non_empty("test", "  \n".to_string()).is_err());
        assert_eq!(non_empty("test", "EVALUATE T".to_string()).unwrap(), "EVALUATE T");
    }

    #[test]
    fn test_config_builders() {
        let config = LlmConfig::default()
            .with_model("gpt-4o")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
