//! Ollama local LLM provider implementation.
//!
//! Ollama allows running LLMs locally without API keys.
//! Install from: https://ollama.ai

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{DaxBridgeError, Result};

use super::provider::{LlmConfig, LlmProvider, non_empty};

/// Default Ollama API endpoint.
const DEFAULT_API_URL: &str = "http://localhost:11434/api/chat";

/// Ollama local LLM provider.
pub struct OllamaProvider {
    client: Client,
    api_url: String,
    config: LlmConfig,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings.
    ///
    /// Uses llama3.2 model by default. Make sure you've pulled it:
    /// `ollama pull llama3.2`
    pub fn new() -> Result<Self> {
        Self::with_model("llama3.2")
    }

    /// Create with a specific model.
    ///
    /// Code-oriented models such as `qwen2.5-coder` or `codellama` tend to
    /// follow the JSON reply format more reliably.
    pub fn with_model(model: impl Into<String>) -> Result<Self> {
        // Local models can be slower
        let config = LlmConfig::default()
            .with_model(model)
            .with_timeout(Duration::from_secs(120));
        Self::with_config(config)
    }

    /// Create with custom configuration.
    pub fn with_config(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DaxBridgeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let api_url = std::env::var("OLLAMA_HOST")
            .map(|host| format!("{}/api/chat", host.trim_end_matches('/')))
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            client,
            api_url,
            config,
        })
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

impl LlmProvider for OllamaProvider {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": self.config.max_tokens
            },
            "messages": [
                {
                    "role": "system",
                    "content": system
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        debug!(model = %self.config.model, url = %self.api_url, "calling Ollama");

        let response = self
            .client
            .post(&self.api_url)
            .headers(self.build_headers())
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    DaxBridgeError::TranslationTimeout(format!("Ollama request timed out: {}", e))
                } else if e.is_connect() {
                    DaxBridgeError::Translation(
                        "Failed to connect to Ollama. Is it running? Start with: ollama serve"
                            .to_string(),
                    )
                } else {
                    DaxBridgeError::Translation(format!("Ollama request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();

            // Check for model not found error
            if error_text.contains("not found") {
                return Err(DaxBridgeError::Translation(format!(
                    "Model '{}' not found. Pull it with: ollama pull {}",
                    self.config.model, self.config.model
                )));
            }

            return Err(DaxBridgeError::Translation(format!(
                "Ollama error ({}): {}",
                status, error_text
            )));
        }

        let api_response: OllamaResponse = response.json().map_err(|e| {
            DaxBridgeError::Translation(format!("Failed to parse Ollama response: {}", e))
        })?;

        non_empty("Ollama", api_response.message.content)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_model() {
        let provider = OllamaProvider::with_model("qwen2.5-coder").unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.config().model, "qwen2.5-coder");
        assert_eq!(provider.config().timeout, Duration::from_secs(120));
    }
}
