//! OpenAI chat-completions provider, also used for compatible hosts (Groq).

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::{DaxBridgeError, Result};

use super::provider::{LlmConfig, LlmProvider, non_empty, request_error};

/// OpenAI API endpoint.
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Groq's OpenAI-compatible endpoint.
const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// OpenAI GPT provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    api_url: String,
    label: &'static str,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::default().with_model("gpt-4o"))
    }

    /// Create a new OpenAI provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DaxBridgeError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            api_url: API_URL.to_string(),
            label: "openai",
            config,
        })
    }

    /// Point the provider at another OpenAI-compatible endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Create from environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_config(LlmConfig::default().with_model("gpt-4o"))
    }

    /// Create from environment variable with custom configuration.
    pub fn from_env_with_config(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            DaxBridgeError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::with_config(api_key, config)
    }

    /// Create a Groq-backed provider from `GROQ_API_KEY`.
    pub fn groq_from_env(config: LlmConfig) -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| {
            DaxBridgeError::Config("GROQ_API_KEY environment variable not set".to_string())
        })?;
        let mut provider = Self::with_config(api_key, config)?.with_api_url(GROQ_API_URL);
        provider.label = "groq";
        Ok(provider)
    }

    /// Default Groq model.
    pub fn groq_default_model() -> &'static str {
        "llama-3.3-70b-versatile"
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| DaxBridgeError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }
}

impl LlmProvider for OpenAIProvider {
    fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
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

        debug!(provider = self.label, model = %self.config.model, prompt_len = prompt.len(), "calling chat completions");

        let response = self
            .client
            .post(&self.api_url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| request_error(self.label, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(DaxBridgeError::Translation(format!(
                "{} API error ({}): {}",
                self.label, status, error_text
            )));
        }

        let api_response: OpenAIResponse = response.json().map_err(|e| {
            DaxBridgeError::Translation(format!("Failed to parse API response: {}", e))
        })?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                DaxBridgeError::Translation(format!("No response from {}", self.label))
            })?;

        non_empty(self.label, text)
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        self.label
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_and_name() {
        let provider = OpenAIProvider::new("sk-test").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().model, "gpt-4o");
        assert_eq!(provider.api_url, API_URL);
    }

    #[test]
    fn test_custom_endpoint() {
        let provider = OpenAIProvider::new("sk-test")
            .unwrap()
            .with_api_url("http://localhost:8080/v1/chat/completions");
        assert_eq!(provider.api_url, "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_null_content_parses() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: OpenAIResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
