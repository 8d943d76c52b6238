//! Question-to-DAX translation through an LLM provider.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::llm::LlmProvider;
use crate::schema::Schema;

use super::prompt;

/// Ordered generation constraints passed verbatim to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<String>);

impl Default for RuleSet {
    fn default() -> Self {
        Self::new([
            "Aggregate numeric columns using SUM",
            "Use GROUPBY or SUMMARIZE as needed",
            "Use derived date columns (Year, Month, Quarter) if available",
            "Return valid executable DAX only",
        ])
    }
}

impl RuleSet {
    /// Create a rule set from rule texts.
    pub fn new<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(rules.into_iter().map(Into::into).collect())
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.0.push(rule.into());
        self
    }

    /// The rules in order.
    pub fn rules(&self) -> &[String] {
        &self.0
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no rules.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a numbered list.
    pub fn to_prompt_string(&self) -> String {
        if self.0.is_empty() {
            return "None".to_string();
        }
        self.0
            .iter()
            .enumerate()
            .map(|(i, rule)| format!("{}. {}", i + 1, rule))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Unrepaired model output plus whatever prose the model attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryCandidate {
    /// Raw query text; untrusted until repaired.
    pub text: String,
    /// Model's one-line description of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Alternative questions offered by the model.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// JSON envelope requested by the system prompt.
#[derive(Debug, Deserialize)]
struct ReplyEnvelope {
    #[serde(default, alias = "query")]
    dax: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    suggestions: Vec<String>,
}

impl QueryCandidate {
    /// Create a candidate holding only query text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Interpret a model reply.
    ///
    /// A JSON object (bare or inside a markdown fence) is decoded; any other
    /// reply becomes the candidate text verbatim.
    pub fn from_reply(reply: &str) -> Self {
        match extract_json(reply).and_then(|json| serde_json::from_str::<ReplyEnvelope>(json).ok()) {
            Some(envelope) => Self {
                text: envelope.dax.unwrap_or_default(),
                answer: envelope.answer.filter(|a| !a.trim().is_empty()),
                suggestions: envelope
                    .suggestions
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            None => Self::from_text(reply),
        }
    }
}

/// Find the JSON object in a reply, handling markdown code blocks.
fn extract_json(reply: &str) -> Option<&str> {
    let candidate = if reply.contains("```json") {
        reply
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(str::trim)?
    } else if reply.contains("```") {
        reply.split("```").nth(1).map(str::trim)?
    } else {
        reply.trim()
    };
    (candidate.starts_with('{') && candidate.ends_with('}')).then_some(candidate)
}

/// Turns questions into query candidates with one model call each.
pub struct Translator {
    llm: Arc<dyn LlmProvider>,
}

impl Translator {
    /// Create a translator over a provider.
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Name of the underlying provider.
    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    /// Generate a query candidate for a question.
    ///
    /// Calls the provider exactly once; failures are returned, not retried.
    pub fn generate(&self, question: &str, schema: &Schema, rules: &RuleSet) -> Result<QueryCandidate> {
        let user_prompt = prompt::translation_prompt(question, schema, rules);
        debug!(provider = self.llm.name(), prompt = %user_prompt, "translation prompt");

        let reply = self
            .llm
            .complete(prompt::system_prompt(), &user_prompt)
            .inspect_err(|e| warn!(provider = self.llm.name(), error = %e, "model call failed"))?;

        let candidate = QueryCandidate::from_reply(&reply);
        debug!(candidate = %candidate.text, "query candidate");
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DaxBridgeError;
    use crate::llm::MockProvider;
    use crate::schema::{ColumnDescriptor, ColumnType};

    fn schema() -> Schema {
        Schema::new().with_table("Sales", vec![ColumnDescriptor::new("Amount", ColumnType::Decimal)])
    }

    #[test]
    fn test_default_rules() {
        let rules = RuleSet::default();
        assert_eq!(rules.len(), 4);
        assert_eq!(rules.rules()[0], "Aggregate numeric columns using SUM");
        assert!(RuleSet::new(Vec::<String>::new()).to_prompt_string() == "None");
    }

    #[test]
    fn test_reply_json_decoded() {
        let c = QueryCandidate::from_reply(
            r#"{"dax": "EVALUATE Sales", "answer": "All sales", "suggestions": [" Sales by year ", ""]}"#,
        );
        assert_eq!(c.text, "EVALUATE Sales");
        assert_eq!(c.answer.as_deref(), Some("All sales"));
        assert_eq!(c.suggestions, vec!["Sales by year"]);
    }

    #[test]
    fn test_reply_json_in_fence() {
        let c = QueryCandidate::from_reply("Here you go:\n```json\n{\"dax\": \"EVALUATE T\"}\n```");
        assert_eq!(c.text, "EVALUATE T");
        assert!(c.answer.is_none());
    }

    #[test]
    fn test_reply_plain_text_kept_verbatim() {
        let raw = "```dax\nEVALUATE Sales\n```";
        assert_eq!(QueryCandidate::from_reply(raw).text, raw);
        assert_eq!(QueryCandidate::from_reply("EVALUATE T").text, "EVALUATE T");
    }

    #[test]
    fn test_reply_with_null_dax() {
        let c = QueryCandidate::from_reply(r#"{"dax": null, "answer": "No sales table"}"#);
        assert!(c.text.is_empty());
        assert_eq!(c.answer.as_deref(), Some("No sales table"));
    }

    #[test]
    fn test_generate_calls_provider_once() {
        let llm = Arc::new(MockProvider::new().with_reply(r#"{"dax": "EVALUATE Sales"}"#));
        let translator = Translator::new(llm.clone());

        let c = translator.generate("all sales", &schema(), &RuleSet::default()).unwrap();
        assert_eq!(c.text, "EVALUATE Sales");
        assert_eq!(llm.call_count(), 1);
        assert!(llm.prompts()[0].contains("all sales"));
    }

    #[test]
    fn test_generate_surfaces_failure() {
        let llm = Arc::new(MockProvider::new().with_failure("503 Service Unavailable"));
        let translator = Translator::new(llm.clone());

        let err = translator.generate("q", &schema(), &RuleSet::default()).unwrap_err();
        assert!(matches!(err, DaxBridgeError::Translation(_)));
        assert_eq!(llm.call_count(), 1);
    }
}
