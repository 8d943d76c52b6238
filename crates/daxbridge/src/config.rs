//! Pipeline configuration.

use crate::engine::ExecutorConfig;
use crate::translate::RuleSet;

/// Configuration for the question-answering pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Extra translation attempts when the model yields no usable query.
    pub retries: u32,
    /// Generation constraints handed to the model verbatim.
    pub rules: RuleSet,
    /// Query executor configuration.
    pub executor: ExecutorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retries: 1,
            rules: RuleSet::default(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Set the retry count.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Replace the rule set.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    /// Total translation attempts (first try plus retries).
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}
