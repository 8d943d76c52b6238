//! Translation of questions into DAX query candidates.

mod prompt;
mod translator;

pub use prompt::{system_prompt, translation_prompt};
pub use translator::{QueryCandidate, RuleSet, Translator};
