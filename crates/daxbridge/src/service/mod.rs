//! Orchestration of the question-answering pipeline.

mod conversation;
pub mod narrative;
mod orchestration;

pub use conversation::{Conversation, Turn};
pub use orchestration::{AnswerResult, NO_QUERY_APOLOGY, OrchestrationService, TranslationOutcome};
