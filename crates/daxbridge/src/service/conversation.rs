//! Caller-owned conversation history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::orchestration::AnswerResult;

/// One exchange step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Turn {
    /// A question asked by the user.
    User {
        question: String,
        at: DateTime<Utc>,
    },
    /// The pipeline's answer to the preceding question.
    Assistant {
        answer: AnswerResult,
        at: DateTime<Utc>,
    },
}

impl Turn {
    /// When the turn was recorded.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Turn::User { at, .. } | Turn::Assistant { at, .. } => *at,
        }
    }
}

/// Ordered question/answer history for one user session.
///
/// Owned by the caller and passed into each request; the pipeline keeps no
/// history of its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a user question.
    pub fn push_user(&mut self, question: impl Into<String>) {
        self.turns.push(Turn::User {
            question: question.into(),
            at: Utc::now(),
        });
    }

    /// Record an answer.
    pub fn push_assistant(&mut self, answer: AnswerResult) {
        self.turns.push(Turn::Assistant {
            answer,
            at: Utc::now(),
        });
    }

    /// All turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when nothing has been asked yet.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Questions asked so far, oldest first.
    pub fn questions(&self) -> impl Iterator<Item = &str> {
        self.turns.iter().filter_map(|t| match t {
            Turn::User { question, .. } => Some(question.as_str()),
            Turn::Assistant { .. } => None,
        })
    }

    /// The most recent answer.
    pub fn last_answer(&self) -> Option<&AnswerResult> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::Assistant { answer, .. } => Some(answer),
            Turn::User { .. } => None,
        })
    }

    /// Drop all turns.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_recorded_in_order() {
        let mut conversation = Conversation::new();
        conversation.push_user("total sales");
        conversation.push_assistant(AnswerResult::Suggestions {
            suggestions: vec!["Show me a summary of the data".into()],
            narrative: "Could not generate a DAX query.".into(),
        });
        conversation.push_user("sales by year");

        assert_eq!(conversation.len(), 3);
        let questions: Vec<_> = conversation.questions().collect();
        assert_eq!(questions, vec!["total sales", "sales by year"]);
        assert_eq!(
            conversation.last_answer().map(|a| a.narrative()),
            Some("Could not generate a DAX query.")
        );
        assert!(conversation.turns()[0].timestamp() <= conversation.turns()[2].timestamp());
    }

    #[test]
    fn test_serialized_with_role_tag() {
        let mut conversation = Conversation::new();
        conversation.push_user("q");
        let json = serde_json::to_value(&conversation).unwrap();
        assert_eq!(json["turns"][0]["role"], "user");
        assert_eq!(json["turns"][0]["question"], "q");
    }
}
