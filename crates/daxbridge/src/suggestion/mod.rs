//! Follow-up question suggestions.
//!
//! Offered when no query could be generated, so the user always has
//! something to ask next.

mod generator;

pub use generator::SuggestionEngine;
