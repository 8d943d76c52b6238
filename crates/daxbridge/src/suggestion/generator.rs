//! Schema-driven question suggestions.

use indexmap::IndexSet;

use crate::schema::Schema;

/// Minimum number of suggestions offered.
const MIN_SUGGESTIONS: usize = 5;

/// Maximum number of suggestions offered.
const MAX_SUGGESTIONS: usize = 10;

/// A group of questions offered when a table name mentions a keyword.
struct Topic {
    keywords: &'static [&'static str],
    questions: &'static [&'static str],
}

const TOPICS: &[Topic] = &[
    Topic {
        keywords: &["sales", "revenue", "order"],
        questions: &[
            "What are the total sales by year?",
            "Show me the top 10 customers by revenue",
            "What is the sales trend over time?",
        ],
    },
    Topic {
        keywords: &["product"],
        questions: &[
            "Which products have the highest sales?",
            "Show me sales by product category",
            "What are the top selling products?",
        ],
    },
    Topic {
        keywords: &["customer"],
        questions: &[
            "How many customers do we have?",
            "Show me customer distribution by region",
            "Who are our top customers?",
        ],
    },
    Topic {
        keywords: &["date", "calendar", "time"],
        questions: &[
            "Show me the yearly sales trend",
            "What are the monthly sales figures?",
            "Compare this year's performance to last year",
        ],
    },
];

const GENERIC_QUESTIONS: &[&str] = &[
    "What are the key metrics in this dataset?",
    "Show me a summary of the data",
    "What are the main trends?",
    "Give me the top 10 records",
    "What insights can you find in this data?",
];

/// Produces re-askable questions from a dataset's table names.
pub struct SuggestionEngine;

impl SuggestionEngine {
    /// Suggest questions for a schema.
    ///
    /// Topic questions come first, in topic order, then generic ones when
    /// fewer than five were found. Duplicates are dropped and the list is
    /// capped at ten.
    pub fn for_schema(schema: &Schema) -> Vec<String> {
        let tables: Vec<String> = schema
            .table_names()
            .into_iter()
            .map(str::to_lowercase)
            .collect();

        let mut questions: IndexSet<&'static str> = IndexSet::new();
        for topic in TOPICS {
            let matched = tables
                .iter()
                .any(|t| topic.keywords.iter().any(|k| t.contains(k)));
            if matched {
                questions.extend(topic.questions.iter().copied());
            }
        }

        if questions.len() < MIN_SUGGESTIONS {
            questions.extend(GENERIC_QUESTIONS.iter().copied());
        }

        questions
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(str::to_string)
            .collect()
    }
}
