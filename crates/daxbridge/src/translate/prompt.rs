//! Prompt templates for DAX generation.

use crate::schema::Schema;

use super::translator::RuleSet;

/// System prompt for every translation call.
pub fn system_prompt() -> &'static str {
    r#"You are an expert in DAX (Data Analysis Expressions) for Power BI semantic models.
You translate business questions into a single executable DAX query.

Guidelines:
- Use only the tables and columns listed in the schema, quoted exactly as shown
- The query must start with EVALUATE (optionally preceded by DEFINE)
- Prefer derived date columns such as 'Date'[Date].[Year] over YEAR('Date'[Date])
- If the question cannot be answered from the schema, leave "dax" empty and
  explain why in "answer", offering alternative questions in "suggestions"

Always respond with a single JSON object and nothing else:
{
  "dax": "EVALUATE ...",
  "answer": "One sentence describing what the query returns",
  "suggestions": ["Alternative question", "..."]
}"#
}

/// Build the user prompt for one question.
pub fn translation_prompt(question: &str, schema: &Schema, rules: &RuleSet) -> String {
    format!(
        r#"Generate a DAX query answering the question below.

## Schema
{}

## Rules
{}

## Question
{}"#,
        schema.to_prompt_string(),
        rules.to_prompt_string(),
        question.trim()
    )
}
