//! Ask command - answer one question.

use colored::Colorize;
use daxbridge::{AnswerResult, Conversation, DatasetRef, ResultSet};
use serde_json::Value;

use crate::backend;
use crate::cli::{BackendArgs, DatasetArgs};

/// Maximum number of rows printed as a table.
const MAX_PRINTED_ROWS: usize = 50;

pub fn run(
    question: String,
    dataset: DatasetArgs,
    backend: BackendArgs,
    json: bool,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = backend::build_service(&backend)?;
    let dataset = DatasetRef::new(dataset.workspace, dataset.dataset);

    if dry_run {
        let outcome = service.translate(&dataset, &question)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else if outcome.is_usable() {
            println!("{}", outcome.query);
        } else {
            println!("{}", "No query generated.".yellow());
        }
        return Ok(());
    }

    let mut conversation = Conversation::new();
    let result = service.answer(&dataset, &question, &mut conversation)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_answer(&result);
    }
    Ok(())
}

/// Print an answer for a terminal.
pub fn print_answer(result: &AnswerResult) {
    match result {
        AnswerResult::Answer {
            result_set,
            query,
            narrative,
        } => {
            println!("{}", "DAX:".cyan().bold());
            println!("{}", query.as_str().dimmed());
            println!();
            println!("{}", narrative.white().bold());
            print_table(result_set);
        }
        AnswerResult::Suggestions {
            suggestions,
            narrative,
        } => {
            println!("{}", narrative.yellow());
            if !suggestions.is_empty() {
                println!();
                println!("{}", "Try asking:".cyan().bold());
                for suggestion in suggestions {
                    println!("  - {}", suggestion);
                }
            }
        }
        AnswerResult::ExecutionError {
            message,
            query,
            hint,
        } => {
            println!("{}", message.red());
            println!();
            println!("{}", "Attempted DAX:".cyan().bold());
            println!("{}", query.as_str().dimmed());
            if let Some(hint) = hint {
                println!();
                println!("{} {}", "Hint:".yellow().bold(), hint);
            }
        }
    }
}

fn print_table(result_set: &ResultSet) {
    if result_set.is_empty() {
        return;
    }

    let cells: Vec<Vec<String>> = result_set
        .rows
        .iter()
        .take(MAX_PRINTED_ROWS)
        .map(|row| {
            result_set
                .columns
                .iter()
                .map(|c| row.get(c).map(display_cell).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result_set
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    println!();
    let header: Vec<String> = result_set
        .columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:w$}", c, w = *w))
        .collect();
    println!("  {}", header.join("  ").bold());
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:w$}", v, w = *w))
            .collect();
        println!("  {}", line.join("  "));
    }

    if result_set.row_count() > MAX_PRINTED_ROWS {
        println!(
            "  {}",
            format!("... {} more rows", result_set.row_count() - MAX_PRINTED_ROWS).dimmed()
        );
    }
}

fn display_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
