//! Chat command - interactive question loop with a running conversation.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use daxbridge::{Conversation, DatasetRef};

use super::ask::print_answer;
use crate::backend;
use crate::cli::{BackendArgs, DatasetArgs};

pub fn run(
    dataset: DatasetArgs,
    backend: BackendArgs,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = backend::build_service(&backend)?;
    let dataset = DatasetRef::new(dataset.workspace, dataset.dataset);

    let schema = service.schema(&dataset)?;
    println!(
        "{} {} ({} tables, {} columns)",
        "Connected to".cyan().bold(),
        dataset.to_string().white().bold(),
        schema.table_count(),
        schema.column_count()
    );
    println!(
        "Type a question, or {} / {} / {} / {}",
        ":history".yellow(),
        ":clear".yellow(),
        ":refresh".yellow(),
        ":quit".yellow()
    );

    let mut conversation = Conversation::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("{} ", ">".green().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let question = line.trim();

        match question {
            "" => continue,
            ":quit" | ":exit" | ":q" => break,
            ":clear" => {
                conversation.clear();
                println!("{}", "Conversation cleared.".dimmed());
            }
            ":history" => {
                for (i, asked) in conversation.questions().enumerate() {
                    println!("  {}. {}", i + 1, asked);
                }
            }
            ":refresh" => match service.refresh_schema(&dataset) {
                Ok(schema) => println!(
                    "{} {} tables",
                    "Schema reloaded:".cyan(),
                    schema.table_count()
                ),
                Err(e) => eprintln!("{} {}", "Error:".red(), e),
            },
            _ => match service.answer(&dataset, question, &mut conversation) {
                Ok(result) => print_answer(&result),
                Err(e) => eprintln!("{} {}", "Error:".red(), e),
            },
        }

        if verbose {
            println!("{}", format!("({} turns)", conversation.len()).dimmed());
        }
        println!();
    }

    Ok(())
}
