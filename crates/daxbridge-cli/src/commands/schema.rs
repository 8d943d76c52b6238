//! Schema command - show the schema the translator sees.

use colored::Colorize;
use daxbridge::DatasetRef;

use crate::backend;
use crate::cli::{BackendArgs, DatasetArgs};

pub fn run(
    dataset: DatasetArgs,
    backend: BackendArgs,
    refresh: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = backend::build_service(&backend)?;
    let dataset = DatasetRef::new(dataset.workspace, dataset.dataset);

    let schema = if refresh {
        service.refresh_schema(&dataset)?
    } else {
        service.schema(&dataset)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(schema.as_ref())?);
        return Ok(());
    }

    println!(
        "{} {} ({} tables, {} columns)",
        "Schema of".cyan().bold(),
        dataset.to_string().white().bold(),
        schema.table_count(),
        schema.column_count()
    );
    println!();
    for table in schema.table_names() {
        println!("{}", table.yellow().bold());
        for column in schema.table(table).unwrap_or_default() {
            let derived = if column.derived { " (derived)" } else { "" };
            println!(
                "  {:30} {}{}",
                column.name,
                column.data_type.label(),
                derived.dimmed()
            );
        }
    }
    Ok(())
}
