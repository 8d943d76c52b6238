//! daxbridge CLI - natural-language questions answered with DAX.

mod backend;
mod cli;
mod commands;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Ask {
            question,
            dataset,
            backend,
            json,
            dry_run,
        } => commands::ask::run(question, dataset, backend, json, dry_run),

        Commands::Chat { dataset, backend } => commands::chat::run(dataset, backend, cli.verbose),

        Commands::Repair { file } => commands::repair::run(file),

        Commands::Schema {
            dataset,
            backend,
            refresh,
            json,
        } => commands::schema::run(dataset, backend, refresh, json),

        Commands::Serve { backend, port } => commands::serve::run(backend, port),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr; `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
