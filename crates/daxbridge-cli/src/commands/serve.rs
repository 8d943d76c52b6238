//! Serve command - expose the pipeline over HTTP.

use colored::Colorize;

use crate::backend;
use crate::cli::BackendArgs;
use crate::server::{app, AppState};

pub fn run(backend: BackendArgs, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let service = backend::build_service(&backend)?;

    println!();
    println!(
        "{} {}",
        "Starting daxbridge server at".cyan().bold(),
        format!("http://localhost:{}", port).white().bold()
    );
    println!();
    println!("  Model: {}", backend.llm);
    println!("  Engine: {}", backend.engine);
    println!("  Translation retries: {}", service.config().retries);
    println!("  Connect retries: {}", service.config().executor.connect_retries);
    println!();
    println!("Press {} to stop the server", "Ctrl+C".yellow().bold());
    println!();

    let state = AppState::new(service);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(app::run_server(state, port))?;

    println!("{}", "Server stopped.".yellow());
    Ok(())
}
