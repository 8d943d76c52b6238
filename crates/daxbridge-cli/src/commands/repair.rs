//! Repair command - run the deterministic repairer over a raw model reply.

use std::io::Read;
use std::path::PathBuf;

use daxbridge::QueryCandidate;
use daxbridge::repair::repair;

pub fn run(file: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let raw = match file {
        Some(path) => {
            if !path.exists() {
                return Err(format!("File not found: {}", path.display()).into());
            }
            std::fs::read_to_string(&path)?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    // JSON replies carry the query in their `dax` field.
    let candidate = QueryCandidate::from_reply(&raw);
    println!("{}", repair(&candidate.text));
    Ok(())
}
