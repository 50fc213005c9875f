// server/src/main.rs

// Main entry point for the clinic CLI. Argument parsing and dispatch live in
// the cli module.

use anyhow::Result;
use clinic_server::cli::start_cli;

fn main() -> Result<()> {
    start_cli()
}
