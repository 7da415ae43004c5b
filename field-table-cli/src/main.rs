//! field-table CLI - inspect and edit field table YAML documents.
//!
//! Commands:
//! - `field-table show <file>`: field type, modules and variable names
//! - `field-table get <file> <module> <variable> [attribute] [--param p]`
//! - `field-table attributes <file> <module> <variable>`
//! - `field-table set <file> <module> <variable> <key> <value> [--list l]`
//! - `field-table rename-variable <file> <module> <old> <new>`
//! - `field-table rename-attribute <file> <module> <variable> <old> <new> [--list l]`
//! - `field-table add <file> <module> <variable-yaml>`
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use clap::Parser;
use tracing_subscriber::EnvFilter;

use field_table_cli::{commands, Cli};

fn main() {
    let cli = Cli::parse();

    // Initialize tracing with appropriate level
    let filter = if cli.debug {
        EnvFilter::new("field_table=debug,field_table_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(result_to_exit(commands::run(cli.command)));
}

/// Print the command output, or the error chain, and pick an exit code.
fn result_to_exit(result: anyhow::Result<String>) -> i32 {
    match result {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output.trim_end());
            }
            0
        }
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {:#}", e);
            1
        }
    }
}
