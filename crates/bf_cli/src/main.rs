//! bossformation CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Configuration source unavailable
//! - 4: Malformed configuration
//! - 5: Missing stack kind
//! - 6: Unknown stack kind
//! - 7: Schema mismatch
//! - 8: Validation failure
//! - 9: Lookup failure
//! - 10: Render error

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bf_stack::{StackError, StackLoader, StackRegistry};

mod commands;

use commands::{Cli, Commands};

/// Exit codes outside the per-error-kind range.
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    debug!("bf v{} starting", env!("CARGO_PKG_VERSION"));

    let loader = StackLoader::new(Arc::new(StackRegistry::builtin()));
    debug!("Registered stack kinds: {}", loader.registry().kinds().join(", "));
    let lookup_config = cli.lookup_config();

    let result = match cli.command {
        Commands::Render(args) => commands::render::execute(args, &loader, lookup_config).await,
        Commands::Validate(args) => commands::validate::execute(args, &loader),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(categorize_error(&e))
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "bf_cli={level},bf_stack={level},bf_lookup={level},bf_rules={level},warn"
        ))
    });

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Map an error to its exit code.
fn categorize_error(e: &anyhow::Error) -> u8 {
    e.downcast_ref::<StackError>()
        .map(StackError::exit_code)
        .unwrap_or(ExitCodes::GENERAL_ERROR)
}
