//! Validate command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use bf_stack::StackLoader;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the stack configuration (JSON, or YAML by extension)
    #[arg(short = 's', long = "stack-config")]
    pub stack_config: PathBuf,
}

pub fn execute(args: ValidateArgs, loader: &StackLoader) -> Result<()> {
    let stack = loader.load_from_source(&args.stack_config)?;
    println!("✓ {} stack in {} is valid", stack.kind(), args.stack_config.display());
    Ok(())
}
