//! Render command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::{debug, info};

use bf_lookup::{AwsCliLookup, LookupConfig};
use bf_stack::{RenderContext, StackLoader};

#[derive(Args)]
pub struct RenderArgs {
    /// Path to the stack configuration (JSON, or YAML by extension)
    #[arg(short = 's', long = "stack-config")]
    pub stack_config: PathBuf,
}

pub async fn execute(args: RenderArgs, loader: &StackLoader, mut config: LookupConfig) -> Result<()> {
    let stack = loader.load_from_source(&args.stack_config)?;

    if config.region.is_none() {
        if let Some(region) = stack.region() {
            debug!("Using stack region {} for lookups", region);
            config = config.region(region);
        }
    }

    let lookup = AwsCliLookup::new(config);
    let ctx = stack.before_render(RenderContext::new(), &lookup).await?;
    let template = stack.render(&ctx)?;

    info!("Rendered {} stack from {:?}", stack.kind(), args.stack_config);
    println!("{}", template);
    Ok(())
}
