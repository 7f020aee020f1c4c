//! CLI command definitions.

use clap::{Parser, Subcommand};

use bf_lookup::config::DEFAULT_TIMEOUT_SECONDS;
use bf_lookup::LookupConfig;

pub mod render;
pub mod validate;

/// bossformation - CloudFormation templates from cluster configurations
#[derive(Parser)]
#[command(name = "bf")]
#[command(version, about = "bossformation - CloudFormation templates from cluster configurations")]
#[command(long_about = r#"
bossformation reads a declarative stack configuration (JSON or YAML) and
renders a CloudFormation template for it.

COMMANDS:
  render    → Validate a stack configuration and print its template
  validate  → Validate a stack configuration without rendering

EXIT CODES:
  0  - Success
  1  - General error
  2  - Invalid arguments
  3  - Configuration source unavailable
  4  - Malformed configuration
  5  - Missing stack kind
  6  - Unknown stack kind
  7  - Schema mismatch
  8  - Validation failure
  9  - Subnet lookup failure
  10 - Render error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Region for subnet lookups (defaults to the stack's region)
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS CLI profile for subnet lookups
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Timeout in seconds for each subnet lookup (0 disables it)
    #[arg(long, global = true, env = "BF_LOOKUP_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub lookup_timeout: u64,

    /// AWS CLI executable used for subnet lookups
    #[arg(long, global = true, env = "BF_AWS_CLI", default_value = "aws")]
    pub aws_cli: String,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Lookup client configuration from the global options.
    pub fn lookup_config(&self) -> LookupConfig {
        let mut config = LookupConfig::default()
            .aws_command(&self.aws_cli)
            .timeout(self.lookup_timeout);
        if let Some(region) = &self.region {
            config = config.region(region);
        }
        if let Some(profile) = &self.profile {
            config = config.profile(profile);
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a CloudFormation template from a stack configuration
    Render(render::RenderArgs),

    /// Validate a stack configuration
    Validate(validate::ValidateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_lookup_config_from_flags() {
        let cli = Cli::parse_from([
            "bf",
            "--region",
            "eu-west-1",
            "--lookup-timeout",
            "5",
            "--aws-cli",
            "/opt/aws",
            "render",
            "-s",
            "stack.json",
        ]);
        let config = cli.lookup_config();

        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.timeout_seconds, 5);
        assert_eq!(config.aws_command, "/opt/aws");
    }
}
