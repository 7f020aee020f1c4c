//! AWS CLI backed lookup.
//!
//! Runs `aws ec2 describe-subnets` as a child process and reads the JSON it
//! prints. Credentials, retries and paging are left to the CLI.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::LookupConfig;
use crate::error::{LookupError, LookupResult};
use crate::lookup::ResourceLookup;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSubnetsOutput {
    #[serde(default)]
    subnets: Vec<SubnetDescription>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetDescription {
    subnet_id: String,
}

/// Subnet lookup through the AWS CLI.
#[derive(Debug, Clone)]
pub struct AwsCliLookup {
    config: LookupConfig,
}

impl AwsCliLookup {
    pub fn new(config: LookupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Build the argument list for a subnet query.
    ///
    /// Filters go in the CLI's JSON form, so tag keys containing `,` or `=`
    /// reach the API as a single value.
    pub fn build_args(&self, tag_key: &str, scope_id: &str) -> Vec<String> {
        let filters = json!([
            { "Name": "tag-key", "Values": [tag_key] },
            { "Name": "vpc-id", "Values": [scope_id] }
        ]);
        let mut args = vec![
            "ec2".to_string(),
            "describe-subnets".to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--filters".to_string(),
            filters.to_string(),
        ];

        if let Some(region) = &self.config.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }

        if let Some(profile) = &self.config.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }

        args
    }

    /// Extract subnet identifiers from `describe-subnets` JSON output.
    ///
    /// Identifiers are sorted and deduplicated so repeated lookups against
    /// unchanged state give identical results.
    pub fn parse_subnet_ids(stdout: &str) -> LookupResult<Vec<String>> {
        let output: DescribeSubnetsOutput = serde_json::from_str(stdout)
            .map_err(|e| LookupError::InvalidResponse(e.to_string()))?;

        let mut ids: Vec<String> = output.subnets.into_iter().map(|s| s.subnet_id).collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

#[async_trait]
impl ResourceLookup for AwsCliLookup {
    async fn find_ids_by_tag(&self, tag_key: &str, scope_id: &str) -> LookupResult<Vec<String>> {
        let args = self.build_args(tag_key, scope_id);
        info!("Looking up subnets tagged '{}' in {}", tag_key, scope_id);
        debug!("Executing {} {:?}", self.config.aws_command, args);

        let mut cmd = Command::new(&self.config.aws_command);
        cmd.args(&args)
            .env("AWS_PAGER", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let pending = cmd.output();
        let output = if self.config.timeout_seconds > 0 {
            let timeout = Duration::from_secs(self.config.timeout_seconds);
            match tokio::time::timeout(timeout, pending).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Subnet lookup timed out after {}s", self.config.timeout_seconds);
                    return Err(LookupError::Timeout(self.config.timeout_seconds));
                }
            }
        } else {
            pending.await
        };

        let output = output.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LookupError::CommandUnavailable(format!(
                "'{}' not found on PATH",
                self.config.aws_command
            )),
            _ => LookupError::Io(e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(LookupError::CommandFailed {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let ids = Self::parse_subnet_ids(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Lookup returned {} subnet(s)", ids.len());
        Ok(ids)
    }
}
