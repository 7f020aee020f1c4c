//! Lookup client configuration.

use serde::{Deserialize, Serialize};

/// Default timeout for a single lookup call, in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Configuration for [`AwsCliLookup`](crate::AwsCliLookup).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// AWS CLI executable
    pub aws_command: String,
    /// Region passed as `--region` (CLI default chain when unset)
    pub region: Option<String>,
    /// Named profile passed as `--profile`
    pub profile: Option<String>,
    /// Timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            aws_command: "aws".to_string(),
            region: None,
            profile: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl LookupConfig {
    pub fn aws_command(mut self, command: impl Into<String>) -> Self {
        self.aws_command = command.into();
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}
