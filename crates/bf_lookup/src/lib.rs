//! # bf_lookup
//!
//! Resource lookup service for bossformation.
//!
//! Stacks that select subnets by tag need the concrete subnet identifiers
//! before a template can be rendered. This crate defines the
//! [`ResourceLookup`] boundary and ships two implementations:
//!
//! - **AwsCliLookup**: shells out to the AWS CLI (`aws ec2 describe-subnets`)
//!   with an explicit timeout
//! - **MockLookup**: canned responses and call capture for tests
//!
//! The client is built once by the caller and passed explicitly to every
//! stack that needs it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bf_lookup::{AwsCliLookup, LookupConfig, ResourceLookup};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let lookup = AwsCliLookup::new(LookupConfig::default().region("us-west-2"));
//!     let ids = lookup.find_ids_by_tag("web", "vpc-0abc1234").await?;
//!     println!("{:?}", ids);
//!     Ok(())
//! }
//! ```

pub mod aws;
pub mod config;
pub mod error;
pub mod lookup;
pub mod mock;

pub use aws::AwsCliLookup;
pub use config::LookupConfig;
pub use error::{LookupError, LookupResult};
pub use lookup::ResourceLookup;
pub use mock::{CapturedLookup, MockLookup};
