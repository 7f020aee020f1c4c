//! # bf_stack
//!
//! Stack definition engine for bossformation.
//!
//! A configuration document names its stack kind in a top-level `kind`
//! field. The engine turns such a document into a validated, typed stack
//! and renders it into a CloudFormation template.
//!
//! # Architecture
//!
//! - **Registry**: maps kind names to zero-value constructors
//! - **Loader**: reads the discriminator, constructs the variant, decodes
//!   the full document into it and validates it
//! - **Stack**: the lifecycle every variant implements
//!   (`validate` → `before_render` → `render`)
//! - **Cluster**: the built-in autoscaling-group stack kind
//! - **Template**: ordered CloudFormation resource builder
//!
//! # Example
//!
//! ```rust,no_run
//! use bf_lookup::{AwsCliLookup, LookupConfig};
//! use bf_stack::{RenderContext, StackLoader};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let lookup = AwsCliLookup::new(LookupConfig::default());
//! let loader = StackLoader::default();
//!
//! let stack = loader.load_from_source("cluster.json")?;
//! let ctx = stack.before_render(RenderContext::new(), &lookup).await?;
//! println!("{}", stack.render(&ctx)?);
//! # Ok(())
//! # }
//! ```

pub mod cluster;
pub mod context;
pub mod error;
pub mod loader;
pub mod registry;
pub mod stack;
pub mod template;

pub use cluster::{
    AutoscalingGroup, Cluster, HealthCheck, IamInstanceProfile, LoadBalancer, Policy, Subnets,
};
pub use context::RenderContext;
pub use error::{StackError, StackResult};
pub use loader::{extract_kind, ConfigFormat, StackLoader};
pub use registry::{StackConstructor, StackRegistry};
pub use stack::{decode_onto, Stack};
pub use template::{Resource, Template};
