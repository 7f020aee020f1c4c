//! # bf_rules
//!
//! Field-level validation for bossformation stack configurations.
//!
//! Rules are named predicates over a single string value. Stacks attach
//! rules to their fields through a [`ConstraintTable`], an explicit list of
//! `field path -> required/optional -> rule` entries that a generic
//! recursive validator checks against the serialized configuration.
//!
//! ## Example
//!
//! ```rust
//! use bf_rules::{ConstraintTable, FieldConstraint, FieldType, RuleSet};
//! use serde_json::json;
//!
//! let table = ConstraintTable::new()
//!     .field(FieldConstraint::required("region", FieldType::String).rule("region"))
//!     .field(FieldConstraint::optional("tags", FieldType::StringList).rule("ascii"));
//!
//! let rules = RuleSet::standard();
//! assert!(table.validate(&json!({"region": "us-west-2"}), &rules).is_ok());
//! assert!(table.validate(&json!({"region": "mars-1"}), &rules).is_err());
//! ```

pub mod constraint;
pub mod error;
pub mod rules;

pub use constraint::{ConstraintTable, FieldConstraint, FieldType, Presence};
pub use error::{RuleError, RuleResult};
pub use rules::{
    is_action, is_alphanum, is_ascii, is_effect, is_numeric, is_region, is_scheme, is_subnet,
    is_vpc, Rule, RuleSet, REGIONS,
};
