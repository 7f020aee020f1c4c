//! Named validation rules.

use std::collections::HashMap;

use regex::Regex;
use tracing::debug;

use crate::error::{RuleError, RuleResult};

/// A validation rule: a pure predicate over a single field value.
pub type Rule = fn(&str) -> bool;

/// Region codes accepted by the `region` rule.
pub const REGIONS: [&str; 10] = [
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "eu-central-1",
    "eu-west-1",
    "sa-east-1",
    "us-east-1",
    "us-west-1",
    "us-west-2",
];

/// Check that a value is one of the supported region codes.
pub fn is_region(s: &str) -> bool {
    REGIONS.contains(&s)
}

fn is_resource_id(s: &str, resource: &str) -> bool {
    let pattern = format!("^{}-[0-9a-fA-F]+$", regex::escape(resource));
    Regex::new(&pattern)
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

/// Check that a value looks like a VPC identifier (`vpc-` plus hex digits).
pub fn is_vpc(s: &str) -> bool {
    is_resource_id(s, "vpc")
}

/// Check that a value looks like a subnet identifier (`subnet-` plus hex digits).
pub fn is_subnet(s: &str) -> bool {
    is_resource_id(s, "subnet")
}

/// Check that a value is a load balancer scheme.
pub fn is_scheme(s: &str) -> bool {
    s == "internal" || s == "internet-facing"
}

/// Check that a value is an IAM statement effect.
pub fn is_effect(s: &str) -> bool {
    s == "Allow" || s == "Deny"
}

/// Check that a value is an IAM action such as `ec2:Describe*` or `*`.
pub fn is_action(s: &str) -> bool {
    if s == "*" {
        return true;
    }
    Regex::new(r"^[a-z0-9-]+:[A-Za-z0-9*]+$")
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

pub fn is_alphanum(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

pub fn is_ascii(s: &str) -> bool {
    s.is_ascii()
}

/// A set of named rules.
///
/// Constraint tables refer to rules by name, so new rules can be added
/// without touching the structures that use them.
#[derive(Clone, Default)]
pub struct RuleSet {
    rules: HashMap<String, Rule>,
}

impl RuleSet {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Create a rule set with every built-in rule registered.
    pub fn standard() -> Self {
        let mut rules = Self::new();
        rules.register("region", is_region);
        rules.register("vpc", is_vpc);
        rules.register("subnet", is_subnet);
        rules.register("scheme", is_scheme);
        rules.register("effect", is_effect);
        rules.register("action", is_action);
        rules.register("alphanum", is_alphanum);
        rules.register("numeric", is_numeric);
        rules.register("ascii", is_ascii);
        rules
    }

    /// Register a rule, replacing any rule with the same name.
    pub fn register(&mut self, name: impl Into<String>, rule: Rule) {
        let name = name.into();
        debug!("Registering rule: {}", name);
        self.rules.insert(name, rule);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Registered rule names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.rules.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Evaluate the named rule against a value.
    pub fn check(&self, name: &str, value: &str) -> RuleResult<bool> {
        let rule = self
            .rules
            .get(name)
            .ok_or_else(|| RuleError::UnknownRule(name.to_string()))?;
        Ok(rule(value))
    }
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.names())
            .finish()
    }
}
