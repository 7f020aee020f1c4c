//! Per-field constraint tables and the recursive validator that checks them.

use serde_json::Value;
use tracing::debug;

use crate::error::{RuleError, RuleResult};
use crate::rules::RuleSet;

/// Shape a field must have on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Bool,
    StringList,
    Object,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Bool => "boolean",
            FieldType::StringList => "list of strings",
            FieldType::Object => "object",
        }
    }

    /// Check a present, non-null value against this type.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Bool => value.is_boolean(),
            FieldType::StringList => value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false),
            FieldType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// A single `path -> presence -> rule` entry.
///
/// Paths are dotted (`loadBalancer.healthCheck.target`). A rule on a
/// [`FieldType::StringList`] is applied to every element.
#[derive(Debug, Clone)]
pub struct FieldConstraint {
    pub path: String,
    pub field_type: FieldType,
    pub presence: Presence,
    pub rule: Option<String>,
}

impl FieldConstraint {
    pub fn required(path: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            path: path.into(),
            field_type,
            presence: Presence::Required,
            rule: None,
        }
    }

    pub fn optional(path: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            path: path.into(),
            field_type,
            presence: Presence::Optional,
            rule: None,
        }
    }

    pub fn rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    fn is_below(&self, ancestor: &FieldConstraint) -> bool {
        self.path.len() > ancestor.path.len()
            && self.path.starts_with(&ancestor.path)
            && self.path.as_bytes()[ancestor.path.len()] == b'.'
    }
}

/// An ordered list of field constraints for one configuration structure.
#[derive(Debug, Clone, Default)]
pub struct ConstraintTable {
    constraints: Vec<FieldConstraint>,
}

impl ConstraintTable {
    pub fn new() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    /// Append a constraint. Constraints are checked in insertion order.
    pub fn field(mut self, constraint: FieldConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Declared constraints, in check order.
    pub fn constraints(&self) -> &[FieldConstraint] {
        &self.constraints
    }

    /// Number of declared constraints.
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    /// Whether no constraints are declared.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Verify the shape of every declared field present in `doc`.
    ///
    /// Only types are checked here; presence and rules are left to
    /// [`ConstraintTable::validate`].
    pub fn schema_check(&self, doc: &Value) -> RuleResult<()> {
        if !doc.is_object() {
            return Err(RuleError::SchemaMismatch {
                path: "<root>".to_string(),
                expected: FieldType::Object.to_string(),
            });
        }

        for constraint in &self.constraints {
            match resolve(doc, &constraint.path) {
                Some(value) if !value.is_null() && !constraint.field_type.matches(value) => {
                    return Err(RuleError::SchemaMismatch {
                        path: constraint.path.clone(),
                        expected: constraint.field_type.to_string(),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }

    /// Check every constraint against `doc`, stopping at the first violation.
    ///
    /// Empty strings, empty lists, nulls and missing keys are all absent. A
    /// missing required value fails with rule `required`. Constraints below
    /// an absent optional field are skipped.
    pub fn validate(&self, doc: &Value, rules: &RuleSet) -> RuleResult<()> {
        for constraint in &self.constraints {
            if self.has_absent_optional_ancestor(constraint, doc) {
                continue;
            }

            let value = match resolve(doc, &constraint.path).filter(|v| !is_absent(v)) {
                Some(value) => value,
                None => match constraint.presence {
                    Presence::Required => {
                        return Err(RuleError::FieldViolation {
                            path: constraint.path.clone(),
                            rule: "required".to_string(),
                        });
                    }
                    Presence::Optional => continue,
                },
            };

            if !constraint.field_type.matches(value) {
                return Err(RuleError::SchemaMismatch {
                    path: constraint.path.clone(),
                    expected: constraint.field_type.to_string(),
                });
            }

            if let Some(rule) = &constraint.rule {
                check_rule(&constraint.path, value, rule, rules)?;
            }
        }

        debug!("Checked {} field constraints", self.constraints.len());
        Ok(())
    }

    fn has_absent_optional_ancestor(&self, constraint: &FieldConstraint, doc: &Value) -> bool {
        self.constraints.iter().any(|ancestor| {
            ancestor.presence == Presence::Optional
                && constraint.is_below(ancestor)
                && resolve(doc, &ancestor.path).map_or(true, is_absent)
        })
    }
}

fn check_rule(path: &str, value: &Value, rule: &str, rules: &RuleSet) -> RuleResult<()> {
    match value {
        Value::String(s) => {
            if !rules.check(rule, s)? {
                return Err(RuleError::FieldViolation {
                    path: path.to_string(),
                    rule: rule.to_string(),
                });
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, index);
                check_rule(&item_path, item, rule, rules)?;
            }
        }
        // Rules are string predicates; other shapes carry no rule.
        _ => {}
    }
    Ok(())
}

/// Look up a dotted path inside a JSON value.
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |current, segment| current.as_object()?.get(segment))
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
