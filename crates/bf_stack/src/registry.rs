//! Stack variant registry.

use std::collections::HashMap;

use tracing::debug;

use crate::cluster::Cluster;
use crate::error::{StackError, StackResult};
use crate::stack::Stack;

/// Builds a zero-value instance of a stack variant.
pub type StackConstructor = fn() -> Box<dyn Stack>;

/// A registry of stack kinds.
///
/// Maps discriminator strings to constructors. It is filled once at
/// startup and then shared read-only; adding a kind never touches the
/// loader.
#[derive(Default)]
pub struct StackRegistry {
    constructors: HashMap<String, StackConstructor>,
}

impl StackRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Create a registry with every built-in stack kind.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Cluster::KIND, || Box::new(Cluster::new()));
        registry
    }

    /// Register a constructor, replacing any existing entry for `kind`.
    pub fn register(&mut self, kind: impl Into<String>, constructor: StackConstructor) {
        let kind = kind.into();
        debug!("Registering stack kind: {}", kind);
        self.constructors.insert(kind, constructor);
    }

    /// Construct a zero-value stack of the given kind.
    pub fn construct(&self, kind: &str) -> StackResult<Box<dyn Stack>> {
        let constructor = self
            .constructors
            .get(kind)
            .ok_or_else(|| StackError::UnknownKind {
                kind: kind.to_string(),
                registered: self.kinds().join(", "),
            })?;
        debug!("Constructing stack of kind {}", kind);
        Ok(constructor())
    }

    /// Check if a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(|s| s.as_str()).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether no kinds are registered.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl std::fmt::Debug for StackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StackRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = StackRegistry::builtin();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("Cluster"));
        assert_eq!(registry.kinds(), vec!["Cluster"]);
    }

    #[test]
    fn test_construct_returns_zero_value() {
        let registry = StackRegistry::builtin();
        let stack = registry.construct("Cluster").unwrap();
        assert_eq!(stack.kind(), "Cluster");

        let cluster = stack.as_any().downcast_ref::<Cluster>().unwrap();
        assert_eq!(cluster, &Cluster::new());
    }

    #[test]
    fn test_construct_unknown_kind() {
        let registry = StackRegistry::builtin();
        let err = registry.construct("Database").unwrap_err();
        match err {
            StackError::UnknownKind { kind, registered } => {
                assert_eq!(kind, "Database");
                assert_eq!(registered, "Cluster");
            }
            other => panic!("expected UnknownKind, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_registry() {
        let registry = StackRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.construct("Cluster").is_err());
    }

    #[test]
    fn test_register_is_case_sensitive() {
        let registry = StackRegistry::builtin();
        assert!(!registry.contains("cluster"));
    }
}
