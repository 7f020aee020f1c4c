//! Render context produced by `before_render` and consumed by `render`.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StackError, StackResult};

/// Values prepared ahead of rendering.
///
/// A context is never mutated in place: `with_value` consumes it and
/// returns the extended context.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderContext {
    values: BTreeMap<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a context with `key` set to `value`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Serialize) -> StackResult<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| StackError::render(format!("unserializable context value: {}", e)))?;
        self.values.insert(key.into(), value);
        Ok(self)
    }

    /// Get a typed value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get a typed value that `before_render` must have provided.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> StackResult<T> {
        self.get(key).ok_or_else(|| {
            StackError::render(format!(
                "render context is missing '{}'; before_render must run first",
                key
            ))
        })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(|k| k.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
