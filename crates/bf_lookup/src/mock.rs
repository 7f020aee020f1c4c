//! Mock lookup service for testing.
//!
//! Provides a configurable implementation of the ResourceLookup trait so
//! stacks can be exercised without AWS credentials or network access.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{LookupError, LookupResult};
use crate::lookup::ResourceLookup;

/// Captured call information for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLookup {
    pub tag_key: String,
    pub scope_id: String,
}

/// Mock lookup service.
///
/// Returns canned identifiers per tag key (an unknown tag yields an empty
/// list) and records every call.
#[derive(Clone, Default)]
pub struct MockLookup {
    responses: Arc<RwLock<HashMap<String, Vec<String>>>>,
    captured_calls: Arc<RwLock<Vec<CapturedLookup>>>,
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifiers returned for a tag key.
    pub fn with_ids<I, S>(self, tag_key: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.responses
            .write()
            .insert(tag_key.into(), ids.into_iter().map(Into::into).collect());
        self
    }

    /// Make every call fail with the given message.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn get_calls(&self) -> Vec<CapturedLookup> {
        self.captured_calls.read().clone()
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }
}

impl std::fmt::Debug for MockLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLookup")
            .field("tags", &self.responses.read().keys().collect::<Vec<_>>())
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl ResourceLookup for MockLookup {
    async fn find_ids_by_tag(&self, tag_key: &str, scope_id: &str) -> LookupResult<Vec<String>> {
        self.captured_calls.write().push(CapturedLookup {
            tag_key: tag_key.to_string(),
            scope_id: scope_id.to_string(),
        });

        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(LookupError::Service(msg));
        }

        Ok(self
            .responses
            .read()
            .get(tag_key)
            .cloned()
            .unwrap_or_default())
    }
}
