//! Resource lookup trait.

use async_trait::async_trait;

use crate::error::LookupResult;

/// Resolves tag-based queries into concrete resource identifiers.
///
/// Implementations own transport concerns (credentials, retries, paging).
/// Callers treat every error as fatal for the current render.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
    /// Find identifiers of resources carrying `tag_key` inside `scope_id`
    /// (a VPC identifier).
    async fn find_ids_by_tag(&self, tag_key: &str, scope_id: &str) -> LookupResult<Vec<String>>;
}
