//! The lifecycle contract shared by every stack kind.

use std::any::Any;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use bf_lookup::ResourceLookup;

use crate::context::RenderContext;
use crate::error::{StackError, StackResult};

/// A stack variant.
///
/// Callers drive a stack through a fixed order: `decode` (done by the
/// loader), `validate`, `before_render`, then `render` any number of times.
/// Calling out of order is a programming error.
#[async_trait]
pub trait Stack: Send + Sync + std::fmt::Debug {
    /// The discriminator this variant is registered under.
    fn kind(&self) -> &str;

    /// Provider region the stack deploys to, when it names one.
    fn region(&self) -> Option<&str> {
        None
    }

    /// Decode a configuration document into this instance, keeping any
    /// constructor defaults the document does not override.
    fn decode(&mut self, doc: &Value) -> StackResult<()>;

    /// Field rules, then cross-field rules. Stops at the first violation.
    fn validate(&self) -> StackResult<()>;

    /// Gather external data needed for rendering.
    ///
    /// Fails closed: any lookup error aborts with no partial context.
    async fn before_render(
        &self,
        ctx: RenderContext,
        lookup: &dyn ResourceLookup,
    ) -> StackResult<RenderContext>;

    /// Render the template. Pure in the validated stack and `ctx`.
    fn render(&self, ctx: &RenderContext) -> StackResult<String>;

    fn as_any(&self) -> &dyn Any;
}

/// Decode `doc` onto an existing value.
///
/// The target is serialized, the document is laid over it (objects merge
/// key by key, nulls are ignored, everything else replaces), and the result
/// is deserialized back into the target.
pub fn decode_onto<T>(target: &mut T, doc: &Value) -> StackResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(&*target)
        .map_err(|e| StackError::MalformedConfig(e.to_string()))?;
    overlay(&mut base, doc);
    *target = serde_json::from_value(base).map_err(|e| StackError::SchemaMismatch {
        path: "<root>".to_string(),
        expected: e.to_string(),
    })?;
    Ok(())
}

fn overlay(base: &mut Value, doc: &Value) {
    match (base, doc) {
        (Value::Object(base), Value::Object(doc)) => {
            for (key, value) in doc {
                if value.is_null() {
                    continue;
                }
                let merge = value.is_object() && base.get(key).map_or(false, Value::is_object);
                if merge {
                    if let Some(existing) = base.get_mut(key) {
                        overlay(existing, value);
                    }
                } else {
                    base.insert(key.clone(), value.clone());
                }
            }
        }
        (base, doc) => {
            if !doc.is_null() {
                *base = doc.clone();
            }
        }
    }
}
