//! Stack loading: discriminator extraction, typed decode and validation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{StackError, StackResult};
use crate::registry::StackRegistry;
use crate::stack::Stack;

/// Encoding of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Pick a format from a file extension (`.yaml`/`.yml` are YAML).
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }

    /// Parse raw bytes into a generic document.
    pub fn parse(&self, raw: &[u8]) -> StackResult<Value> {
        match self {
            ConfigFormat::Json => serde_json::from_slice(raw)
                .map_err(|e| StackError::MalformedConfig(e.to_string())),
            ConfigFormat::Yaml => serde_yaml::from_slice(raw)
                .map_err(|e| StackError::MalformedConfig(e.to_string())),
        }
    }
}

/// Read the `kind` discriminator from a generic document.
pub fn extract_kind(doc: &Value) -> StackResult<String> {
    let map = doc
        .as_object()
        .ok_or_else(|| StackError::MalformedConfig("expected a mapping at the top level".to_string()))?;

    match map.get("kind") {
        None | Some(Value::Null) => Err(StackError::MissingKind),
        Some(Value::String(kind)) if kind.is_empty() => Err(StackError::MissingKind),
        Some(Value::String(kind)) => Ok(kind.clone()),
        Some(_) => Err(StackError::SchemaMismatch {
            path: "kind".to_string(),
            expected: "string".to_string(),
        }),
    }
}

/// Loads stacks from raw configuration.
#[derive(Debug, Clone)]
pub struct StackLoader {
    registry: Arc<StackRegistry>,
}

impl Default for StackLoader {
    fn default() -> Self {
        Self::new(Arc::new(StackRegistry::builtin()))
    }
}

impl StackLoader {
    pub fn new(registry: Arc<StackRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StackRegistry {
        &self.registry
    }

    /// Load and validate a JSON document.
    pub fn load_from_bytes(&self, raw: &[u8]) -> StackResult<Box<dyn Stack>> {
        self.load_from_bytes_as(raw, ConfigFormat::Json)
    }

    /// Load and validate a document in the given format.
    pub fn load_from_bytes_as(&self, raw: &[u8], format: ConfigFormat) -> StackResult<Box<dyn Stack>> {
        let stack = self.decode_from_bytes_as(raw, format)?;
        stack.validate()?;
        info!("Loaded {} stack", stack.kind());
        Ok(stack)
    }

    /// Decode a document into its stack variant without validating it.
    pub fn decode_from_bytes_as(&self, raw: &[u8], format: ConfigFormat) -> StackResult<Box<dyn Stack>> {
        let doc = format.parse(raw)?;
        let kind = extract_kind(&doc)?;
        debug!("Configuration declares kind {}", kind);

        let mut stack = self.registry.construct(&kind)?;
        stack.decode(&doc)?;
        Ok(stack)
    }

    /// Read a configuration file and load it.
    ///
    /// The format follows the file extension. A read failure is reported as
    /// `SourceUnavailable` and nothing is validated.
    pub fn load_from_source(&self, path: impl AsRef<Path>) -> StackResult<Box<dyn Stack>> {
        let path = path.as_ref();
        debug!("Reading stack configuration from {:?}", path);

        let raw = fs::read(path).map_err(|source| StackError::SourceUnavailable {
            path: path.display().to_string(),
            source,
        })?;

        self.load_from_bytes_as(&raw, ConfigFormat::from_path(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RenderContext;
    use async_trait::async_trait;
    use bf_lookup::ResourceLookup;
    use serde_json::json;
    use std::any::Any;

    /// A stack that must never reach validation.
    #[derive(Debug, Default)]
    struct Tripwire;

    #[async_trait]
    impl Stack for Tripwire {
        fn kind(&self) -> &str {
            "Tripwire"
        }

        fn decode(&mut self, _doc: &Value) -> StackResult<()> {
            Ok(())
        }

        fn validate(&self) -> StackResult<()> {
            panic!("validate must not be called");
        }

        async fn before_render(
            &self,
            ctx: RenderContext,
            _lookup: &dyn ResourceLookup,
        ) -> StackResult<RenderContext> {
            Ok(ctx)
        }

        fn render(&self, _ctx: &RenderContext) -> StackResult<String> {
            Ok(String::new())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn tripwire_loader() -> StackLoader {
        let mut registry = StackRegistry::new();
        registry.register("Tripwire", || Box::new(Tripwire));
        StackLoader::new(Arc::new(registry))
    }

    #[test]
    fn test_extract_kind() {
        assert_eq!(extract_kind(&json!({"kind": "Cluster"})).unwrap(), "Cluster");
        assert!(matches!(extract_kind(&json!({})), Err(StackError::MissingKind)));
        assert!(matches!(extract_kind(&json!({"kind": ""})), Err(StackError::MissingKind)));
        assert!(matches!(extract_kind(&json!({"kind": null})), Err(StackError::MissingKind)));
        assert!(matches!(
            extract_kind(&json!({"kind": 3})),
            Err(StackError::SchemaMismatch { ref path, .. }) if path == "kind"
        ));
        assert!(matches!(
            extract_kind(&json!(["Cluster"])),
            Err(StackError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_missing_kind_never_validates() {
        let loader = tripwire_loader();
        assert!(matches!(loader.load_from_bytes(b"{}"), Err(StackError::MissingKind)));
        assert!(matches!(
            loader.load_from_bytes(br#"{"kind": ""}"#),
            Err(StackError::MissingKind)
        ));
    }

    #[test]
    fn test_unknown_kind_never_validates() {
        let loader = tripwire_loader();
        let err = loader.load_from_bytes(br#"{"kind": "Cluster"}"#).unwrap_err();
        assert!(matches!(err, StackError::UnknownKind { ref kind, .. } if kind == "Cluster"));
    }

    #[test]
    fn test_malformed_input() {
        let loader = StackLoader::default();
        assert!(matches!(
            loader.load_from_bytes(b"{not json"),
            Err(StackError::MalformedConfig(_))
        ));
        assert!(matches!(
            loader.load_from_bytes(b"\"Cluster\""),
            Err(StackError::MalformedConfig(_))
        ));
    }

    #[test]
    fn test_default_loader_knows_cluster() {
        let loader = StackLoader::default();
        assert_eq!(loader.registry().kinds(), vec!["Cluster"]);
        assert!(!tripwire_loader().registry().contains("Cluster"));
    }

    #[test]
    fn test_decode_without_validation() {
        let loader = tripwire_loader();
        let stack = loader
            .decode_from_bytes_as(br#"{"kind": "Tripwire"}"#, ConfigFormat::Json)
            .unwrap();
        assert_eq!(stack.kind(), "Tripwire");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/stack.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("stack.YML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("stack.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("stack")), ConfigFormat::Json);
    }

    #[test]
    fn test_yaml_parse() {
        let doc = ConfigFormat::Yaml.parse(b"kind: Cluster\nname: web1\n").unwrap();
        assert_eq!(doc, json!({"kind": "Cluster", "name": "web1"}));
    }

    #[test]
    fn test_source_unavailable() {
        let loader = tripwire_loader();
        let err = loader
            .load_from_source("/nonexistent/bf/stack.json")
            .unwrap_err();
        assert!(matches!(err, StackError::SourceUnavailable { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}
