use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use quilt_store::canonical_bytes;

use crate::error::{SchemaError, SchemaResult};
use crate::validate::validate_value;

/// A registered schema: identity plus canonical definition bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSchema {
    pub key: String,
    pub version: String,
    /// Canonical JSON bytes of the definition. Structural equality between
    /// definitions is byte equality of this field.
    pub definition: Vec<u8>,
}

impl StoredSchema {
    /// Parse the stored definition back into a JSON value.
    pub fn definition_value(&self) -> SchemaResult<Value> {
        serde_json::from_slice(&self.definition).map_err(|e| SchemaError::MalformedDefinition {
            key: self.key.clone(),
            version: self.version.clone(),
            reason: e.to_string(),
        })
    }
}

/// Append-only registry of schemas keyed by `(key, version)`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchemaRegistry {
    schemas: BTreeMap<(String, String), StoredSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Register a schema definition under `(key, version)`.
    ///
    /// Registering the identical definition again is a no-op. Registering a
    /// *different* definition under an existing pair fails with
    /// [`SchemaError::SchemaConflict`]: schema identities are append-only
    /// and breaking changes require a version bump.
    pub fn register(&mut self, key: &str, version: &str, definition: &Value) -> SchemaResult<()> {
        let bytes = canonical_bytes(definition)?;
        let id = (key.to_string(), version.to_string());
        if let Some(existing) = self.schemas.get(&id) {
            if existing.definition != bytes {
                return Err(SchemaError::SchemaConflict {
                    key: key.to_string(),
                    version: version.to_string(),
                });
            }
            return Ok(());
        }
        debug!(schema = key, version, "registered schema");
        self.schemas.insert(
            id,
            StoredSchema {
                key: key.to_string(),
                version: version.to_string(),
                definition: bytes,
            },
        );
        Ok(())
    }

    /// Look up a schema by key and version.
    pub fn get(&self, key: &str, version: &str) -> Option<&StoredSchema> {
        self.schemas.get(&(key.to_string(), version.to_string()))
    }

    /// All registered `(key, version)` pairs, sorted.
    pub fn keys(&self) -> Vec<(String, String)> {
        self.schemas.keys().cloned().collect()
    }

    /// Validate a value against a registered schema.
    ///
    /// Fails with [`SchemaError::UnknownSchema`] if the pair was never
    /// registered, or [`SchemaError::Validation`] if the value does not
    /// conform.
    pub fn validate(&self, key: &str, version: &str, value: &Value) -> SchemaResult<()> {
        let schema = self
            .get(key, version)
            .ok_or_else(|| SchemaError::UnknownSchema {
                key: key.to_string(),
                version: version.to_string(),
            })?;
        let definition = schema.definition_value()?;
        validate_value(&definition, value).map_err(|reason| SchemaError::Validation {
            key: key.to_string(),
            version: version.to_string(),
            reason,
        })
    }
}
