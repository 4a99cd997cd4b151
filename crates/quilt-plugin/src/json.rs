//! Built-in plugin for flat JSON documents.
//!
//! Treats a `.json` file as an object whose top-level properties are the
//! entities. Nested values change as a unit under their top-level key.

use serde_json::{json, Map, Value};

use quilt_log::FileRow;

use crate::error::{PluginError, PluginResult};
use crate::traits::ChangePlugin;
use crate::types::{DetectedChange, EntityPatch};

pub const JSON_PLUGIN_KEY: &str = "json_property";
pub const JSON_SCHEMA_KEY: &str = "json_property";
pub const JSON_SCHEMA_VERSION: &str = "1.0";

#[derive(Clone, Debug, Default)]
pub struct JsonPropertyPlugin;

impl JsonPropertyPlugin {
    pub fn new() -> Self {
        Self
    }

    fn parse(&self, file: &FileRow) -> PluginResult<Map<String, Value>> {
        if file.data.is_empty() {
            return Ok(Map::new());
        }
        let value: Value =
            serde_json::from_slice(&file.data).map_err(|e| PluginError::Detect {
                plugin: JSON_PLUGIN_KEY.to_string(),
                reason: format!("file {} is not valid JSON: {e}", file.id),
            })?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(PluginError::Detect {
                plugin: JSON_PLUGIN_KEY.to_string(),
                reason: format!(
                    "file {} must be a JSON object, got {}",
                    file.id,
                    type_name(&other)
                ),
            }),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl ChangePlugin for JsonPropertyPlugin {
    fn key(&self) -> &str {
        JSON_PLUGIN_KEY
    }

    fn handles(&self, file: &FileRow) -> bool {
        file.path.ends_with(".json")
    }

    fn detect_changes(
        &self,
        before: Option<&FileRow>,
        after: &FileRow,
    ) -> PluginResult<Vec<DetectedChange>> {
        let old = match before {
            Some(file) => self.parse(file)?,
            None => Map::new(),
        };
        let new = self.parse(after)?;

        let mut changes = Vec::new();
        for (key, value) in &new {
            if old.get(key) != Some(value) {
                changes.push(DetectedChange {
                    entity_id: key.clone(),
                    schema_key: JSON_SCHEMA_KEY.to_string(),
                    schema_version: JSON_SCHEMA_VERSION.to_string(),
                    content: Some(json!({ "value": value })),
                });
            }
        }
        for key in old.keys() {
            if !new.contains_key(key) {
                changes.push(DetectedChange {
                    entity_id: key.clone(),
                    schema_key: JSON_SCHEMA_KEY.to_string(),
                    schema_version: JSON_SCHEMA_VERSION.to_string(),
                    content: None,
                });
            }
        }
        Ok(changes)
    }

    fn apply_changes(&self, file: &FileRow, patches: &[EntityPatch]) -> PluginResult<Vec<u8>> {
        let mut map = self.parse(file).map_err(|e| PluginError::Apply {
            plugin: JSON_PLUGIN_KEY.to_string(),
            reason: e.to_string(),
        })?;

        for patch in patches {
            match &patch.content {
                Some(content) => {
                    let value = content.get("value").cloned().unwrap_or(Value::Null);
                    map.insert(patch.entity_id.clone(), value);
                }
                None => {
                    map.remove(&patch.entity_id);
                }
            }
        }

        serde_json::to_vec_pretty(&Value::Object(map)).map_err(|e| PluginError::Apply {
            plugin: JSON_PLUGIN_KEY.to_string(),
            reason: e.to_string(),
        })
    }
}
