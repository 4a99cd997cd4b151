//! Structural value validation.
//!
//! Definitions are a small JSON-schema dialect: a `type` keyword
//! (`object`, `array`, `string`, `number`, `boolean`, `null`, `any`),
//! `properties` and `required` for objects, and `items` for arrays.
//! Unknown keywords are ignored so plugin-owned schemas can carry extra
//! metadata.

use serde_json::Value;

/// Validate `value` against `definition`.
///
/// Returns `Err(reason)` with a path-qualified message on the first
/// violation found.
pub fn validate_value(definition: &Value, value: &Value) -> Result<(), String> {
    validate_at(definition, value, "$")
}

fn validate_at(definition: &Value, value: &Value, path: &str) -> Result<(), String> {
    let Some(def) = definition.as_object() else {
        // A non-object definition (e.g. `true`) accepts anything.
        return Ok(());
    };

    if let Some(expected) = def.get("type").and_then(Value::as_str) {
        check_type(expected, value, path)?;
    }

    if let Some(props) = def.get("properties").and_then(Value::as_object) {
        if let Some(obj) = value.as_object() {
            for (name, prop_def) in props {
                if let Some(child) = obj.get(name) {
                    validate_at(prop_def, child, &format!("{path}.{name}"))?;
                }
            }
        }
    }

    if let Some(required) = def.get("required").and_then(Value::as_array) {
        let obj = value.as_object();
        for entry in required {
            let Some(name) = entry.as_str() else { continue };
            let present = obj.map(|o| o.contains_key(name)).unwrap_or(false);
            if !present {
                return Err(format!("{path}: missing required property `{name}`"));
            }
        }
    }

    if let Some(items) = def.get("items") {
        if let Some(arr) = value.as_array() {
            for (index, item) in arr.iter().enumerate() {
                validate_at(items, item, &format!("{path}[{index}]"))?;
            }
        }
    }

    Ok(())
}

fn check_type(expected: &str, value: &Value, path: &str) -> Result<(), String> {
    let ok = match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "any" => true,
        other => return Err(format!("{path}: unknown type keyword `{other}`")),
    };
    if ok {
        Ok(())
    } else {
        Err(format!("{path}: expected {expected}, got {}", type_name(value)))
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "number"},
                "tags": {"type": "array", "items": {"type": "string"}}
            },
            "required": ["name"]
        })
    }

    #[test]
    fn conforming_value_passes() {
        let value = json!({"name": "Foo", "age": 3, "tags": ["a", "b"]});
        validate_value(&person_schema(), &value).unwrap();
    }

    #[test]
    fn missing_required_property_fails() {
        let err = validate_value(&person_schema(), &json!({"age": 3})).unwrap_err();
        assert!(err.contains("missing required property"), "{err}");
    }

    #[test]
    fn wrong_type_fails_with_path() {
        let err = validate_value(&person_schema(), &json!({"name": 42})).unwrap_err();
        assert!(err.contains("$.name"), "{err}");
    }

    #[test]
    fn wrong_item_type_fails_with_index() {
        let value = json!({"name": "x", "tags": ["ok", 7]});
        let err = validate_value(&person_schema(), &value).unwrap_err();
        assert!(err.contains("$.tags[1]"), "{err}");
    }

    #[test]
    fn extra_properties_are_allowed() {
        let value = json!({"name": "x", "unknown": true});
        validate_value(&person_schema(), &value).unwrap();
    }

    #[test]
    fn non_object_definition_accepts_anything() {
        validate_value(&json!(true), &json!([1, 2, 3])).unwrap();
    }

    #[test]
    fn unknown_type_keyword_is_an_error() {
        let def = json!({"type": "integer"});
        assert!(validate_value(&def, &json!(1)).is_err());
    }
}
