//! Payload validation against capability schemas.
//!
//! Cards advertise JSON-schema-shaped contracts (`type`, `properties`,
//! `required`). Validation is reject-only: a payload that does not match is
//! refused at the invocation boundary, never coerced. Only the subset of
//! JSON Schema the cards actually use is checked.

use serde_json::Value;

use super::errors::CoreError;

/// Validate `payload` against `schema`.
///
/// An empty or non-object schema accepts anything, matching cards that
/// advertise an open contract.
pub fn validate(schema: &Value, payload: &Value) -> Result<(), CoreError> {
    validate_at(schema, payload, "$")
}

fn validate_at(schema: &Value, value: &Value, path: &str) -> Result<(), CoreError> {
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };
    if schema_obj.is_empty() {
        return Ok(());
    }

    if let Some(expected) = schema_obj.get("type").and_then(Value::as_str) {
        if !type_matches(expected, value) {
            return Err(CoreError::validation(format!(
                "{path}: expected {expected}, got {}",
                type_name(value)
            )));
        }
    }

    // Object checks: required members first, then member types.
    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        let members = value.as_object();
        for name in required.iter().filter_map(Value::as_str) {
            let present = members.map(|m| m.contains_key(name)).unwrap_or(false);
            if !present {
                return Err(CoreError::validation(format!(
                    "{path}: missing required field '{name}'"
                )));
            }
        }
    }

    if let (Some(props), Some(members)) = (
        schema_obj.get("properties").and_then(Value::as_object),
        value.as_object(),
    ) {
        for (name, prop_schema) in props {
            if let Some(member) = members.get(name) {
                // Absent optional members are fine; null means absent too.
                if !member.is_null() {
                    validate_at(prop_schema, member, &format!("{path}.{name}"))?;
                }
            }
        }
    }

    if let (Some(item_schema), Some(items)) = (schema_obj.get("items"), value.as_array()) {
        for (i, item) in items.iter().enumerate() {
            validate_at(item_schema, item, &format!("{path}[{i}]"))?;
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        _ => true,
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
