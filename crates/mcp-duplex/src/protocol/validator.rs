//! Fail-fast JSON Schema validation for capability inputs.
//!
//! Covers the subset declared by tool and prompt schemas: `type` (single or
//! list), `properties`, `required`, `additionalProperties: false`, `enum`,
//! `items`, `minimum` and `maximum`. Keywords outside that subset are ignored.

use serde_json::{Map, Number, Value};

use crate::types::{McpError, McpResult};

/// How strictly declared scalar types are enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Values must already have the declared type.
    Strict,
    /// Strings holding a number are accepted where a number or integer is
    /// declared, and converted.
    NumericStrings,
}

/// Validate `value` against `schema`, returning the value with any coercions
/// applied.
pub fn validate(value: &Value, schema: &Value, coercion: Coercion) -> McpResult<Value> {
    let mut checked = value.clone();
    check(&mut checked, schema, coercion, "$")?;
    Ok(checked)
}

/// Build an object schema from named property schemas.
pub fn object_schema<'a>(
    properties: impl IntoIterator<Item = (&'a str, Value, bool)>,
) -> Value {
    let mut props = Map::new();
    let mut required = Vec::new();
    for (name, schema, is_required) in properties {
        if is_required {
            required.push(Value::String(name.to_string()));
        }
        props.insert(name.to_string(), schema);
    }

    serde_json::json!({
        "type": "object",
        "properties": props,
        "required": required,
    })
}

fn check(value: &mut Value, schema: &Value, coercion: Coercion, path: &str) -> McpResult<()> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    if let Some(expected) = schema.get("type") {
        let types: Vec<&str> = match expected {
            Value::String(t) => vec![t.as_str()],
            Value::Array(list) => list.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };

        if !types.is_empty() && !types.iter().any(|t| matches_type(value, t)) {
            match coerce(value, &types, coercion) {
                Some(converted) => *value = converted,
                None => {
                    return Err(McpError::InvalidParams(format!(
                        "{path}: expected {}, got {}",
                        types.join(" or "),
                        type_name(value)
                    )))
                }
            }
        }
    }

    if let Some(Value::Array(allowed)) = schema.get("enum") {
        if !allowed.contains(value) {
            return Err(McpError::InvalidParams(format!(
                "{path}: value {value} is not one of {}",
                Value::Array(allowed.clone())
            )));
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(Value::as_f64) {
            if n < min {
                return Err(McpError::InvalidParams(format!(
                    "{path}: {n} is below the minimum {min}"
                )));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(Value::as_f64) {
            if n > max {
                return Err(McpError::InvalidParams(format!(
                    "{path}: {n} is above the maximum {max}"
                )));
            }
        }
    }

    match value {
        Value::Object(map) => check_object(map, schema, coercion, path),
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter_mut().enumerate() {
                    check(item, item_schema, coercion, &format!("{path}[{i}]"))?;
                }
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_object(
    map: &mut Map<String, Value>,
    schema: &Map<String, Value>,
    coercion: Coercion,
    path: &str,
) -> McpResult<()> {
    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if !map.contains_key(name) {
                return Err(McpError::InvalidParams(format!(
                    "{path}: missing required property '{name}'"
                )));
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(properties) = properties {
        for (name, property_schema) in properties {
            if let Some(property) = map.get_mut(name) {
                check(property, property_schema, coercion, &format!("{path}.{name}"))?;
            }
        }
    }

    if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
        if let Some(unknown) = map
            .keys()
            .find(|k| !properties.is_some_and(|p| p.contains_key(k.as_str())))
        {
            return Err(McpError::InvalidParams(format!(
                "{path}: unexpected property '{unknown}'"
            )));
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => true,
    }
}

fn coerce(value: &Value, types: &[&str], coercion: Coercion) -> Option<Value> {
    if coercion != Coercion::NumericStrings {
        return None;
    }
    let text = value.as_str()?.trim();

    types.iter().find_map(|t| match *t {
        "integer" => text.parse::<i64>().ok().map(Value::from),
        "number" => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        _ => None,
    })
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
