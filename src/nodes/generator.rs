//! Node schema generation
//!
//! Turns a [`FunctionDescriptor`] into the JSON shape the editor renders:
//!
//! ```json
//! {
//!   "name": "add",
//!   "description": "Add two numbers.",
//!   "params": [{"name": "a", "type": "float"}, {"name": "b", "type": "float", "default": 1.0}],
//!   "returns": [{"name": "result", "type": "float"}],
//!   "is_async": false
//! }
//! ```

use crate::error::Result;
use crate::nodes::introspect::{FunctionDescriptor, ParamDescriptor, ParamKind};
use serde_json::{json, Map, Number, Value};

const ANY_TYPE: &str = "any";

/// Converts a function descriptor into the base fields of a schema record
pub trait SchemaGenerator: Send + Sync {
    /// The returned map must contain a string `name`
    fn schema_from_function(&self, function: &FunctionDescriptor) -> Result<Map<String, Value>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NodeSchemaGenerator;

impl NodeSchemaGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl SchemaGenerator for NodeSchemaGenerator {
    fn schema_from_function(&self, function: &FunctionDescriptor) -> Result<Map<String, Value>> {
        // *args and **kwargs have no input socket in the editor
        let params: Vec<Value> = function
            .params
            .iter()
            .filter(|p| !matches!(p.kind, ParamKind::VarPositional | ParamKind::VarKeyword))
            .map(param_schema)
            .collect();

        let returns = match function.returns.as_deref() {
            Some("None") => Vec::new(),
            Some(annotation) => vec![json!({"name": "result", "type": annotation})],
            None => vec![json!({"name": "result", "type": ANY_TYPE})],
        };

        let mut schema = Map::new();
        schema.insert("name".to_string(), Value::String(function.name.clone()));
        schema.insert(
            "description".to_string(),
            Value::String(function.docstring.clone().unwrap_or_default()),
        );
        schema.insert("params".to_string(), Value::Array(params));
        schema.insert("returns".to_string(), Value::Array(returns));
        schema.insert("is_async".to_string(), Value::Bool(function.is_async));

        Ok(schema)
    }
}

fn param_schema(param: &ParamDescriptor) -> Value {
    let mut schema = Map::new();
    schema.insert("name".to_string(), Value::String(param.name.clone()));
    schema.insert(
        "type".to_string(),
        Value::String(param.annotation.clone().unwrap_or_else(|| ANY_TYPE.to_string())),
    );
    if let Some(default) = &param.default {
        schema.insert("default".to_string(), literal_value(default));
    }
    Value::Object(schema)
}

/// JSON value of a simple Python literal; other expressions are kept as source text
fn literal_value(text: &str) -> Value {
    match text {
        "None" => return Value::Null,
        "True" => return Value::Bool(true),
        "False" => return Value::Bool(false),
        _ => {}
    }

    if let Some(number) = numeric_value(text) {
        return number;
    }

    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            if !inner.contains(quote) && !inner.contains('\\') {
                return Value::String(inner.to_string());
            }
        }
    }

    Value::String(text.to_string())
}

/// Decimal int or float literal; `None` for identifiers, hex and values
/// that do not fit losslessly
fn numeric_value(text: &str) -> Option<Value> {
    let unsigned = text.strip_prefix(|c: char| c == '-' || c == '+').unwrap_or(text);
    let mut chars = unsigned.chars();
    let starts_numeric = match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    };
    if !starts_numeric {
        return None;
    }

    // `_` is only a separator between two digits
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'_' {
            let prev = i.checked_sub(1).map(|p| bytes[p]);
            let next = bytes.get(i + 1).copied();
            if !prev.is_some_and(|p| p.is_ascii_digit()) || !next.is_some_and(|n| n.is_ascii_digit()) {
                return None;
            }
        }
    }
    let digits = text.replace('_', "");

    if digits.bytes().all(|b| b.is_ascii_digit() || b == b'-' || b == b'+') {
        if let Ok(i) = digits.parse::<i64>() {
            return Some(Value::Number(i.into()));
        }
        return digits.parse::<u64>().ok().map(|u| Value::Number(u.into()));
    }

    digits
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}
