//! Validation of JSON configuration against a [`Schema`].
//!
//! # Example
//!
//! ```
//! use folge_provider::schema::{Attribute, Schema};
//! use folge_provider::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("name", Attribute::required_string())
//!     .with_attribute("operator", Attribute::required_string().with_allowed_values(["eq", "gt"]));
//!
//! assert!(validate(&schema, &json!({"name": "up", "operator": "eq"})).is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"name": "up", "operator": "gte"}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("operator"));
//! ```

use crate::schema::{Attribute, AttributeType, Block, Diagnostic, NestedBlock, NestingMode, Schema};
use serde_json::{Map, Value};

/// Validate a JSON value against a schema.
///
/// An empty result means the value is valid. The rules:
///
/// - Required attributes must be present and non-null.
/// - Computed-only attributes are skipped.
/// - Types must match, and restricted strings must use an allowed value.
/// - Attributes the schema does not name are rejected.
/// - Nested blocks are validated recursively.
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    validate_block(&schema.block, value, "", &mut diagnostics);
    diagnostics
}

/// Like [`validate`], but returns `Err` when any diagnostic was produced.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Fill in schema defaults for attributes the value leaves unset or null.
///
/// Non-object values are returned unchanged.
pub fn apply_defaults(schema: &Schema, value: &Value) -> Value {
    let mut value = value.clone();
    if let Value::Object(obj) = &mut value {
        for (name, attr) in &schema.block.attributes {
            if let Some(default) = &attr.default {
                let unset = obj.get(name).map_or(true, Value::is_null);
                if unset {
                    obj.insert(name.clone(), default.clone());
                }
            }
        }
    }
    value
}

fn validate_block(block: &Block, value: &Value, path: &str, diagnostics: &mut Vec<Diagnostic>) {
    let obj = match value {
        Value::Object(map) => map,
        Value::Null => return,
        _ => {
            let diagnostic = Diagnostic::error("Expected object")
                .with_detail(format!("Got {}", value_type_name(value)));
            diagnostics.push(if path.is_empty() {
                diagnostic
            } else {
                diagnostic.with_attribute(path)
            });
            return;
        },
    };

    for (name, attr) in &block.attributes {
        validate_attribute(attr, obj.get(name), &join_path(path, name), diagnostics);
    }

    for (name, nested) in &block.blocks {
        validate_nested_block(nested, obj.get(name), &join_path(path, name), diagnostics);
    }

    reject_unknown(block, obj, path, diagnostics);
}

fn reject_unknown(
    block: &Block,
    obj: &Map<String, Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut unknown: Vec<&String> = obj
        .keys()
        .filter(|k| !block.attributes.contains_key(*k) && !block.blocks.contains_key(*k))
        .collect();
    unknown.sort();

    for name in unknown {
        let attr_path = join_path(path, name);
        diagnostics.push(
            Diagnostic::error(format!("Unsupported attribute '{}'", attr_path))
                .with_detail("An attribute with this name is not expected here")
                .with_attribute(attr_path),
        );
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.flags.computed && !attr.flags.optional && !attr.flags.required {
        return;
    }

    match value {
        None | Some(Value::Null) => {
            if attr.flags.required {
                diagnostics.push(
                    Diagnostic::error(format!("Missing required attribute '{}'", path))
                        .with_detail("This attribute is required and must be provided")
                        .with_attribute(path),
                );
            }
        },
        Some(v) => {
            if !type_matches(attr.attr_type, v) {
                diagnostics.push(
                    Diagnostic::error(format!("Invalid type for attribute '{}'", path))
                        .with_detail(format!(
                            "Expected {}, got {}",
                            attr.attr_type.type_name(),
                            value_type_name(v)
                        ))
                        .with_attribute(path),
                );
                return;
            }
            validate_allowed_value(attr, v, path, diagnostics);
        },
    }
}

fn validate_allowed_value(
    attr: &Attribute,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if attr.allowed_values.is_empty() {
        return;
    }
    let Some(s) = value.as_str() else {
        return;
    };
    if !attr.allowed_values.iter().any(|allowed| allowed == s) {
        diagnostics.push(
            Diagnostic::error(format!("Invalid value for attribute '{}'", path))
                .with_detail(format!(
                    "Expected one of [{}], got {:?}",
                    attr.allowed_values.join(", "),
                    s
                ))
                .with_attribute(path),
        );
    }
}

fn validate_nested_block(
    nested: &NestedBlock,
    value: Option<&Value>,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match nested.nesting_mode {
        NestingMode::Single => match value {
            None | Some(Value::Null) => {
                if nested.min_items > 0 {
                    diagnostics.push(
                        Diagnostic::error(format!("Missing required block '{}'", path))
                            .with_attribute(path),
                    );
                }
            },
            Some(v) => validate_block(&nested.block, v, path, diagnostics),
        },
    }
}

fn type_matches(attr_type: AttributeType, value: &Value) -> bool {
    match attr_type {
        AttributeType::String => value.is_string(),
        AttributeType::Int64 => is_int64(value),
        AttributeType::Bool => value.is_boolean(),
    }
}

fn is_int64(value: &Value) -> bool {
    match value {
        Value::Number(n) if n.is_i64() => true,
        Value::Number(n) => n
            .as_f64()
            .is_some_and(|f| f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64),
        _ => false,
    }
}

fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", base, name)
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
