//! Value Inspector.
//!
//! A pure, deterministic stringifier used to render offending values in
//! error messages. Depth and length are both capped so a pathological
//! input can't blow up an error message. This crate's `Value`/`InputValue`
//! are acyclic, but the bound applies uniformly regardless.

use crate::value::{InputValue, Scalar, Value};

/// Renders a runtime [`Value`] for embedding in an error message.
pub fn inspect(value: &Value, max_depth: usize, max_length: usize) -> String {
    let mut out = String::new();
    inspect_value(value, max_depth, max_length, &mut out);
    out
}

/// Renders an [`InputValue`] literal the same way, for variable/argument
/// coercion diagnostics that need to show the offending literal.
pub fn inspect_input(value: &InputValue, max_depth: usize, max_length: usize) -> String {
    let mut out = String::new();
    inspect_input_value(value, max_depth, max_length, &mut out);
    out
}

fn inspect_scalar(scalar: &Scalar, out: &mut String) {
    match scalar {
        Scalar::String(s) | Scalar::Enum(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Scalar::Int(i) => out.push_str(&i.to_string()),
        Scalar::Float(f) => out.push_str(&f.to_string()),
        Scalar::Boolean(b) => out.push_str(&b.to_string()),
    }
}

fn inspect_value(value: &Value, max_depth: usize, max_length: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Scalar(s) => inspect_scalar(s, out),
        Value::List(items) => {
            if max_depth == 0 {
                out.push_str("[Array]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i >= max_length {
                    out.push_str(&format!("…, {} more items", items.len() - max_length));
                    break;
                }
                if i > 0 {
                    out.push_str(", ");
                }
                inspect_value(item, max_depth - 1, max_length, out);
            }
            out.push(']');
        }
        Value::Object(obj) => {
            if max_depth == 0 {
                out.push_str("[Object]");
                return;
            }
            out.push('{');
            for (i, (key, val)) in obj.iter().enumerate() {
                if i >= max_length {
                    out.push_str(&format!("…, {} more items", obj.field_count() - max_length));
                    break;
                }
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                inspect_value(val, max_depth - 1, max_length, out);
            }
            out.push('}');
        }
    }
}

fn inspect_input_value(value: &InputValue, max_depth: usize, max_length: usize, out: &mut String) {
    match value {
        InputValue::Null => out.push_str("null"),
        InputValue::Scalar(s) => inspect_scalar(s, out),
        InputValue::Variable(name) => {
            out.push('$');
            out.push_str(name);
        }
        InputValue::List(items) => {
            if max_depth == 0 {
                out.push_str("[Array]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i >= max_length {
                    out.push_str(&format!("…, {} more items", items.len() - max_length));
                    break;
                }
                if i > 0 {
                    out.push_str(", ");
                }
                inspect_input_value(item, max_depth - 1, max_length, out);
            }
            out.push(']');
        }
        InputValue::Object(obj) => {
            if max_depth == 0 {
                out.push_str("[Object]");
                return;
            }
            out.push('{');
            for (i, (key, val)) in obj.iter().enumerate() {
                if i >= max_length {
                    out.push_str(&format!("…, {} more items", obj.field_count() - max_length));
                    break;
                }
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                inspect_input_value(val, max_depth - 1, max_length, out);
            }
            out.push('}');
        }
    }
}

pub const DEFAULT_MAX_DEPTH: usize = 8;
pub const DEFAULT_MAX_LENGTH: usize = 10;
