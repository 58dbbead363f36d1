//! JSON-Shape Emitter. Optional; gated behind the `json-shape` feature
//! since it pulls in `serde_json`.
//!
//! Walks the same plan structure the plan builder built to emit a
//! JSON-schema-shaped
//! description of `{ data, errors }` for a compiled operation: scalar
//! types map to JSON primitive types, nullability is reflected as
//! `nullable`, and abstract types produce the union of their possible
//! types' properties.

use indexmap::IndexMap;
use serde_json::{json, Value as Json};

use crate::compile::plan::{ChildSelection, Completion, PlanNode};

/// A JSON-schema-ish description of one operation's `data` shape. Kept
/// as a `serde_json::Value` rather than a bespoke type, so it can be
/// handed directly to a schema-directed fast serializer or embedded in
/// diagnostics.
#[derive(Clone, Debug)]
pub struct JsonShape {
    pub schema: Json,
}

pub fn build_json_shape(selection: &ChildSelection) -> JsonShape {
    JsonShape {
        schema: json!({
            "type": "object",
            "properties": {
                "data": object_schema(selection),
                "errors": {
                    "type": "array",
                    "items": error_schema(),
                },
            },
        }),
    }
}

fn object_schema(selection: &ChildSelection) -> Json {
    let mut properties = IndexMap::new();
    for (key, node) in selection {
        properties.insert(key.clone(), field_schema(node));
    }
    json!({
        "type": ["object", "null"],
        "properties": properties,
    })
}

fn field_schema(node: &PlanNode) -> Json {
    completion_schema(&node.completion, true)
}

fn completion_schema(completion: &Completion, nullable: bool) -> Json {
    match completion {
        Completion::NonNull(inner) => completion_schema(inner, false),
        Completion::List(inner) => {
            let items = completion_schema(inner, true);
            wrap_nullable(json!({ "type": "array", "items": items }), nullable)
        }
        Completion::Scalar { type_name, .. } => {
            wrap_nullable(json!({ "type": primitive_for_scalar_name(type_name) }), nullable)
        }
        Completion::Enum { .. } => wrap_nullable(json!({ "type": "string" }), nullable),
        Completion::Object(child) => wrap_nullable(object_schema(child), nullable),
        Completion::Abstract { possible, .. } => {
            // Union of every possible type's properties.
            let mut properties = IndexMap::new();
            for possible_type in possible.values() {
                for (key, node) in &possible_type.selection {
                    properties.entry(key.clone()).or_insert_with(|| field_schema(node));
                }
            }
            wrap_nullable(
                json!({
                    "type": "object",
                    "properties": properties,
                }),
                nullable,
            )
        }
    }
}

fn wrap_nullable(schema: Json, nullable: bool) -> Json {
    if !nullable {
        return schema;
    }
    let mut schema = schema;
    if let Some(obj) = schema.as_object_mut() {
        obj.insert("nullable".to_owned(), json!(true));
    }
    schema
}

fn error_schema() -> Json {
    json!({
        "type": "object",
        "properties": {
            "message": { "type": "string" },
            "locations": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "line": { "type": "integer" },
                        "column": { "type": "integer" },
                    },
                },
            },
            "path": {
                "type": "array",
                "items": { "type": ["string", "integer"] },
            },
        },
    })
}

/// Maps a leaf scalar's declared type name to its JSON primitive
/// (`Int→integer`, `Float→number`, `String/ID→string`, `Boolean→boolean`,
/// enum→string). Kept separate from [`completion_schema`]
/// since scalar completions don't currently retain their declared type
/// name (only their `serialize` closure); an implementer supplying a
/// schema-directed fast serializer would key off this.
pub fn primitive_for_scalar_name(type_name: &str) -> &'static str {
    match type_name {
        "Int" => "integer",
        "Float" => "number",
        "Boolean" => "boolean",
        "String" | "ID" => "string",
        _ => "string",
    }
}
