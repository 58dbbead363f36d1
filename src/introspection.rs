//! Minimal built-in introspection.
//!
//! Full introspection schema generation is out of scope — it would
//! require schema construction, which this crate treats as an external
//! concern. This module special-cases `__schema` and `__type(name:)` at
//! plan-build time, the way the plan builder already special-cases
//! `__typename` in `compile::plan`, and answers only the shallow shape
//! `{ __schema { types { name kind } } }` /
//! `{ __type(name: "...") { name kind } }`. `__type` resolves to `null`
//! for an unrecognized name, same as a real `__Type` introspection root
//! field. Any other `__schema`/`__Type` subfield is silently omitted,
//! matching the executor's general policy for fields outside what was
//! planned.

use std::sync::Arc;

use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::ast::{resolve_argument_definitions, Field, Selection};
use crate::compile::arguments::ArgumentAssembler;
use crate::compile::plan::{ChildSelection, Completion, PlanNode};
use crate::compile::variables::coerce_literal;
use crate::error::CompileError;
use crate::schema::{Argument, NamedType, Resolved, Resolver, Schema, Source, TypeRef};
use crate::value::{Scalar, Value};

fn kind_of(named: &NamedType) -> &'static str {
    match named {
        NamedType::Scalar(_) => "SCALAR",
        NamedType::Enum(_) => "ENUM",
        NamedType::Object(_) => "OBJECT",
        NamedType::Interface(_) => "INTERFACE",
        NamedType::Union(_) => "UNION",
        NamedType::InputObject(_) => "INPUT_OBJECT",
    }
}

/// `__Type` is encoded, for this shallow probe, as `"name:KIND"` inside
/// a `Value::Scalar(String)` source — cheaper than a bespoke struct for
/// the two fields (`name`, `kind`) this probe supports.
fn encode(name: &str, kind: &str) -> Source {
    Arc::new(Value::Scalar(Scalar::String(format!("{name}:{kind}")))) as Source
}

fn decode(source: &Source) -> (String, String) {
    let Some(Value::Scalar(Scalar::String(s))) = source.downcast_ref::<Value>() else {
        return (String::new(), String::new());
    };
    match s.split_once(':') {
        Some((name, kind)) => (name.to_owned(), kind.to_owned()),
        None => (s.clone(), String::new()),
    }
}

fn string_serialize() -> crate::schema::Serialize {
    Arc::new(|source: &Source| {
        source
            .downcast_ref::<Value>()
            .cloned()
            .ok_or_else(|| crate::error::FieldError::new("expected String", None))
    })
}

fn leaf_node(response_key: &str, field_name: &'static str, resolver: Resolver) -> PlanNode {
    PlanNode {
        response_key: response_key.to_owned(),
        field_name: field_name.to_owned(),
        field_nodes: Vec::new(),
        parent_type: "__Type".to_owned(),
        return_type: TypeRef::named("String"),
        resolver,
        arguments: ArgumentAssembler::new(field_name, IndexMap::new(), IndexMap::new(), IndexMap::new()),
        completion: Completion::Scalar {
            serialize: string_serialize(),
            type_name: "String".to_owned(),
        },
        locations: Vec::new(),
    }
}

/// Builds the `__Type` selection (`name`/`kind` only) honoring whatever
/// subset the query actually asked for.
fn type_selection(requested: &[Selection]) -> ChildSelection {
    let mut out = ChildSelection::new();
    for selection in requested {
        let Selection::Field(field) = selection else {
            continue;
        };
        let key = field.response_key().to_owned();
        let node = match field.name.as_str() {
            "name" => leaf_node(&key, "name", Arc::new(|args| {
                let (name, _) = decode(&args.source);
                Resolved::ready_ok(Arc::new(Value::Scalar(Scalar::String(name))) as Source)
            })),
            "kind" => leaf_node(&key, "kind", Arc::new(|args| {
                let (_, kind) = decode(&args.source);
                Resolved::ready_ok(Arc::new(Value::Scalar(Scalar::String(kind))) as Source)
            })),
            _ => continue,
        };
        out.insert(key, Arc::new(node));
    }
    out
}

/// Plan for `__schema` at the query root: supports only
/// `{ __schema { types { name kind } } }`.
pub fn build_schema_field_plan(schema: &Schema, response_key: &str, field_nodes: &[Arc<Field>]) -> PlanNode {
    let type_sources: Vec<Source> = schema
        .types
        .values()
        .map(|t| encode(t.name(), kind_of(t)))
        .collect();

    let requested_on_schema: Vec<Selection> = field_nodes
        .iter()
        .flat_map(|f| f.selection_set.iter().cloned())
        .collect();

    let types_requested: Vec<Selection> = requested_on_schema
        .iter()
        .find_map(|s| match s {
            Selection::Field(f) if f.name == "types" => Some(f.selection_set.clone()),
            _ => None,
        })
        .unwrap_or_default();

    let types_node = PlanNode {
        response_key: "types".to_owned(),
        field_name: "types".to_owned(),
        field_nodes: Vec::new(),
        parent_type: "__Schema".to_owned(),
        return_type: TypeRef::non_null(TypeRef::list(TypeRef::non_null(TypeRef::named("__Type")))),
        resolver: Arc::new(move |_args| Resolved::ready_ok(Arc::new(type_sources.clone()) as Source)),
        arguments: ArgumentAssembler::new("types", IndexMap::new(), IndexMap::new(), IndexMap::new()),
        completion: Completion::NonNull(Box::new(Completion::List(Box::new(Completion::NonNull(Box::new(
            Completion::Object(type_selection(&types_requested)),
        )))))),
        locations: field_nodes.iter().map(|f| f.location).collect(),
    };

    let mut schema_child = ChildSelection::new();
    schema_child.insert("types".to_owned(), Arc::new(types_node));

    PlanNode {
        response_key: response_key.to_owned(),
        field_name: "__schema".to_owned(),
        field_nodes: field_nodes.to_vec(),
        parent_type: schema.query_type_name.clone(),
        return_type: TypeRef::non_null(TypeRef::named("__Schema")),
        resolver: Arc::new(|_args| Resolved::ready_ok(Arc::new(()) as Source)),
        arguments: ArgumentAssembler::new("__schema", IndexMap::new(), IndexMap::new(), IndexMap::new()),
        completion: Completion::NonNull(Box::new(Completion::Object(schema_child))),
        locations: field_nodes.iter().map(|f| f.location).collect(),
    }
}

/// Plan for `__type(name: String!)` at the query root: returns the
/// `__Type` encoding for a known type name, or `null` for an unrecognized
/// one. Supports only `{ __type(name: "...") { name kind } }`, the same
/// shallow shape `__schema { types { ... } }` supports.
pub fn build_type_field_plan(
    schema: &Schema,
    response_key: &str,
    field_nodes: &[Arc<Field>],
) -> Result<PlanNode, CompileError> {
    let by_name: FnvHashMap<String, &'static str> = schema
        .types
        .values()
        .map(|t| (t.name().to_owned(), kind_of(t)))
        .collect();

    let representative = Arc::clone(&field_nodes[0]);
    let known_arg_names = std::collections::HashSet::from(["name".to_owned()]);
    let required_non_null =
        std::collections::HashMap::from([("name".to_owned(), "String!".to_owned())]);
    let arg_split =
        resolve_argument_definitions(&representative, &known_arg_names, &required_non_null)?;

    let mut literal_values = IndexMap::new();
    for (name, literal) in &arg_split.values {
        let coerced = coerce_literal(schema, &TypeRef::non_null(TypeRef::named("String")), literal, None, "__type.name")
            .map_err(|e| CompileError::InvalidArgumentLiteral {
                name: name.clone(),
                reason: e.message,
            })?;
        literal_values.insert(name.clone(), coerced);
    }

    let mut arg_defs = IndexMap::new();
    arg_defs.insert(
        "name".to_owned(),
        Argument::new("name", TypeRef::non_null(TypeRef::named("String"))),
    );
    let assembler = ArgumentAssembler::new("__type", arg_defs, literal_values, arg_split.missing);

    let requested: Vec<Selection> = field_nodes
        .iter()
        .flat_map(|f| f.selection_set.iter().cloned())
        .collect();

    let resolver: Resolver = Arc::new(move |args| {
        let requested_name = args
            .arguments
            .get_field_value("name")
            .and_then(|v| match v {
                Value::Scalar(Scalar::String(s)) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_default();
        let source = match by_name.get(&requested_name) {
            Some(kind) => encode(&requested_name, *kind),
            None => Arc::new(Value::Null) as Source,
        };
        Resolved::ready_ok(source)
    });

    Ok(PlanNode {
        response_key: response_key.to_owned(),
        field_name: "__type".to_owned(),
        field_nodes: field_nodes.to_vec(),
        parent_type: schema.query_type_name.clone(),
        return_type: TypeRef::named("__Type"),
        resolver,
        arguments: assembler,
        completion: Completion::Object(type_selection(&requested)),
        locations: field_nodes.iter().map(|f| f.location).collect(),
    })
}
