//! Plan Builder — the heart of the compiler.
//!
//! Walks the operation's selection tree under the schema, producing the
//! tagged [`PlanNode`] tree: one node per response key, carrying its
//! resolver, argument assembler, completion strategy, and precomputed
//! child selection. The plan is immutable and shareable once built.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::ast::{
    collect_fields, resolve_argument_definitions, Field, Fragment, Selection, SubfieldCache,
};
use crate::compile::arguments::ArgumentAssembler;
use crate::compile::variables::coerce_literal;
use crate::compile::CompileOptions;
use crate::error::{CompileError, Location};
use crate::introspection;
use crate::schema::{
    default_property_resolver, IsTypeOf, NamedType, Resolved, ResolveType, Resolver, Schema,
    Serialize, Source, TypeRef,
};
use crate::value::{Scalar, Value};

const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "ID", "Boolean"];

fn builtin_serialize(type_name: &str) -> Serialize {
    let type_name = type_name.to_owned();
    Arc::new(move |source: &Source| {
        if let Some(v) = source.downcast_ref::<Value>() {
            return Ok(v.clone());
        }
        if let Some(s) = source.downcast_ref::<String>() {
            return Ok(Value::Scalar(match type_name.as_str() {
                "ID" => Scalar::String(s.clone()),
                _ => Scalar::String(s.clone()),
            }));
        }
        if let Some(i) = source.downcast_ref::<i32>() {
            return Ok(Value::Scalar(Scalar::Int(*i)));
        }
        if let Some(f) = source.downcast_ref::<f64>() {
            return Ok(Value::Scalar(Scalar::Float(*f)));
        }
        if let Some(b) = source.downcast_ref::<bool>() {
            return Ok(Value::Scalar(Scalar::Boolean(*b)));
        }
        Err(crate::error::FieldError::new(
            format!("Expected a value of type '{type_name}' but received something else."),
            None,
        ))
    })
}

/// Default enum serializer: accepts a `Value::Scalar(Enum|String)` or a
/// bare `String` resolver return and emits it as a response enum value.
fn builtin_enum_serialize(type_name: &str) -> Serialize {
    let type_name = type_name.to_owned();
    Arc::new(move |source: &Source| {
        if let Some(Value::Scalar(Scalar::Enum(s) | Scalar::String(s))) = source.downcast_ref::<Value>() {
            return Ok(Value::Scalar(Scalar::Enum(s.clone())));
        }
        if let Some(v @ Value::Null) = source.downcast_ref::<Value>() {
            return Ok(v.clone());
        }
        if let Some(s) = source.downcast_ref::<String>() {
            return Ok(Value::Scalar(Scalar::Enum(s.clone())));
        }
        Err(crate::error::FieldError::new(
            format!("Expected a value of type '{type_name}' but received something else."),
            None,
        ))
    })
}

/// Trusts a resolver's return verbatim as the response [`Value`],
/// skipping the scalar's own `serialize` hook — `disableLeafSerialization`.
fn trust_serialize() -> Serialize {
    Arc::new(|source: &Source| {
        source.downcast_ref::<Value>().cloned().ok_or_else(|| {
            crate::error::FieldError::new(
                "disableLeafSerialization requires resolvers to return a Value directly",
                None,
            )
        })
    })
}

/// Completion strategy for a field's return type.
pub enum Completion {
    Scalar {
        serialize: Serialize,
        type_name: String,
    },
    Enum {
        serialize: Serialize,
        type_name: String,
    },
    List(Box<Completion>),
    NonNull(Box<Completion>),
    Object(ChildSelection),
    Abstract {
        type_name: String,
        resolve_type: Option<ResolveType>,
        possible: IndexMap<String, PossibleType>,
    },
}

pub struct PossibleType {
    pub is_type_of: Option<IsTypeOf>,
    pub selection: ChildSelection,
}

/// A precomputed map from response key to child plan node, shared (via
/// `Arc`) across every element when the parent field resolves to a list
/// of objects.
pub type ChildSelection = IndexMap<String, Arc<PlanNode>>;

pub struct PlanNode {
    pub response_key: String,
    pub field_name: String,
    pub field_nodes: Vec<Arc<Field>>,
    pub parent_type: String,
    pub return_type: TypeRef,
    pub resolver: Resolver,
    pub arguments: ArgumentAssembler,
    pub completion: Completion,
    pub locations: Vec<Location>,
}

struct PlanContext<'a> {
    schema: &'a Schema,
    fragments: FnvHashMap<String, &'a Fragment>,
    subfield_cache: SubfieldCache,
    options: &'a CompileOptions,
}

/// Picks the `serialize` hook a scalar completion should carry,
/// honoring `customSerializers` and `disableLeafSerialization`.
fn resolve_serialize(ctx: &PlanContext, type_name: &str, schema_serialize: Serialize) -> Serialize {
    if let Some(custom) = ctx.options.custom_serializers.get(type_name) {
        return custom.clone();
    }
    if ctx.options.disable_leaf_serialization {
        return trust_serialize();
    }
    schema_serialize
}

fn merge_selection_sets(field_nodes: &[Arc<Field>]) -> Vec<Selection> {
    field_nodes
        .iter()
        .flat_map(|f| f.selection_set.iter().cloned())
        .collect()
}

fn grouped_fields(
    ctx: &mut PlanContext,
    object_type_name: &str,
    field_nodes: &[Arc<Field>],
) -> Result<crate::ast::FieldGroup, CompileError> {
    let key = SubfieldCache::key_for(object_type_name, field_nodes);
    if let Some(group) = ctx.subfield_cache.get(&key) {
        return Ok(group.clone());
    }
    let merged = merge_selection_sets(field_nodes);
    let mut visited = HashSet::new();
    let mut group = crate::ast::FieldGroup::new();
    let known_variables = HashMap::new();
    collect_fields(
        &merged,
        object_type_name,
        &ctx.fragments,
        &known_variables,
        &|condition, object| ctx.schema.type_condition_applies(condition, object),
        &mut visited,
        &mut group,
    )?;
    ctx.subfield_cache.insert(key, group.clone());
    Ok(group)
}

fn build_selection(
    ctx: &mut PlanContext,
    object_type_name: &str,
    field_nodes: &[Arc<Field>],
) -> Result<ChildSelection, CompileError> {
    let group = grouped_fields(ctx, object_type_name, field_nodes)?;
    let mut result = ChildSelection::new();
    for (response_key, nodes) in group {
        let node = build_field_plan(ctx, object_type_name, &response_key, nodes)?;
        result.insert(response_key, Arc::new(node));
    }
    Ok(result)
}

fn typename_resolver() -> Resolver {
    Arc::new(|args| Resolved::ready_ok(Arc::new(args.info.parent_type.clone()) as Source))
}

fn build_field_plan(
    ctx: &mut PlanContext,
    parent_type_name: &str,
    response_key: &str,
    nodes: Vec<Arc<Field>>,
) -> Result<PlanNode, CompileError> {
    let representative = Arc::clone(&nodes[0]);
    let field_name = representative.name.clone();
    let locations = nodes.iter().map(|f| f.location).collect();

    if field_name == "__typename" {
        return Ok(PlanNode {
            response_key: response_key.to_owned(),
            field_name,
            field_nodes: nodes,
            parent_type: parent_type_name.to_owned(),
            return_type: TypeRef::non_null(TypeRef::named("String")),
            resolver: typename_resolver(),
            arguments: ArgumentAssembler::new(
                "__typename",
                IndexMap::new(),
                IndexMap::new(),
                IndexMap::new(),
            ),
            completion: Completion::Scalar {
                serialize: resolve_serialize(ctx, "String", builtin_serialize("String")),
                type_name: "String".to_owned(),
            },
            locations,
        });
    }

    if field_name == "__schema" && parent_type_name == ctx.schema.query_type_name {
        return Ok(introspection::build_schema_field_plan(ctx.schema, response_key, &nodes));
    }

    if field_name == "__type" && parent_type_name == ctx.schema.query_type_name {
        return introspection::build_type_field_plan(ctx.schema, response_key, &nodes);
    }

    let field_def = ctx
        .schema
        .type_by_name(parent_type_name)
        .and_then(|t| t.fields())
        .and_then(|fields| fields.get(&field_name))
        .cloned()
        .ok_or_else(|| CompileError::UnknownField {
            type_name: parent_type_name.to_owned(),
            field: field_name.clone(),
        })?;

    let known_arg_names: HashSet<String> = field_def.arguments.keys().cloned().collect();
    let required_non_null: HashMap<String, String> = field_def
        .arguments
        .iter()
        .filter(|(_, a)| a.arg_type.is_non_null() && a.default_value.is_none())
        .map(|(name, a)| (name.clone(), a.arg_type.to_string()))
        .collect();

    let arg_split =
        resolve_argument_definitions(&representative, &known_arg_names, &required_non_null)?;

    let mut literal_values = IndexMap::new();
    for (name, literal) in &arg_split.values {
        let argdef = &field_def.arguments[name];
        let coerced = coerce_literal(
            ctx.schema,
            &argdef.arg_type,
            literal,
            None,
            &format!("{field_name}.{name}"),
        )
        .map_err(|e| CompileError::InvalidArgumentLiteral {
            name: name.clone(),
            reason: e.message,
        })?;
        literal_values.insert(name.clone(), coerced);
    }
    for (name, argdef) in &field_def.arguments {
        if literal_values.contains_key(name) || arg_split.missing.contains_key(name) {
            continue;
        }
        if let Some(default) = &argdef.default_value {
            let coerced = coerce_literal(
                ctx.schema,
                &argdef.arg_type,
                default,
                None,
                &format!("{field_name}.{name}"),
            )
            .map_err(|e| CompileError::InvalidArgumentLiteral {
                name: name.clone(),
                reason: e.message,
            })?;
            literal_values.insert(name.clone(), coerced);
        }
    }

    let assembler = ArgumentAssembler::new(
        field_name.clone(),
        field_def.arguments.clone(),
        literal_values,
        arg_split.missing.clone(),
    );

    let resolver = field_def.resolve.clone().unwrap_or_else(|| {
        let name = field_name.clone();
        Arc::new(move |args| default_property_resolver(&name, &args.source))
    });

    let completion = build_completion(ctx, &field_def.field_type, &nodes)?;

    Ok(PlanNode {
        response_key: response_key.to_owned(),
        field_name,
        field_nodes: nodes,
        parent_type: parent_type_name.to_owned(),
        return_type: field_def.field_type.clone(),
        resolver,
        arguments: assembler,
        completion,
        locations,
    })
}

fn build_completion(
    ctx: &mut PlanContext,
    type_ref: &TypeRef,
    field_nodes: &[Arc<Field>],
) -> Result<Completion, CompileError> {
    match type_ref {
        TypeRef::NonNull(inner) => Ok(Completion::NonNull(Box::new(build_completion(
            ctx,
            inner,
            field_nodes,
        )?))),
        TypeRef::List(inner) => Ok(Completion::List(Box::new(build_completion(
            ctx,
            inner,
            field_nodes,
        )?))),
        TypeRef::Named(name) => {
            if BUILTIN_SCALARS.contains(&name.as_str()) {
                return Ok(Completion::Scalar {
                    serialize: resolve_serialize(ctx, name, builtin_serialize(name)),
                    type_name: name.clone(),
                });
            }
            match ctx.schema.type_by_name(name) {
                Some(NamedType::Scalar(scalar_type)) => Ok(Completion::Scalar {
                    serialize: resolve_serialize(ctx, name, scalar_type.serialize.clone()),
                    type_name: name.clone(),
                }),
                Some(NamedType::Enum(_)) => Ok(Completion::Enum {
                    serialize: resolve_serialize(ctx, name, builtin_enum_serialize(name)),
                    type_name: name.clone(),
                }),
                Some(NamedType::Object(_)) => {
                    let selection = build_selection(ctx, name, field_nodes)?;
                    Ok(Completion::Object(selection))
                }
                Some(NamedType::Interface(_)) | Some(NamedType::Union(_)) => {
                    build_abstract_completion(ctx, name, field_nodes)
                }
                Some(NamedType::InputObject(_)) | None => {
                    Err(CompileError::UnknownType { name: name.clone() })
                }
            }
        }
    }
}

fn build_abstract_completion(
    ctx: &mut PlanContext,
    abstract_name: &str,
    field_nodes: &[Arc<Field>],
) -> Result<Completion, CompileError> {
    let resolve_type = match ctx.schema.type_by_name(abstract_name) {
        Some(NamedType::Interface(i)) => i.resolve_type.clone(),
        Some(NamedType::Union(u)) => u.resolve_type.clone(),
        _ => None,
    };

    let possible_type_names = ctx.schema.possible_types(abstract_name);
    let mut possible = IndexMap::new();
    for type_name in possible_type_names {
        let is_type_of = match ctx.schema.type_by_name(&type_name) {
            Some(NamedType::Object(o)) => o.is_type_of.clone(),
            _ => None,
        };
        if resolve_type.is_none() && is_type_of.is_none() {
            return Err(CompileError::MissingTypeResolver {
                type_name: type_name.clone(),
            });
        }
        let selection = build_selection(ctx, &type_name, field_nodes)?;
        possible.insert(type_name, PossibleType { is_type_of, selection });
    }

    Ok(Completion::Abstract {
        type_name: abstract_name.to_owned(),
        resolve_type,
        possible,
    })
}

/// Entry point used by [`crate::compile::compile`]: builds the top-level
/// selection under the operation's root object type.
pub(crate) fn build_operation_plan(
    schema: &Schema,
    fragments: FnvHashMap<String, &Fragment>,
    root_type_name: &str,
    selection_set: &[Selection],
    options: &CompileOptions,
) -> Result<ChildSelection, CompileError> {
    let mut ctx = PlanContext {
        schema,
        fragments,
        subfield_cache: SubfieldCache::new(),
        options,
    };
    let mut visited = HashSet::new();
    let mut group = crate::ast::FieldGroup::new();
    collect_fields(
        selection_set,
        root_type_name,
        &ctx.fragments,
        &HashMap::new(),
        &|condition, object| ctx.schema.type_condition_applies(condition, object),
        &mut visited,
        &mut group,
    )?;
    let mut result = ChildSelection::new();
    for (response_key, nodes) in group {
        let node = build_field_plan(&mut ctx, root_type_name, &response_key, nodes)?;
        result.insert(response_key, Arc::new(node));
    }
    Ok(result)
}
