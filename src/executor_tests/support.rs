//! Hand-built documents, schemas, and a thin `run` wrapper shared by the
//! `executor_tests` submodules. There is no parser in this crate, so
//! rather than passing a query string, these build the equivalent
//! [`Field`]/[`Selection`] tree directly.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::{
    Argument, Definition, Directive, Field, Operation, OperationType, Selection,
    VariableDefinition,
};
use crate::compile::{compile, CompileOptions, CompiledQuery};
use crate::error::{CompileError, Location};
use crate::schema::{Context, NamedType, ObjectType, Resolved, Resolver, ResolverArgs, Schema, Source};
use crate::value::{InputValue, Object, Scalar, Value};
use crate::{ast::Document, execute::ExecutionOutcome};

pub fn leaf(name: &str) -> Selection {
    field(name, Vec::new())
}

pub fn field(name: &str, selection_set: Vec<Selection>) -> Selection {
    Selection::Field(Field {
        alias: None,
        name: name.to_owned(),
        arguments: Vec::new(),
        directives: Vec::new(),
        selection_set,
        location: Location::default(),
    })
}

pub fn aliased(alias: &str, name: &str, selection_set: Vec<Selection>) -> Selection {
    Selection::Field(Field {
        alias: Some(alias.to_owned()),
        name: name.to_owned(),
        arguments: Vec::new(),
        directives: Vec::new(),
        selection_set,
        location: Location::default(),
    })
}

pub fn with_args(selection: Selection, arguments: Vec<Argument>) -> Selection {
    match selection {
        Selection::Field(mut f) => {
            f.arguments = arguments;
            Selection::Field(f)
        }
        other => other,
    }
}

pub fn with_directives(selection: Selection, directives: Vec<Directive>) -> Selection {
    match selection {
        Selection::Field(mut f) => {
            f.directives = directives;
            Selection::Field(f)
        }
        other => other,
    }
}

pub fn arg(name: &str, value: InputValue) -> Argument {
    Argument {
        name: name.to_owned(),
        value,
        location: Location::default(),
    }
}

/// `@skip(if: <value>)` / `@include(if: <value>)`.
pub fn directive(name: &str, if_value: InputValue) -> Directive {
    Directive {
        name: name.to_owned(),
        arguments: vec![arg("if", if_value)],
        location: Location::default(),
    }
}

pub fn query_doc(selection_set: Vec<Selection>) -> Document {
    operation_doc(OperationType::Query, selection_set, Vec::new())
}

pub fn query_doc_with_vars(
    selection_set: Vec<Selection>,
    variable_definitions: Vec<VariableDefinition>,
) -> Document {
    operation_doc(OperationType::Query, selection_set, variable_definitions)
}

pub fn mutation_doc(selection_set: Vec<Selection>) -> Document {
    operation_doc(OperationType::Mutation, selection_set, Vec::new())
}

fn operation_doc(
    operation_type: OperationType,
    selection_set: Vec<Selection>,
    variable_definitions: Vec<VariableDefinition>,
) -> Document {
    Document {
        definitions: vec![Definition::Operation(Operation {
            operation_type,
            name: None,
            variable_definitions,
            directives: Vec::new(),
            selection_set,
            location: Location::default(),
        })],
    }
}

pub fn var_def(name: &str, var_type: crate::ast::Type, default_value: Option<InputValue>) -> VariableDefinition {
    VariableDefinition {
        name: name.to_owned(),
        var_type,
        default_value,
        location: Location::default(),
    }
}

pub fn no_vars() -> IndexMap<String, InputValue> {
    IndexMap::new()
}

pub fn vars(pairs: Vec<(&str, InputValue)>) -> IndexMap<String, InputValue> {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}

/// Compiles `document` under `schema`, panicking with the collected
/// errors on failure — the tests that expect a compile error call
/// [`compile`] directly instead.
pub fn must_compile(schema: Arc<Schema>, document: &Document) -> CompiledQuery {
    compile(schema, document, None, None).unwrap_or_else(|errors| {
        panic!("expected compile to succeed, got {errors:?}");
    })
}

pub fn must_compile_with(
    schema: Arc<Schema>,
    document: &Document,
    options: CompileOptions,
) -> CompiledQuery {
    compile(schema, document, None, Some(options)).unwrap_or_else(|errors| {
        panic!("expected compile to succeed, got {errors:?}");
    })
}

pub fn compile_err(schema: Arc<Schema>, document: &Document) -> Vec<CompileError> {
    compile(schema, document, None, None)
        .err()
        .expect("expected compile to fail")
}

/// Compiles and executes in one step, driving a [`Resolved::Pending`]
/// chain to completion when one is present.
pub async fn run(
    schema: Arc<Schema>,
    document: &Document,
    root: Source,
    context: Context,
    raw_variables: &IndexMap<String, InputValue>,
) -> ExecutionOutcome {
    must_compile(schema, document)
        .query(root, context, raw_variables)
        .resolve()
        .await
}

pub fn no_context() -> Context {
    Arc::new(()) as Context
}

/// Builds an input-object literal from name/value pairs, in declaration
/// order, for use in argument and variable-default literals.
pub fn input_object(pairs: Vec<(&str, InputValue)>) -> InputValue {
    let mut obj = Object::new();
    for (k, v) in pairs {
        obj.add_field(k, v);
    }
    InputValue::Object(obj)
}

/// Wraps a runtime [`Value`] as an opaque [`Source`] the way a resolver's
/// return value is handed to completion.
pub fn source_value(value: Value) -> Source {
    Arc::new(value) as Source
}

/// A resolver that ignores its arguments and always returns the same
/// constant string, for fields whose point is the surrounding plumbing
/// (directive gating, path-building) rather than the leaf value itself.
pub fn string_resolver(value: &'static str) -> Resolver {
    Arc::new(move |_args: ResolverArgs| {
        Resolved::ready_ok(source_value(Value::Scalar(Scalar::String(value.to_owned()))))
    })
}

/// A resolver that always completes to `null`, for exercising non-null
/// bubbling.
pub fn null_resolver() -> Resolver {
    Arc::new(|_args: ResolverArgs| Resolved::ready_ok(source_value(Value::Null)))
}

/// Wraps a single query-root object type into a minimal one-type schema.
pub fn schema_single(query: ObjectType) -> Arc<Schema> {
    let name = query.name.clone();
    Arc::new(Schema::new(name, vec![NamedType::Object(query)]))
}
