//! A just-in-time compiler and execution runtime for GraphQL queries.
//!
//! Given an immutable [`Schema`] and a parsed operation [`ast::Document`],
//! [`compile::compile`] produces a reusable [`CompiledQuery`]: a tree-shaped
//! plan with per-field resolver references, argument assemblers, type
//! completers, and response-path builders already precomputed. Calling
//! [`CompiledQuery::query`] against a root value, a context, and raw
//! variable values resolves the query through user-supplied field
//! resolvers and returns a result shaped per the GraphQL specification —
//! non-null bubbling, list handling, abstract-type dispatch, and serial
//! execution of mutation top-level fields included.
//!
//! This crate does not parse queries, validate them against a schema, or
//! speak any wire protocol; it picks up where a validated AST and an
//! assembled schema value already exist. See `README.md` for the
//! compile/execute split this enables.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod ast;
pub mod compile;
pub mod error;
pub mod execute;
mod introspection;
pub mod schema;
pub mod value;

#[cfg(test)]
mod executor_tests;

use std::sync::Arc;

use indexmap::IndexMap;

pub use crate::ast::{
    Definition, Document, Field, Fragment, FragmentSpread, InlineFragment, Operation,
    OperationType, Selection, Type, VariableDefinition,
};
pub use crate::compile::{
    coerce_variables, coerced_variables_from, compile, CompileOptions, CompiledQuery,
};
pub use crate::error::{
    CoercionError, CompileError, ExecutionError, FieldError, GraphQLError, IntoFieldError,
    Location, Path, PathSegment,
};
pub use crate::execute::{query, ExecutionOutcome, QueryOutcome};
pub use crate::schema::{
    default_property_resolver, Context, EnumType, FieldDefinition, InputFieldDefinition,
    InputObjectType, InterfaceType, IsTypeOf, NamedType, ObjectType, ParseLiteral, ParseValue,
    Resolved, Resolver, ResolverArgs, ResolveType, Schema, ScalarType, Serialize, Source, TypeRef,
    UnionType,
};
pub use crate::value::{InputValue, Object, Scalar, Value};

/// Compiles `document` under `schema` and immediately executes it, composing
/// compile and invoke into one call for call sites that don't need to reuse
/// the resulting plan.
///
/// Most applications instead call [`compile`] once per distinct query shape
/// and reuse the resulting [`CompiledQuery`] across many invocations — plans
/// are immutable and shareable across concurrent calls. This wrapper is for
/// call sites that don't need that reuse, e.g. tests and one-off scripts. It
/// is `async` only to drain a pending resolver chain; a fully-synchronous
/// schema still resolves without the executor ever allocating a future.
pub async fn compile_and_query(
    schema: Arc<Schema>,
    document: &Document,
    operation_name: Option<&str>,
    options: Option<CompileOptions>,
    root_value: Source,
    context: Context,
    raw_variables: &IndexMap<String, InputValue>,
) -> Result<ExecutionOutcome, Vec<CompileError>> {
    let compiled = compile(schema, document, operation_name, options)?;
    Ok(compiled
        .query(root_value, context, raw_variables)
        .resolve()
        .await)
}
