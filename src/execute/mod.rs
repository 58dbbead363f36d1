//! The Executor — the runtime counterpart to the compiled plan.
//!
//! Walks a [`CompiledQuery`]'s plan against a concrete root value,
//! driving each field's resolver and completing its return value against
//! the plan's precomputed [`Completion`] strategy. Two concerns make this
//! more than a tree walk:
//!
//! - **Non-null bubbling.** A field error is recorded exactly once, at
//!   the nearest enclosing nullable boundary (the nearest ancestor whose
//!   own completion is not [`Completion::NonNull`]). A non-null field
//!   that fails does not record its own error; it propagates the error
//!   to its parent, which either absorbs it (nulling just that one key)
//!   or, if the parent is itself non-null, propagates further still.
//! - **Synchronous fast path.** Every resolver may return
//!   [`crate::schema::Resolved::Pending`], but most applications resolve
//!   everything synchronously. Polling the assembled future once with a
//!   no-op waker lets [`query`] return a completed result immediately
//!   without ever exposing a `BoxFuture` to a caller who doesn't need one —
//!   zero scheduler overhead when fully synchronous.

pub mod resolve_info;

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::task::{Context as TaskContext, Poll};

use fnv::FnvHashMap;
use futures::future::{join_all, BoxFuture};
use futures::task::noop_waker;
use indexmap::IndexMap;

use crate::ast::{evaluate_inclusion, Field, Fragment, Inclusion, Operation};
use crate::compile::CompiledQuery;
use crate::error::{ExecutionError, FieldError, GraphQLError, PathSegment};
use crate::schema::{Context, ResolverArgs, Resolved, Schema, Source};
use crate::value::{Object, Scalar, Value};

use self::resolve_info::{FieldPath, ResolveInfo};
use crate::compile::plan::{ChildSelection, Completion, PlanNode};

/// The completed `{ data, errors, extensions }` envelope that is the
/// execution result.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub data: Value,
    pub errors: Vec<GraphQLError>,
    pub extensions: Option<Value>,
}

impl ExecutionOutcome {
    /// Renders the envelope as a single response [`Value`], suitable for
    /// [`CompiledQuery::stringify`].
    pub fn to_response_value(&self) -> Value {
        let mut out = Object::with_capacity(3);
        out.add_field("data", self.data.clone());
        if !self.errors.is_empty() {
            out.add_field(
                "errors",
                Value::List(self.errors.iter().map(error_to_value).collect()),
            );
        }
        if let Some(extensions) = &self.extensions {
            out.add_field("extensions", extensions.clone());
        }
        Value::Object(out)
    }
}

fn error_to_value(error: &GraphQLError) -> Value {
    let mut out = Object::with_capacity(4);
    out.add_field("message", Value::Scalar(Scalar::String(error.message.clone())));
    out.add_field(
        "locations",
        Value::List(
            error
                .locations
                .iter()
                .map(|loc| {
                    let mut l = Object::with_capacity(2);
                    l.add_field("line", Value::Scalar(Scalar::Int(loc.line as i32)));
                    l.add_field("column", Value::Scalar(Scalar::Int(loc.column as i32)));
                    Value::Object(l)
                })
                .collect(),
        ),
    );
    if let Some(path) = &error.path {
        out.add_field("path", Value::List(path.iter().map(path_segment_to_value).collect()));
    }
    if let Some(extensions) = &error.extensions {
        out.add_field("extensions", extensions.clone());
    }
    Value::Object(out)
}

fn path_segment_to_value(segment: &PathSegment) -> Value {
    match segment {
        PathSegment::Field(name) => Value::Scalar(Scalar::String(name.clone())),
        PathSegment::Index(i) => Value::Scalar(Scalar::Int(*i as i32)),
    }
}

/// Either a result ready synchronously, or the still-pending future the
/// caller's own runtime must drive to completion.
pub enum QueryOutcome<'a> {
    Ready(ExecutionOutcome),
    Pending(BoxFuture<'a, ExecutionOutcome>),
}

impl<'a> QueryOutcome<'a> {
    /// Drives a [`Pending`](Self::Pending) outcome to completion, for
    /// callers that already hold an executor and don't care about the
    /// synchronous fast path.
    pub async fn resolve(self) -> ExecutionOutcome {
        match self {
            Self::Ready(outcome) => outcome,
            Self::Pending(fut) => fut.await,
        }
    }
}

struct ExecState {
    schema: Arc<Schema>,
    fragments: Arc<FnvHashMap<String, Fragment>>,
    operation: Arc<Operation>,
    variables: Arc<IndexMap<String, Value>>,
    /// The operation's overall root value, constant throughout execution
    /// — distinct from a field's immediate parent source.
    root_value: Source,
    context: Context,
    errors: Mutex<Vec<GraphQLError>>,
}

impl ExecState {
    /// Absorbs a bubbled [`ExecutionError`], converting it to the public
    /// [`GraphQLError`] shape at the point it's recorded — the same
    /// boundary [`crate::error::CompileError`] converts at.
    fn push_error(&self, error: ExecutionError) {
        self.errors.lock().unwrap().push(error.into_graphql_error());
    }
}

/// Re-evaluates `@skip`/`@include` at runtime against the coerced
/// variable values, for field-node occurrences whose gating couldn't be
/// decided at compile time: compile-time collection never sees runtime
/// variables, so any variable-bound condition reaches here as
/// [`Inclusion::IfVariableTrue`]/[`Inclusion::IfVariableFalse`].
/// Included if *any* merged occurrence says to include it.
fn node_is_included(field_nodes: &[Arc<Field>], variables: &IndexMap<String, Value>) -> bool {
    if field_nodes.is_empty() {
        // Synthetic nodes (e.g. the `__schema` probe's own children)
        // carry no AST occurrence and are never conditionally gated.
        return true;
    }
    for field in field_nodes {
        let mut known = std::collections::HashMap::new();
        for directive in &field.directives {
            if directive.name != "skip" && directive.name != "include" {
                continue;
            }
            for arg in &directive.arguments {
                if arg.name != "if" {
                    continue;
                }
                if let Some(var_name) = arg.value.as_variable_name() {
                    if let Some(Value::Scalar(Scalar::Boolean(b))) = variables.get(var_name) {
                        known.insert(var_name.to_owned(), *b);
                    }
                }
            }
        }
        // A malformed directive here would already have failed compilation.
        match evaluate_inclusion(&field.directives, &known) {
            Ok(Inclusion::Never) => continue,
            _ => return true,
        }
    }
    false
}

fn list_items(source: &Source) -> Option<Vec<Result<Source, FieldError>>> {
    if let Some(items) = source.downcast_ref::<Vec<Result<Source, FieldError>>>() {
        return Some(items.clone());
    }
    if let Some(items) = source.downcast_ref::<Vec<Source>>() {
        return Some(items.iter().cloned().map(Ok).collect());
    }
    None
}

/// The pure completion step: given the field's completion
/// strategy and its resolver's outcome, produces either the completed
/// value or the [`ExecutionError`] that must bubble to the nearest
/// nullable ancestor. Recurses through lists, non-null wrappers, objects,
/// and abstract types; only object/abstract completion ever invokes
/// further resolvers (one per child field), done in [`complete_selection`].
fn complete_value<'a>(
    completion: &'a Completion,
    resolved: Result<Source, FieldError>,
    path: Arc<FieldPath>,
    locations: &'a [crate::error::Location],
    field_name: &'a str,
    parent_type: &'a str,
    state: Arc<ExecState>,
) -> BoxFuture<'a, Result<Value, ExecutionError>> {
    Box::pin(async move {
        if let Completion::NonNull(inner) = completion {
            return match complete_value(
                inner,
                resolved,
                Arc::clone(&path),
                locations,
                field_name,
                parent_type,
                state,
            )
            .await
            {
                Ok(Value::Null) => Err(ExecutionError::new(
                    FieldError::new(
                        format!("Cannot return null for non-nullable field {parent_type}.{field_name}."),
                        None,
                    ),
                    path.to_vec(),
                    locations.to_vec(),
                )),
                other => other,
            };
        }

        let source = match resolved {
            Ok(source) => source,
            Err(field_error) => {
                return Err(ExecutionError::new(field_error, path.to_vec(), locations.to_vec()));
            }
        };

        match completion {
            Completion::NonNull(_) => unreachable!("handled above"),
            Completion::Scalar { serialize, type_name } => match serialize(&source) {
                Ok(value) => Ok(value),
                Err(field_error) => Err(ExecutionError::new(
                    FieldError::new(
                        format!(
                            "Expected a value of type '{type_name}' but received: {}",
                            field_error.message()
                        ),
                        field_error.extensions().cloned(),
                    ),
                    path.to_vec(),
                    locations.to_vec(),
                )),
            },
            Completion::Enum { serialize, type_name } => match serialize(&source) {
                Ok(value) => Ok(value),
                Err(field_error) => Err(ExecutionError::new(
                    FieldError::new(
                        format!(
                            "Expected a value of type '{type_name}' but received: {}",
                            field_error.message()
                        ),
                        field_error.extensions().cloned(),
                    ),
                    path.to_vec(),
                    locations.to_vec(),
                )),
            },
            Completion::List(inner) => {
                let items = match list_items(&source) {
                    Some(items) => items,
                    None => {
                        return Err(ExecutionError::new(
                            FieldError::new(
                                format!(
                                    "Expected Iterable, but did not find one for field {parent_type}.{field_name}."
                                ),
                                None,
                            ),
                            path.to_vec(),
                            locations.to_vec(),
                        ));
                    }
                };
                let item_count = items.len();
                let futures = items.into_iter().enumerate().map(|(index, item)| {
                    let item_path = path.child(PathSegment::Index(index));
                    complete_value(
                        inner,
                        item,
                        item_path,
                        locations,
                        field_name,
                        parent_type,
                        Arc::clone(&state),
                    )
                });
                let results = join_all(futures).await;
                let mut out = Vec::with_capacity(item_count);
                for result in results {
                    match result {
                        Ok(value) => out.push(value),
                        Err(error) => {
                            if matches!(**inner, Completion::NonNull(_)) {
                                return Err(error);
                            }
                            state.push_error(error);
                            out.push(Value::Null);
                        }
                    }
                }
                Ok(Value::List(out))
            }
            Completion::Object(selection) => {
                if matches!(source.downcast_ref::<Value>(), Some(Value::Null)) {
                    return Ok(Value::Null);
                }
                complete_selection(selection, source, path, state, true).await
            }
            Completion::Abstract {
                type_name,
                resolve_type,
                possible,
            } => {
                if matches!(source.downcast_ref::<Value>(), Some(Value::Null)) {
                    return Ok(Value::Null);
                }
                let resolved_name = match resolve_type {
                    Some(resolve_type) => resolve_type(&source, &state.context),
                    None => possible.iter().find_map(|(name, possible_type)| {
                        let is_type_of = possible_type.is_type_of.as_ref()?;
                        is_type_of(&source, &state.context).then(|| name.clone())
                    }),
                };
                match resolved_name.as_ref().and_then(|name| possible.get(name)) {
                    Some(possible_type) => {
                        complete_selection(&possible_type.selection, source, path, state, true).await
                    }
                    None => Err(ExecutionError::new(
                        FieldError::new(
                            format!(
                                "Runtime Object type \"{}\" is not a possible type for \"{type_name}\".",
                                resolved_name.as_deref().unwrap_or("null")
                            ),
                            None,
                        ),
                        path.to_vec(),
                        locations.to_vec(),
                    )),
                }
            }
        }
    })
}

/// Invokes one field's resolver (coercing arguments first) and completes
/// its result.
fn complete_one_field<'a>(
    node: &'a PlanNode,
    parent_source: Source,
    parent_path: Arc<FieldPath>,
    state: Arc<ExecState>,
) -> BoxFuture<'a, Result<Value, ExecutionError>> {
    Box::pin(async move {
        let field_path = parent_path.child(PathSegment::Field(node.response_key.clone()));

        let arguments = match node.arguments.assemble(&state.variables) {
            Ok(arguments) => arguments,
            Err(field_error) => {
                return Err(ExecutionError::new(
                    field_error,
                    field_path.to_vec(),
                    node.locations.clone(),
                ));
            }
        };

        let info = Arc::new(ResolveInfo {
            field_name: node.field_name.clone(),
            field_nodes: node.field_nodes.clone(),
            return_type: node.return_type.clone(),
            parent_type: node.parent_type.clone(),
            path: Arc::clone(&field_path),
            schema: Arc::clone(&state.schema),
            fragments: Arc::clone(&state.fragments),
            root_value: Arc::clone(&state.root_value),
            operation: Arc::clone(&state.operation),
            variable_values: Arc::clone(&state.variables),
        });

        let span = tracing::debug_span!(
            "resolve_field",
            field = %node.field_name,
            response_key = %node.response_key,
            parent_type = %node.parent_type,
        );
        let _entered = span.enter();

        let resolved = (node.resolver)(ResolverArgs {
            source: parent_source,
            arguments,
            context: Arc::clone(&state.context),
            info,
        });
        drop(_entered);

        let source_result = match resolved {
            Resolved::Ready(result) => result,
            Resolved::Pending(fut) => fut.await,
        };

        complete_value(
            &node.completion,
            source_result,
            field_path,
            &node.locations,
            &node.field_name,
            &node.parent_type,
            state,
        )
        .await
    })
}

/// Completes every included child field of one object-shaped source:
/// the query/mutation root, a resolved object, or the selection chosen
/// for an abstract type's concrete type. `concurrent` selects between
/// `join_all`-based concurrency (every nested object and a query's
/// top-level fields) and strict sequential `.await` (a mutation's
/// top-level fields only, which must execute serially).
fn complete_selection<'a>(
    selection: &'a ChildSelection,
    source: Source,
    path: Arc<FieldPath>,
    state: Arc<ExecState>,
    concurrent: bool,
) -> BoxFuture<'a, Result<Value, ExecutionError>> {
    Box::pin(async move {
        let included: Vec<(&str, &PlanNode)> = selection
            .iter()
            .filter(|(_, node)| node_is_included(&node.field_nodes, &state.variables))
            .map(|(key, node)| (key.as_str(), node.as_ref()))
            .collect();

        let mut out = Object::with_capacity(included.len());

        if concurrent {
            let futures = included.iter().map(|(_, node)| {
                complete_one_field(node, Arc::clone(&source), Arc::clone(&path), Arc::clone(&state))
            });
            let results = join_all(futures).await;
            for ((key, node), result) in included.iter().zip(results) {
                match result {
                    Ok(value) => {
                        out.add_field(*key, value);
                    }
                    Err(error) => {
                        if matches!(node.completion, Completion::NonNull(_)) {
                            return Err(error);
                        }
                        state.push_error(error);
                        out.add_field(*key, Value::Null);
                    }
                }
            }
        } else {
            for (key, node) in &included {
                let result =
                    complete_one_field(node, Arc::clone(&source), Arc::clone(&path), Arc::clone(&state))
                        .await;
                match result {
                    Ok(value) => {
                        out.add_field(*key, value);
                    }
                    Err(error) => {
                        if matches!(node.completion, Completion::NonNull(_)) {
                            return Err(error);
                        }
                        state.push_error(error);
                        out.add_field(*key, Value::Null);
                    }
                }
            }
        }

        Ok(Value::Object(out))
    })
}

/// Executes a compiled query against a concrete root value and context.
/// `raw_variables` are coerced against the operation's declared variables
/// first; a coercion failure returns immediately in `{ errors }`, without
/// calling any resolver.
#[tracing::instrument(skip_all, fields(operation = ?compiled.operation_name()))]
pub fn query<'a>(
    compiled: &'a CompiledQuery,
    root_value: Source,
    context: Context,
    raw_variables: &IndexMap<String, crate::value::InputValue>,
) -> QueryOutcome<'a> {
    let variables = match crate::compile::coerce_variables(compiled, raw_variables) {
        Ok(variables) => variables,
        Err(coercion_errors) => {
            let errors = coercion_errors
                .into_iter()
                .map(crate::error::CoercionError::into_graphql_error)
                .collect();
            return QueryOutcome::Ready(ExecutionOutcome {
                data: Value::Null,
                errors,
                extensions: None,
            });
        }
    };

    let state = Arc::new(ExecState {
        schema: Arc::clone(&compiled.schema),
        fragments: Arc::clone(&compiled.fragments),
        operation: Arc::clone(&compiled.operation),
        variables: Arc::new(variables),
        root_value: Arc::clone(&root_value),
        context,
        errors: Mutex::new(Vec::new()),
    });
    let result_state = Arc::clone(&state);
    let root_path = Arc::new(FieldPath::Root);
    let concurrent = !compiled.is_mutation();
    let extensions_hook = compiled.options.extensions_hook.clone();

    let mut future: BoxFuture<'a, ExecutionOutcome> = Box::pin(async move {
        let data = match complete_selection(&compiled.plan, root_value, root_path, state, concurrent).await
        {
            Ok(value) => value,
            Err(error) => {
                result_state.push_error(error);
                Value::Null
            }
        };
        let errors = std::mem::take(&mut *result_state.errors.lock().unwrap());
        let extensions = extensions_hook.map(|hook| hook(&data, &errors));
        ExecutionOutcome { data, errors, extensions }
    });

    let waker = noop_waker();
    let mut cx = TaskContext::from_waker(&waker);
    match future.as_mut().poll(&mut cx) {
        Poll::Ready(outcome) => QueryOutcome::Ready(outcome),
        Poll::Pending => QueryOutcome::Pending(future),
    }
}

impl CompiledQuery {
    /// Executes this compiled query. See [`query`] for the
    /// coercion/error-handling contract.
    pub fn query<'a>(
        &'a self,
        root_value: Source,
        context: Context,
        raw_variables: &IndexMap<String, crate::value::InputValue>,
    ) -> QueryOutcome<'a> {
        query(self, root_value, context, raw_variables)
    }
}
