//! Compile-time submodules and the top-level compile entry point.

pub mod arguments;
pub mod inspect;
#[cfg(feature = "json-shape")]
pub mod json_shape;
pub mod plan;
pub mod variables;

use std::sync::Arc;

use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::ast::{Document, Fragment, Operation, OperationType};
use crate::error::CompileError;
use crate::schema::{Schema, Serialize};
use crate::value::{InputValue, Value};

use self::plan::{build_operation_plan, ChildSelection};

/// Compile-time configuration surface.
#[derive(Clone, Default)]
pub struct CompileOptions {
    pub(crate) disable_leaf_serialization: bool,
    pub(crate) custom_serializers: IndexMap<String, Serialize>,
    pub(crate) custom_json_serializer: Option<Arc<dyn Fn(&Value) -> String + Send + Sync>>,
    pub(crate) extensions_hook: Option<Arc<dyn Fn(&Value, &[crate::error::GraphQLError]) -> Value + Send + Sync>>,
    pub(crate) debug: bool,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// `disableLeafSerialization` — skip scalar/enum `serialize`; the
    /// resolver's return is trusted as-is.
    pub fn disable_leaf_serialization(mut self, yes: bool) -> Self {
        self.disable_leaf_serialization = yes;
        self
    }

    /// `customSerializers` — overrides a named scalar's schema-provided
    /// `serialize` hook.
    pub fn custom_serializer(mut self, type_name: impl Into<String>, serialize: Serialize) -> Self {
        self.custom_serializers.insert(type_name.into(), serialize);
        self
    }

    /// `customJSONSerializer` — a function receiving the completed result
    /// and producing its serialized form. There is no boolean overload of
    /// this setter, so a bare `true` configuration error is unrepresentable
    /// through this builder; [`CompileError::InvalidJsonSerializerOption`]
    /// is kept for API completeness (see DESIGN.md) but is never
    /// constructed by this setter.
    pub fn custom_json_serializer(
        mut self,
        serializer: Arc<dyn Fn(&Value) -> String + Send + Sync>,
    ) -> Self {
        self.custom_json_serializer = Some(serializer);
        self
    }

    pub fn debug(mut self, yes: bool) -> Self {
        self.debug = yes;
        self
    }

    /// Installs the `extensions` passthrough hook: given the completed
    /// `data` and the accumulated field errors, it produces the
    /// `extensions` entry of the response envelope.
    pub fn extensions_hook(
        mut self,
        hook: Arc<dyn Fn(&Value, &[crate::error::GraphQLError]) -> Value + Send + Sync>,
    ) -> Self {
        self.extensions_hook = Some(hook);
        self
    }
}

/// The reusable, immutable output of [`compile`]. Shareable across
/// concurrent invocations; `query`/execution lives in [`crate::execute`].
pub struct CompiledQuery {
    pub(crate) schema: Arc<Schema>,
    pub(crate) operation: Arc<Operation>,
    pub(crate) fragments: Arc<FnvHashMap<String, Fragment>>,
    pub(crate) plan: ChildSelection,
    pub(crate) serial_mutation_fields: Option<Vec<String>>,
    pub(crate) options: CompileOptions,
    #[cfg(feature = "json-shape")]
    pub(crate) json_shape: Option<json_shape::JsonShape>,
}

impl CompiledQuery {
    /// The named operation this query was compiled for, if any.
    pub fn operation_name(&self) -> Option<&str> {
        self.operation.name.as_deref()
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self.operation.operation_type, OperationType::Mutation)
    }

    /// Top-level field order for a mutation; `None` for a query. The
    /// executor drives these one at a time, in this order.
    pub fn mutation_field_order(&self) -> Option<&[String]> {
        self.serial_mutation_fields.as_deref()
    }

    /// `{ data?, errors?, extensions? }`, serialized per `customJSONSerializer`
    /// when one is configured, falling back to the generic renderer
    /// otherwise — including when the shape can't be described by the
    /// JSON-shape emitter.
    pub fn stringify(&self, result: &Value) -> String {
        if let Some(serializer) = &self.options.custom_json_serializer {
            return serializer(result);
        }
        result.to_string()
    }

    /// The JSON-shape descriptor, if the `json-shape` feature is enabled.
    #[cfg(feature = "json-shape")]
    #[cfg_attr(docsrs, doc(cfg(feature = "json-shape")))]
    pub fn json_shape(&self) -> Option<&json_shape::JsonShape> {
        self.json_shape.as_ref()
    }
}

/// Compiles an operation document under a schema into a reusable,
/// immutable execution plan.
///
/// Validates the document/operation selection, builds a compilation
/// context, and invokes the plan builder. Returns either a
/// [`CompiledQuery`] or the list of compile-time errors that prevented
/// one from being produced.
pub fn compile(
    schema: Arc<Schema>,
    document: &Document,
    operation_name: Option<&str>,
    options: Option<CompileOptions>,
) -> Result<CompiledQuery, Vec<CompileError>> {
    let operation = document
        .get_operation(operation_name)
        .map_err(|e| vec![e])?;
    let options = options.unwrap_or_default();

    // `customJSONSerializer: true` is rejected as a configuration error.
    // `custom_json_serializer` only accepts a function, so that invalid
    // state has no constructor here; `CompileError::InvalidJsonSerializerOption`
    // is kept for API parity (see DESIGN.md).

    let root_type_name = match operation.operation_type {
        OperationType::Query => schema.query_type_name.clone(),
        OperationType::Mutation => match &schema.mutation_type_name {
            Some(name) => name.clone(),
            None => {
                return Err(vec![CompileError::UnknownType {
                    name: "Mutation".to_owned(),
                }]);
            }
        },
        OperationType::Subscription => {
            // Non-goal: subscriptions are not executed by this core.
            return Err(vec![CompileError::UnknownType {
                name: "Subscription".to_owned(),
            }]);
        }
    };

    let fragments_borrowed = document.fragments();
    let plan = build_operation_plan(
        &schema,
        fragments_borrowed.clone(),
        &root_type_name,
        &operation.selection_set,
        &options,
    )
    .map_err(|e| vec![e])?;

    let serial_mutation_fields = matches!(operation.operation_type, OperationType::Mutation)
        .then(|| plan.keys().cloned().collect());

    let fragments_owned: FnvHashMap<String, Fragment> = fragments_borrowed
        .into_iter()
        .map(|(name, fragment)| (name, fragment.clone()))
        .collect();

    #[cfg(feature = "json-shape")]
    let json_shape = Some(json_shape::build_json_shape(&plan));

    Ok(CompiledQuery {
        schema,
        operation: Arc::new(operation.clone()),
        fragments: Arc::new(fragments_owned),
        plan,
        serial_mutation_fields,
        options,
        #[cfg(feature = "json-shape")]
        json_shape,
    })
}

/// Resolves the caller-provided raw variable map against the compiled
/// query's declared variables, ahead of a `query(...)` invocation.
pub fn coerce_variables(
    compiled: &CompiledQuery,
    raw_values: &IndexMap<String, InputValue>,
) -> Result<IndexMap<String, Value>, Vec<crate::error::CoercionError>> {
    variables::coerce_variable_values(
        &compiled.schema,
        &compiled.operation.variable_definitions,
        raw_values,
    )
}

/// Convenience used by tests and callers who already hold coerced
/// [`Value`]s rather than raw [`InputValue`] literals (e.g. values
/// deserialized straight from request JSON via `serde_json`).
pub fn coerced_variables_from(pairs: Vec<(&str, Value)>) -> IndexMap<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
}
