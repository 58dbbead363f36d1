//! Shared error types for compilation and execution.
//!
//! A `derive_more`-built enum covers the fatal, short-circuiting cases;
//! a field-level error type (`FieldError`) lets resolvers convert their
//! own errors into GraphQL errors via [`IntoFieldError`].

use derive_more::{Display, Error, From};

use crate::value::Value;

/// A `{line, column}` source location, 1-indexed, as carried by a field
/// or directive AST node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// One segment of a response path: either a response key or a list index.
/// Serializes untagged, so a path renders as the source expects:
/// `["pets", 2, "name"]`, not `[{"Field": "pets"}, ...]`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{name}"),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A materialized response path, root first.
pub type Path = Vec<PathSegment>;

/// A single GraphQL-shaped error object: `{ message, locations, path, extensions? }`.
///
/// `Serialize` derives directly off `serde` rather than through the
/// `json-shape` feature's `serde_json::Value` conversion, so a caller who
/// never enables that feature can still hand this straight to any
/// `serde`-based encoder.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct GraphQLError {
    pub message: String,
    pub locations: Vec<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

impl GraphQLError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: Vec::new(),
            path: None,
            extensions: None,
        }
    }

    pub fn at(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn with_path(mut self, path: Path) -> Self {
        self.path = Some(path);
        self
    }

    pub fn with_extensions(mut self, extensions: Value) -> Self {
        self.extensions = Some(extensions);
        self
    }
}

impl std::fmt::Display for GraphQLError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GraphQLError {}

/// An error produced by a field resolver, or by completion logic acting
/// on a resolver's return value. Carries optional `extensions` so
/// resolvers can attach structured diagnostics alongside the message.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldError {
    message: String,
    extensions: Option<Value>,
}

impl FieldError {
    pub fn new(message: impl Into<String>, extensions: Option<Value>) -> Self {
        Self {
            message: message.into(),
            extensions,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn extensions(&self) -> Option<&Value> {
        self.extensions.as_ref()
    }

    pub fn into_graphql_error(self, locations: Vec<Location>, path: Path) -> GraphQLError {
        let mut err = GraphQLError::new(self.message).at(locations).with_path(path);
        if let Some(ext) = self.extensions {
            err = err.with_extensions(ext);
        }
        err
    }
}

impl<T: std::fmt::Display> From<T> for FieldError
where
    T: std::error::Error,
{
    fn from(err: T) -> Self {
        Self::new(err.to_string(), None)
    }
}

/// Conversion seam so a resolver may return any `Display`-able error, or
/// construct a [`FieldError`] directly with extensions attached.
pub trait IntoFieldError {
    fn into_field_error(self) -> FieldError;
}

impl IntoFieldError for FieldError {
    fn into_field_error(self) -> FieldError {
        self
    }
}

impl IntoFieldError for String {
    fn into_field_error(self) -> FieldError {
        FieldError::new(self, None)
    }
}

impl IntoFieldError for &str {
    fn into_field_error(self) -> FieldError {
        FieldError::new(self, None)
    }
}

/// An error recorded by the executor at a specific response path.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionError {
    error: FieldError,
    path: Path,
    locations: Vec<Location>,
}

impl ExecutionError {
    pub fn new(error: FieldError, path: Path, locations: Vec<Location>) -> Self {
        Self {
            error,
            path,
            locations,
        }
    }

    pub fn path(&self) -> &[PathSegment] {
        &self.path
    }

    pub fn into_graphql_error(self) -> GraphQLError {
        self.error.into_graphql_error(self.locations, self.path)
    }
}

/// Per-variable or per-argument coercion failure: carries the dotted path
/// within the offending value (`value.foo[2].bar`).
#[derive(Clone, Debug, Display, Error, PartialEq)]
#[display("{message}")]
pub struct CoercionError {
    pub message: String,
    pub value_path: String,
    pub locations: Vec<Location>,
}

impl CoercionError {
    pub fn new(message: impl Into<String>, value_path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value_path: value_path.into(),
            locations: Vec::new(),
        }
    }

    pub fn at(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn into_graphql_error(self) -> GraphQLError {
        GraphQLError::new(self.message).at(self.locations)
    }
}

/// Errors raised while building the execution plan, before any
/// resolver is ever invoked. Returned as `{ errors }` from `compile()`.
#[derive(Clone, Debug, Display, Error, From, PartialEq)]
pub enum CompileError {
    #[display("Unknown argument \"{name}\" on directive \"@{directive}\".")]
    UnknownDirectiveArgument { directive: String, name: String },

    #[display("Unknown argument \"{name}\" on field \"{field}\".")]
    UnknownArgument { field: String, name: String },

    #[display("Argument \"{name}\" has invalid value: {reason}")]
    InvalidArgumentLiteral { name: String, reason: String },

    #[display("Variable \"${name}\": {reason}")]
    InvalidVariableType { name: String, reason: String },

    #[display("Argument \"{name}\" of required type \"{type_name}\" was not provided.")]
    MissingNonNullArgument { name: String, type_name: String },

    #[display("Unknown type \"{name}\".")]
    UnknownType { name: String },

    #[display("Cannot query field \"{field}\" on type \"{type_name}\".")]
    UnknownField { type_name: String, field: String },

    #[display(
        "Either the type \"{type_name}\" must provide \"isTypeOf\" on each of its \
         implementations, or the abstract type must provide a \"resolveType\" function."
    )]
    MissingTypeResolver { type_name: String },

    #[display("No operation provided")]
    NoOperationProvided,

    #[display("Multiple operations provided")]
    MultipleOperationsProvided,

    #[display("Unknown operation name \"{name}\"")]
    UnknownOperationName { name: String },

    #[display("{_0}")]
    Coercion(#[error(source)] CoercionError),

    #[display("customJSONSerializer may not be set to `true`")]
    InvalidJsonSerializerOption,
}

impl CompileError {
    pub fn into_graphql_error(self) -> GraphQLError {
        match self {
            Self::Coercion(c) => c.into_graphql_error(),
            other => GraphQLError::new(other.to_string()),
        }
    }
}
