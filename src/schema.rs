//! The schema data model: an immutable, data-driven schema value. Type
//! definitions carry their fields, arguments, default values, and
//! resolver hooks (`resolve`, `isTypeOf`, `resolveType`, scalar
//! `serialize`/`parseValue`/`parseLiteral`) directly as data.
//!
//! Schema *construction* — a builder DSL, derive macros, an introspection
//! schema synthesizer — is out of scope; callers assemble a [`Schema`]
//! value directly (or an external builder does, out of scope here). The
//! schema is a plain runtime value rather than one derived from Rust types
//! via traits or derive macros, so resolvers can be attached dynamically.

use std::any::Any;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::error::FieldError;
use crate::execute::resolve_info::ResolveInfo;
use crate::value::{InputValue, Object, Value};

/// An opaque application value flowing between a resolver and its
/// children: the query root, a resolved parent object, or a list
/// element. Resolvers downcast it to whatever concrete type their
/// application uses; the compiler and executor never inspect it except
/// to hand it to the next hook.
pub type Source = Arc<dyn Any + Send + Sync>;

/// The opaque request-scoped context threaded through every resolver
/// call: `(source, args, context, info) -> value`.
pub type Context = Arc<dyn Any + Send + Sync>;

pub fn source_downcast_ref<T: 'static>(source: &Source) -> Option<&T> {
    source.downcast_ref::<T>()
}

pub fn context_downcast_ref<T: 'static>(context: &Context) -> Option<&T> {
    context.downcast_ref::<T>()
}

/// The return of a resolver, scalar `serialize`, or completion step that
/// may suspend: either already available, or a boxed future the executor
/// registers a continuation on.
pub enum Resolved<T> {
    Ready(Result<T, FieldError>),
    Pending(BoxFuture<'static, Result<T, FieldError>>),
}

impl<T> Resolved<T> {
    pub fn ready_ok(value: T) -> Self {
        Self::Ready(Ok(value))
    }

    pub fn ready_err(error: FieldError) -> Self {
        Self::Ready(Err(error))
    }
}

/// Arguments passed to a field resolver at invocation time: the parent
/// [`Source`], the assembled argument map (already non-null-checked), the
/// request [`Context`], and the lazily-built [`ResolveInfo`].
pub struct ResolverArgs {
    pub source: Source,
    pub arguments: Object<Value>,
    pub context: Context,
    pub info: Arc<ResolveInfo>,
}

pub type Resolver = Arc<dyn Fn(ResolverArgs) -> Resolved<Source> + Send + Sync>;

/// `Object isTypeOf: (value, context, info) → boolean`. Treated as
/// synchronous only — see DESIGN.md's note on the `isTypeOf`
/// pending-boolean case.
pub type IsTypeOf = Arc<dyn Fn(&Source, &Context) -> bool + Send + Sync>;

/// `Abstract resolveType: (value, context, info) → type-name | null`.
pub type ResolveType = Arc<dyn Fn(&Source, &Context) -> Option<String> + Send + Sync>;

pub type Serialize = Arc<dyn Fn(&Source) -> Result<Value, FieldError> + Send + Sync>;
pub type ParseValue = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;
pub type ParseLiteral = Arc<dyn Fn(&InputValue) -> Result<Value, String> + Send + Sync>;

/// A type reference as it appears on a field, argument, or input field:
/// named, list-wrapped, or non-null-wrapped.
#[derive(Clone, Debug)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// The type with one non-null wrapper stripped, if present.
    pub fn unwrap_non_null(&self) -> &TypeRef {
        match self {
            Self::NonNull(inner) => inner,
            other => other,
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(n) => write!(f, "{n}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[derive(Clone)]
pub struct Argument {
    pub name: String,
    pub arg_type: TypeRef,
    pub default_value: Option<InputValue>,
    pub description: Option<String>,
}

impl Argument {
    pub fn new(name: impl Into<String>, arg_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            arg_type,
            default_value: None,
            description: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: InputValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[derive(Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub field_type: TypeRef,
    pub arguments: IndexMap<String, Argument>,
    /// `None` falls back to the default property-access resolver (looks
    /// up `name` on a [`Source`] that downcasts to `Object<Source>`).
    pub resolve: Option<Resolver>,
    pub deprecation_reason: Option<String>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            field_type,
            arguments: IndexMap::new(),
            resolve: None,
            deprecation_reason: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn argument(mut self, argument: Argument) -> Self {
        self.arguments.insert(argument.name.clone(), argument);
        self
    }

    pub fn resolve(mut self, resolve: Resolver) -> Self {
        self.resolve = Some(resolve);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }
}

/// The built-in property-access resolver used for fields without a
/// `resolve` hook: downcasts the parent `Source` to `Object<Source>` and
/// looks up the field name, returning `Value::Null`-equivalent (here,
/// an absent source) when the map or key is missing.
pub fn default_property_resolver(name: &str, source: &Source) -> Resolved<Source> {
    match source.downcast_ref::<Object<Source>>() {
        Some(obj) => match obj.get_field_value(name) {
            Some(value) => Resolved::ready_ok(Arc::clone(value)),
            None => Resolved::ready_ok(Arc::new(()) as Source),
        },
        None => Resolved::ready_ok(Arc::new(()) as Source),
    }
}

#[derive(Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    pub interfaces: Vec<String>,
    pub is_type_of: Option<IsTypeOf>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            is_type_of: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn is_type_of(mut self, hook: IsTypeOf) -> Self {
        self.is_type_of = Some(hook);
        self
    }
}

#[derive(Clone)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDefinition>,
    pub resolve_type: Option<ResolveType>,
}

impl InterfaceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
            resolve_type: None,
        }
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    pub fn resolve_type(mut self, hook: ResolveType) -> Self {
        self.resolve_type = Some(hook);
        self
    }
}

#[derive(Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub possible_types: Vec<String>,
    pub resolve_type: Option<ResolveType>,
}

impl UnionType {
    pub fn new(name: impl Into<String>, possible_types: Vec<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            possible_types,
            resolve_type: None,
        }
    }

    pub fn resolve_type(mut self, hook: ResolveType) -> Self {
        self.resolve_type = Some(hook);
        self
    }
}

#[derive(Clone)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
}

impl EnumValueDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            deprecation_reason: None,
        }
    }
}

#[derive(Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, EnumValueDefinition>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: Vec<EnumValueDefinition>) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: values.into_iter().map(|v| (v.name.clone(), v)).collect(),
        }
    }
}

#[derive(Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub serialize: Serialize,
    pub parse_value: ParseValue,
    pub parse_literal: ParseLiteral,
}

#[derive(Clone)]
pub struct InputFieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub field_type: TypeRef,
    pub default_value: Option<InputValue>,
}

impl InputFieldDefinition {
    pub fn new(name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            field_type,
            default_value: None,
        }
    }

    pub fn default_value(mut self, value: InputValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

#[derive(Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputFieldDefinition>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>, fields: Vec<InputFieldDefinition>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: fields.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }
}

#[derive(Clone)]
pub enum NamedType {
    Scalar(ScalarType),
    Enum(EnumType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    InputObject(InputObjectType),
}

impl NamedType {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(t) => &t.name,
            Self::Enum(t) => &t.name,
            Self::Object(t) => &t.name,
            Self::Interface(t) => &t.name,
            Self::Union(t) => &t.name,
            Self::InputObject(t) => &t.name,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Object(_) | Self::Interface(_) | Self::Union(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, Self::Interface(_) | Self::Union(_))
    }

    pub fn is_input_type(&self) -> bool {
        matches!(self, Self::Scalar(_) | Self::Enum(_) | Self::InputObject(_))
    }

    pub fn fields(&self) -> Option<&IndexMap<String, FieldDefinition>> {
        match self {
            Self::Object(t) => Some(&t.fields),
            Self::Interface(t) => Some(&t.fields),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub arguments: IndexMap<String, Argument>,
}

/// The `@skip`/`@include` directive definitions every schema carries
/// implicitly.
pub fn builtin_directives() -> IndexMap<String, DirectiveDefinition> {
    let mut directives = IndexMap::new();
    for name in ["skip", "include"] {
        let mut arguments = IndexMap::new();
        arguments.insert(
            "if".to_owned(),
            Argument::new("if", TypeRef::non_null(TypeRef::named("Boolean"))),
        );
        directives.insert(
            name.to_owned(),
            DirectiveDefinition {
                name: name.to_owned(),
                arguments,
            },
        );
    }
    directives
}

/// The immutable schema value the compiler walks. Never mutated by the
/// compiler.
#[derive(Clone)]
pub struct Schema {
    pub query_type_name: String,
    pub mutation_type_name: Option<String>,
    pub subscription_type_name: Option<String>,
    pub types: IndexMap<String, NamedType>,
    pub directives: IndexMap<String, DirectiveDefinition>,
}

impl Schema {
    pub fn new(query_type_name: impl Into<String>, types: Vec<NamedType>) -> Self {
        Self {
            query_type_name: query_type_name.into(),
            mutation_type_name: None,
            subscription_type_name: None,
            types: types.into_iter().map(|t| (t.name().to_owned(), t)).collect(),
            directives: builtin_directives(),
        }
    }

    pub fn with_mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation_type_name = Some(name.into());
        self
    }

    pub fn with_subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription_type_name = Some(name.into());
        self
    }

    pub fn type_by_name(&self, name: &str) -> Option<&NamedType> {
        self.types.get(name)
    }

    pub fn query_type(&self) -> &ObjectType {
        match self.type_by_name(&self.query_type_name) {
            Some(NamedType::Object(t)) => t,
            _ => panic!("schema query type must be an object type"),
        }
    }

    /// Whether `object_type_name` satisfies the type condition
    /// `condition_name` — same type, or the object implements the named
    /// interface, or belongs to the named union.
    pub fn type_condition_applies(&self, condition_name: &str, object_type_name: &str) -> bool {
        if condition_name == object_type_name {
            return true;
        }
        match self.type_by_name(condition_name) {
            Some(NamedType::Interface(_)) => self.object_implements(object_type_name, condition_name),
            Some(NamedType::Union(u)) => u.possible_types.iter().any(|t| t == object_type_name),
            _ => false,
        }
    }

    fn object_implements(&self, object_type_name: &str, interface_name: &str) -> bool {
        matches!(
            self.type_by_name(object_type_name),
            Some(NamedType::Object(o)) if o.interfaces.iter().any(|i| i == interface_name)
        )
    }

    /// All concrete object type names that could satisfy an abstract type.
    pub fn possible_types(&self, abstract_type_name: &str) -> Vec<String> {
        match self.type_by_name(abstract_type_name) {
            Some(NamedType::Union(u)) => u.possible_types.clone(),
            Some(NamedType::Interface(_)) => self
                .types
                .values()
                .filter_map(|t| match t {
                    NamedType::Object(o) if o.interfaces.iter().any(|i| i == abstract_type_name) => {
                        Some(o.name.clone())
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
