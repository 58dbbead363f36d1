//! Runtime response [`Value`] and literal/variable [`InputValue`].
//!
//! A concrete `Object` preserves field insertion order, and a `Value` enum
//! carries `Null` / `Scalar` / `List` / `Object` variants. This crate has
//! exactly one scalar representation (`Scalar`), so `Value` stays concrete
//! rather than generic over a scalar type parameter.

use indexmap::IndexMap;
use itertools::Itertools as _;

/// The leaf representation for both response values and input literals.
///
/// `Enum` is kept distinct from `String` even though both serialize to a
/// JSON string, because the variable coercer and argument resolver must
/// tell them apart: enums coerce from a bare name, not a quoted string.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Scalar {
    String(String),
    Int(i32),
    Float(f64),
    Boolean(bool),
    Enum(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Enum(s) => write!(f, "{s}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<i32> for Scalar {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

/// An ordered, name-keyed map of fields, as found inside an object
/// [`Value`] or an object [`InputValue`]. Backed by `indexmap` so field
/// order in responses and literals matches declaration/selection order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct Object<V> {
    fields: IndexMap<String, V>,
}

impl<V> Object<V> {
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Inserts a field, returning the previous value under that key, if any.
    pub fn add_field(&mut self, name: impl Into<String>, value: V) -> Option<V> {
        self.fields.insert(name.into(), value)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get_field_value(&self, name: &str) -> Option<&V> {
        self.fields.get(name)
    }

    pub fn get_field_value_mut(&mut self, name: &str) -> Option<&mut V> {
        self.fields.get_mut(name)
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut V)> {
        self.fields.iter_mut()
    }

    pub fn into_iter(self) -> impl Iterator<Item = (String, V)> {
        self.fields.into_iter()
    }
}

impl<V> FromIterator<(String, V)> for Object<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Serializable value returned from query and field execution. Cannot hold
/// an enum-vs-string distinction at rest the way `InputValue` does — by the
/// time a value has been completed it has already gone through a scalar's
/// `serialize` hook and become a plain JSON-shaped leaf.
/// `Serialize`s untagged to its natural JSON shape regardless of which
/// serializer a caller reaches for — `serde_json`, `ciborium`, etc. The
/// `json-shape` feature's `From<Value> for serde_json::Value` impl below
/// exists separately because the JSON-shape emitter builds
/// `serde_json::Value` trees directly rather than going through
/// `serde::Serialize`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Scalar(Scalar),
    List(Vec<Value>),
    Object(Object<Value>),
}

impl Value {
    pub fn null() -> Self {
        Self::Null
    }

    pub fn list(items: Vec<Self>) -> Self {
        Self::List(items)
    }

    pub fn object(obj: Object<Value>) -> Self {
        Self::Object(obj)
    }

    pub fn scalar(s: impl Into<Scalar>) -> Self {
        Self::Scalar(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_object(&self) -> Option<&Object<Value>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object<Value>> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Scalar(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "[{}]", items.iter().format(", ")),
            Self::Object(obj) => write!(
                f,
                "{{{}}}",
                obj.iter()
                    .format_with(", ", |(k, v), fmt| fmt(&format_args!("\"{k}\": {v}")))
            ),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => Self::Scalar(v.into()),
            None => Self::Null,
        }
    }
}

#[cfg(feature = "json-shape")]
impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Scalar(Scalar::String(s) | Scalar::Enum(s)) => serde_json::Value::String(s),
            Value::Scalar(Scalar::Int(i)) => serde_json::Value::from(i),
            Value::Scalar(Scalar::Float(f)) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Scalar(Scalar::Boolean(b)) => serde_json::Value::Bool(b),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// Literal or variable-supplied input, as found in argument/variable
/// positions in the query document. Unlike [`Value`] it may reference a
/// `Variable` by name, since literal coercion happens before variables
/// are known.
#[derive(Clone, Debug, PartialEq)]
pub enum InputValue {
    Null,
    Scalar(Scalar),
    Variable(String),
    List(Vec<InputValue>),
    Object(Object<InputValue>),
}

impl InputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_variable_name(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// Converts a fully-literal `InputValue` (no embedded `Variable`) into
    /// a runtime [`Value`] verbatim, without going through a scalar's
    /// `parseLiteral` hook. Used by the value inspector and by coercion
    /// code that has already resolved variables into plain scalars.
    pub fn into_value(self) -> Option<Value> {
        Some(match self {
            Self::Null => Value::Null,
            Self::Scalar(s) => Value::Scalar(s),
            Self::Variable(_) => return None,
            Self::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.into_value()?);
                }
                Value::List(out)
            }
            Self::Object(obj) => {
                let mut out = Object::with_capacity(obj.field_count());
                for (k, v) in obj.into_iter() {
                    out.add_field(k, v.into_value()?);
                }
                Value::Object(out)
            }
        })
    }
}

impl From<Scalar> for InputValue {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}
