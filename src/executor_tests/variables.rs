//! Variable coercion: representability rules for the built-in scalars,
//! default-value application, non-null enforcement, and recursive
//! input-object coercion.

use indexmap::IndexMap;

use crate::ast::Type;
use crate::compile::variables::coerce_variable_values;
use crate::schema::{InputFieldDefinition, InputObjectType, NamedType, ObjectType, Schema};
use crate::value::{InputValue, Scalar};

use super::support::{input_object, schema_single, var_def};

fn schema_with_test_input_object() -> std::sync::Arc<Schema> {
    let test_input_object = InputObjectType::new(
        "TestInputObject",
        vec![
            InputFieldDefinition::new("a", crate::schema::TypeRef::named("String")),
            InputFieldDefinition::new("b", crate::schema::TypeRef::named("Int")),
            InputFieldDefinition::new("c", crate::schema::TypeRef::non_null(crate::schema::TypeRef::named("Boolean"))),
        ],
    );
    let query = ObjectType::new("Query");
    std::sync::Arc::new(Schema::new(
        "Query",
        vec![NamedType::Object(query), NamedType::InputObject(test_input_object)],
    ))
}

fn named(name: &str) -> Type {
    Type::Named(name.to_owned())
}

fn non_null(t: Type) -> Type {
    Type::NonNull(Box::new(t))
}

#[test]
fn input_object_non_null_field_explicit_null_is_a_coercion_error() {
    let schema = schema_with_test_input_object();
    let defs = vec![var_def("input", named("TestInputObject"), None)];
    let mut raw = IndexMap::new();
    raw.insert(
        "input".to_owned(),
        input_object(vec![
            ("a", InputValue::Scalar(Scalar::String("ok".to_owned()))),
            ("c", InputValue::Null),
        ]),
    );

    let errors = coerce_variable_values(&schema, &defs, &raw).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("not to be null"), "{}", errors[0].message);
}

#[test]
fn input_object_missing_non_null_field_is_a_coercion_error() {
    let schema = schema_with_test_input_object();
    let defs = vec![var_def("input", named("TestInputObject"), None)];
    let mut raw = IndexMap::new();
    raw.insert(
        "input".to_owned(),
        input_object(vec![("a", InputValue::Scalar(Scalar::String("ok".to_owned())))]),
    );

    let errors = coerce_variable_values(&schema, &defs, &raw).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("required type"), "{}", errors[0].message);
}

#[test]
fn int_rejects_a_float_value() {
    let schema = schema_single(ObjectType::new("Query"));
    let defs = vec![var_def("n", named("Int"), None)];
    let mut raw = IndexMap::new();
    raw.insert("n".to_owned(), InputValue::Scalar(Scalar::Float(1.5)));

    let errors = coerce_variable_values(&schema, &defs, &raw).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("Int"));
}

#[test]
fn float_accepts_int_to_float_coercion() {
    let schema = schema_single(ObjectType::new("Query"));
    let defs = vec![var_def("n", named("Float"), None)];
    let mut raw = IndexMap::new();
    raw.insert("n".to_owned(), InputValue::Scalar(Scalar::Int(4)));

    let coerced = coerce_variable_values(&schema, &defs, &raw).unwrap();
    assert_eq!(coerced.get("n"), Some(&crate::value::Value::Scalar(Scalar::Float(4.0))));
}

#[test]
fn boolean_rejects_non_boolean_value() {
    let schema = schema_single(ObjectType::new("Query"));
    let defs = vec![var_def("flag", named("Boolean"), None)];
    let mut raw = IndexMap::new();
    raw.insert("flag".to_owned(), InputValue::Scalar(Scalar::String("true".to_owned())));

    let errors = coerce_variable_values(&schema, &defs, &raw).unwrap_err();
    assert_eq!(errors.len(), 1);
}

#[test]
fn id_accepts_either_string_or_int() {
    let schema = schema_single(ObjectType::new("Query"));
    let defs = vec![
        var_def("byString", named("ID"), None),
        var_def("byInt", named("ID"), None),
    ];
    let mut raw = IndexMap::new();
    raw.insert("byString".to_owned(), InputValue::Scalar(Scalar::String("abc".to_owned())));
    raw.insert("byInt".to_owned(), InputValue::Scalar(Scalar::Int(42)));

    let coerced = coerce_variable_values(&schema, &defs, &raw).unwrap();
    assert_eq!(coerced.get("byString"), Some(&crate::value::Value::Scalar(Scalar::String("abc".to_owned()))));
    assert_eq!(coerced.get("byInt"), Some(&crate::value::Value::Scalar(Scalar::String("42".to_owned()))));
}

#[test]
fn declared_default_applies_when_no_value_provided() {
    let schema = schema_single(ObjectType::new("Query"));
    let defs = vec![var_def(
        "greeting",
        named("String"),
        Some(InputValue::Scalar(Scalar::String("hello".to_owned()))),
    )];
    let raw = IndexMap::new();

    let coerced = coerce_variable_values(&schema, &defs, &raw).unwrap();
    assert_eq!(coerced.get("greeting"), Some(&crate::value::Value::Scalar(Scalar::String("hello".to_owned()))));
}

#[test]
fn missing_non_null_variable_without_default_is_a_coercion_error() {
    let schema = schema_single(ObjectType::new("Query"));
    let defs = vec![var_def("requiredFlag", non_null(named("Boolean")), None)];
    let raw = IndexMap::new();

    let errors = coerce_variable_values(&schema, &defs, &raw).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("was not provided"));
}
