//! `@skip`/`@include` directive gating: literal conditions, runtime
//! variable-bound conditions, and the compile-time errors a malformed
//! directive produces.

use std::sync::Arc;

use super::support::{
    aliased, compile_err, directive, leaf, no_context, no_vars, query_doc, query_doc_with_vars,
    run, schema_single, var_def, vars,
};
use crate::ast::{Definition, Fragment, Selection, Type};
use crate::schema::{FieldDefinition, ObjectType, TypeRef};
use crate::schema::Source;
use crate::value::{InputValue, Scalar, Value};

fn test_schema() -> Arc<crate::schema::Schema> {
    let query = ObjectType::new("Query")
        .field(
            FieldDefinition::new("a", TypeRef::named("String"))
                .resolve(super::support::string_resolver("a")),
        )
        .field(
            FieldDefinition::new("b", TypeRef::named("String"))
                .resolve(super::support::string_resolver("b")),
        );
    schema_single(query)
}

fn with_directive(name: &str, directive_name: &str, if_value: InputValue) -> Selection {
    super::support::with_directives(leaf(name), vec![directive(directive_name, if_value)])
}

#[tokio::test]
async fn skip_true_omits_field() {
    let doc = query_doc(vec![
        leaf("a"),
        with_directive("b", "skip", InputValue::Scalar(Scalar::Boolean(true))),
    ]);
    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    assert_eq!(outcome.errors, []);
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("a"), Some(&Value::Scalar(Scalar::String("a".into()))));
    assert_eq!(obj.get_field_value("b"), None);
}

#[tokio::test]
async fn skip_false_keeps_field() {
    let doc = query_doc(vec![
        leaf("a"),
        with_directive("b", "skip", InputValue::Scalar(Scalar::Boolean(false))),
    ]);
    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    assert_eq!(outcome.errors, []);
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("b"), Some(&Value::Scalar(Scalar::String("b".into()))));
}

#[tokio::test]
async fn include_false_omits_field() {
    let doc = query_doc(vec![
        leaf("a"),
        with_directive("b", "include", InputValue::Scalar(Scalar::Boolean(false))),
    ]);
    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    assert_eq!(outcome.errors, []);
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("b"), None);
}

#[tokio::test]
async fn include_true_keeps_field() {
    let doc = query_doc(vec![
        leaf("a"),
        with_directive("b", "include", InputValue::Scalar(Scalar::Boolean(true))),
    ]);
    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    assert_eq!(outcome.errors, []);
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("b"), Some(&Value::Scalar(Scalar::String("b".into()))));
}

/// `@skip(if:true)` takes precedence over an `@include` on the same
/// selection: skip is checked first.
#[tokio::test]
async fn skip_wins_over_include() {
    let mut b = leaf("b");
    b = super::support::with_directives(
        b,
        vec![
            directive("skip", InputValue::Scalar(Scalar::Boolean(true))),
            directive("include", InputValue::Scalar(Scalar::Boolean(true))),
        ],
    );
    let doc = query_doc(vec![leaf("a"), b]);
    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("b"), None);
}

#[tokio::test]
async fn named_fragment_spread_gating() {
    let mut doc = query_doc(vec![leaf("a"), {
        let spread = crate::ast::FragmentSpread {
            name: "Frag".to_owned(),
            directives: vec![directive("include", InputValue::Scalar(Scalar::Boolean(false)))],
            location: Default::default(),
        };
        Selection::FragmentSpread(spread)
    }]);
    doc.definitions.push(Definition::Fragment(Fragment {
        name: "Frag".to_owned(),
        type_condition: "Query".to_owned(),
        directives: Vec::new(),
        selection_set: vec![leaf("b")],
        location: Default::default(),
    }));

    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    assert_eq!(outcome.errors, []);
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("a"), Some(&Value::Scalar(Scalar::String("a".into()))));
    assert_eq!(obj.get_field_value("b"), None);
}

#[tokio::test]
async fn inline_fragment_gating() {
    let inline = crate::ast::InlineFragment {
        type_condition: Some("Query".to_owned()),
        directives: vec![directive("skip", InputValue::Scalar(Scalar::Boolean(true)))],
        selection_set: vec![leaf("b")],
        location: Default::default(),
    };
    let doc = query_doc(vec![leaf("a"), Selection::InlineFragment(inline)]);
    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("b"), None);
}

/// A `@skip(if: $var)` whose value is only known at invocation time is
/// lowered to a runtime check, since the variable's value isn't
/// resolvable at compile time.
#[tokio::test]
async fn variable_bound_skip_true_at_runtime() {
    let doc = query_doc_with_vars(
        vec![leaf("a"), with_directive("b", "skip", InputValue::Variable("skipB".to_owned()))],
        vec![var_def("skipB", Type::NonNull(Box::new(Type::Named("Boolean".to_owned()))), None)],
    );
    let outcome = run(
        test_schema(),
        &doc,
        Arc::new(()) as Source,
        no_context(),
        &vars(vec![("skipB", InputValue::Scalar(Scalar::Boolean(true)))]),
    )
    .await;
    assert_eq!(outcome.errors, []);
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("b"), None);
}

#[tokio::test]
async fn variable_bound_skip_false_at_runtime() {
    let doc = query_doc_with_vars(
        vec![leaf("a"), with_directive("b", "skip", InputValue::Variable("skipB".to_owned()))],
        vec![var_def("skipB", Type::NonNull(Box::new(Type::Named("Boolean".to_owned()))), None)],
    );
    let outcome = run(
        test_schema(),
        &doc,
        Arc::new(()) as Source,
        no_context(),
        &vars(vec![("skipB", InputValue::Scalar(Scalar::Boolean(false)))]),
    )
    .await;
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("b"), Some(&Value::Scalar(Scalar::String("b".into()))));
}

#[tokio::test]
async fn alias_survives_directive_gating() {
    let doc = query_doc(vec![aliased(
        "x",
        "a",
        Vec::new(),
    )]);
    let outcome = run(test_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;
    let obj = outcome.data.as_object().unwrap();
    assert_eq!(obj.get_field_value("x"), Some(&Value::Scalar(Scalar::String("a".into()))));
}

#[test]
fn missing_if_argument_is_a_compile_error() {
    let missing_if = Selection::Field(crate::ast::Field {
        alias: None,
        name: "b".to_owned(),
        arguments: Vec::new(),
        directives: vec![crate::ast::Directive {
            name: "skip".to_owned(),
            arguments: Vec::new(),
            location: Default::default(),
        }],
        selection_set: Vec::new(),
        location: Default::default(),
    });
    let doc = query_doc(vec![leaf("a"), missing_if]);
    let errors = compile_err(test_schema(), &doc);
    assert!(matches!(
        errors[0],
        crate::error::CompileError::UnknownDirectiveArgument { .. }
    ));
}

#[test]
fn non_boolean_if_value_is_a_compile_error() {
    let bad = with_directive("b", "skip", InputValue::Scalar(Scalar::String("yes".to_owned())));
    let doc = query_doc(vec![leaf("a"), bad]);
    let errors = compile_err(test_schema(), &doc);
    assert!(matches!(
        errors[0],
        crate::error::CompileError::InvalidArgumentLiteral { .. }
    ));
}
