//! Built-in `__schema`/`__type` probes, enum-leaf serialization, and a
//! smoke test that `resolve_field` spans are actually emitted under a
//! real subscriber.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use crate::compile::CompileOptions;
use crate::schema::{
    EnumType, EnumValueDefinition, FieldDefinition, NamedType, ObjectType, Resolved, ResolverArgs,
    Schema, Source, TypeRef,
};
use crate::value::{InputValue, Scalar, Value};

use super::support::{
    arg, field, leaf, must_compile_with, no_context, no_vars, query_doc, run, schema_single,
    source_value, with_args,
};

fn color_enum() -> NamedType {
    NamedType::Enum(EnumType::new(
        "Color",
        vec![
            EnumValueDefinition::new("RED"),
            EnumValueDefinition::new("GREEN"),
            EnumValueDefinition::new("BLUE"),
        ],
    ))
}

fn enum_field_schema() -> Arc<Schema> {
    let query = ObjectType::new("Query").field(
        FieldDefinition::new("favoriteColor", TypeRef::named("Color")).resolve(Arc::new(
            |_args: ResolverArgs| {
                Resolved::ready_ok(source_value(Value::Scalar(Scalar::Enum("RED".to_owned()))))
            },
        )),
    );
    Arc::new(Schema::new(
        "Query",
        vec![NamedType::Object(query), color_enum()],
    ))
}

/// A plain enum leaf serializes through the default enum serializer.
#[tokio::test]
async fn enum_leaf_serializes_by_default() {
    let doc = query_doc(vec![leaf("favoriteColor")]);
    let outcome = run(enum_field_schema(), &doc, Arc::new(()) as Source, no_context(), &no_vars()).await;

    let obj = outcome.data.as_object().unwrap();
    assert_eq!(
        obj.get_field_value("favoriteColor"),
        Some(&Value::Scalar(Scalar::Enum("RED".to_owned())))
    );
}

/// `customSerializers` overrides an enum leaf's serialization, the same
/// way it overrides a scalar's.
#[tokio::test]
async fn custom_serializer_applies_to_enum_leaf() {
    let doc = query_doc(vec![leaf("favoriteColor")]);
    let options = CompileOptions::new().custom_serializer(
        "Color",
        Arc::new(|_source: &Source| Ok(Value::Scalar(Scalar::String("shouted!".to_owned())))),
    );
    let compiled = must_compile_with(enum_field_schema(), &doc, options);
    let outcome = compiled
        .query(Arc::new(()) as Source, no_context(), &no_vars())
        .resolve()
        .await;

    let obj = outcome.data.as_object().unwrap();
    assert_eq!(
        obj.get_field_value("favoriteColor"),
        Some(&Value::Scalar(Scalar::String("shouted!".to_owned())))
    );
}

/// `disableLeafSerialization` trusts the resolver's return verbatim for
/// an enum leaf too, instead of running it through the default enum
/// serializer.
#[tokio::test]
async fn disable_leaf_serialization_trusts_enum_resolver() {
    let doc = query_doc(vec![leaf("favoriteColor")]);
    let options = CompileOptions::new().disable_leaf_serialization(true);
    let compiled = must_compile_with(enum_field_schema(), &doc, options);
    let outcome = compiled
        .query(Arc::new(()) as Source, no_context(), &no_vars())
        .resolve()
        .await;

    let obj = outcome.data.as_object().unwrap();
    assert_eq!(
        obj.get_field_value("favoriteColor"),
        Some(&Value::Scalar(Scalar::Enum("RED".to_owned())))
    );
}

fn introspectable_schema() -> Arc<Schema> {
    let query = ObjectType::new("Query").field(FieldDefinition::new("name", TypeRef::named("String")).resolve(
        Arc::new(|_args: ResolverArgs| Resolved::ready_ok(source_value(Value::Scalar(Scalar::String("hi".to_owned()))))),
    ));
    schema_single(query)
}

/// `{ __schema { types { name kind } } }` lists every named type,
/// including the built-in `Query` root.
#[tokio::test]
async fn schema_introspection_lists_types() {
    let doc = query_doc(vec![field(
        "__schema",
        vec![field("types", vec![leaf("name"), leaf("kind")])],
    )]);
    let outcome = run(
        introspectable_schema(),
        &doc,
        Arc::new(()) as Source,
        no_context(),
        &no_vars(),
    )
    .await;

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    let schema_obj = outcome.data.as_object().unwrap().get_field_value("__schema").unwrap();
    let types = schema_obj.as_object().unwrap().get_field_value("types").unwrap();
    let names: Vec<&str> = types
        .as_list()
        .unwrap()
        .iter()
        .map(|t| match t.as_object().unwrap().get_field_value("name").unwrap() {
            Value::Scalar(Scalar::String(s)) => s.as_str(),
            _ => panic!("expected a string name"),
        })
        .collect();
    assert_eq!(names, vec!["Query"]);
}

/// `__type(name:)` resolves a known type to its `{ name kind }` shape.
#[tokio::test]
async fn type_introspection_finds_known_type() {
    let doc = query_doc(vec![with_args(
        field("__type", vec![leaf("name"), leaf("kind")]),
        vec![arg("name", InputValue::Scalar(Scalar::String("Query".to_owned())))],
    )]);
    let outcome = run(
        introspectable_schema(),
        &doc,
        Arc::new(()) as Source,
        no_context(),
        &no_vars(),
    )
    .await;

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    let ty = outcome.data.as_object().unwrap().get_field_value("__type").unwrap();
    let fields = ty.as_object().unwrap();
    assert_eq!(fields.get_field_value("name"), Some(&Value::Scalar(Scalar::String("Query".to_owned()))));
    assert_eq!(fields.get_field_value("kind"), Some(&Value::Scalar(Scalar::String("OBJECT".to_owned()))));
}

/// `__type(name:)` resolves to `null` for a name the schema doesn't have,
/// the same as a real `__Type` introspection root field.
#[tokio::test]
async fn type_introspection_nulls_unknown_name() {
    let doc = query_doc(vec![with_args(
        field("__type", vec![leaf("name")]),
        vec![arg("name", InputValue::Scalar(Scalar::String("Nope".to_owned())))],
    )]);
    let outcome = run(
        introspectable_schema(),
        &doc,
        Arc::new(()) as Source,
        no_context(),
        &no_vars(),
    )
    .await;

    assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
    assert_eq!(outcome.data.as_object().unwrap().get_field_value("__type"), Some(&Value::Null));
}

/// `__type(name:)` requires its `name` argument.
#[tokio::test]
async fn type_introspection_requires_name_argument() {
    let doc = query_doc(vec![field("__type", vec![leaf("name")])]);
    let result = crate::compile::compile(introspectable_schema(), &doc, None, None);
    assert!(result.is_err());
}

#[derive(Clone, Default)]
struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'w> tracing_subscriber::fmt::MakeWriter<'w> for CaptureWriter {
    type Writer = CaptureWriter;

    fn make_writer(&'w self) -> Self::Writer {
        self.clone()
    }
}

/// Every resolved field opens a `resolve_field` span; a real subscriber
/// installed for the duration of a query sees it, the way the
/// `tracing_support` integration example installs one for a whole
/// server run.
#[tokio::test]
async fn resolve_field_span_is_emitted() {
    let buffer = CaptureWriter::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::ENTER)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let doc = query_doc(vec![leaf("name")]);
    let _ = run(
        introspectable_schema(),
        &doc,
        Arc::new(()) as Source,
        no_context(),
        &no_vars(),
    )
    .await;

    let logged = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    assert!(logged.contains("resolve_field"), "{logged}");
}
