//! Serial mutation execution: top-level mutation fields run one at a
//! time in declaration order, synchronous and pending resolvers alike,
//! rather than concurrently like a query's.

use std::sync::{Arc, Mutex};

use crate::schema::{FieldDefinition, NamedType, ObjectType, Resolved, Resolver, ResolverArgs, Schema, Source};
use crate::value::{Scalar, Value};

use super::support::{leaf, mutation_doc, must_compile, no_context, no_vars, source_value};

fn sync_mutation(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Resolver {
    Arc::new(move |_args: ResolverArgs| {
        log.lock().unwrap().push(name);
        Resolved::ready_ok(source_value(Value::Scalar(Scalar::String(name.to_owned()))))
    })
}

fn pending_mutation(name: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> Resolver {
    Arc::new(move |_args: ResolverArgs| {
        let log = Arc::clone(&log);
        Resolved::Pending(Box::pin(async move {
            tokio::task::yield_now().await;
            log.lock().unwrap().push(name);
            Ok(source_value(Value::Scalar(Scalar::String(name.to_owned()))))
        }))
    })
}

fn mutation_schema(log: Arc<Mutex<Vec<&'static str>>>) -> Arc<Schema> {
    let mutation = ObjectType::new("Mutation")
        .field(FieldDefinition::new("first", crate::schema::TypeRef::named("String")).resolve(sync_mutation("first", Arc::clone(&log))))
        .field(FieldDefinition::new("second", crate::schema::TypeRef::named("String")).resolve(pending_mutation("second", Arc::clone(&log))))
        .field(FieldDefinition::new("third", crate::schema::TypeRef::named("String")).resolve(sync_mutation("third", Arc::clone(&log))))
        .field(FieldDefinition::new("fourth", crate::schema::TypeRef::named("String")).resolve(pending_mutation("fourth", Arc::clone(&log))))
        .field(FieldDefinition::new("fifth", crate::schema::TypeRef::named("String")).resolve(sync_mutation("fifth", log)));

    let query = ObjectType::new("Query");

    Arc::new(
        Schema::new("Query", vec![NamedType::Object(query), NamedType::Object(mutation)])
            .with_mutation_type("Mutation"),
    )
}

#[tokio::test]
async fn mutation_fields_run_serially_in_declaration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let doc = mutation_doc(vec![
        leaf("first"),
        leaf("second"),
        leaf("third"),
        leaf("fourth"),
        leaf("fifth"),
    ]);
    let compiled = must_compile(mutation_schema(Arc::clone(&log)), &doc);
    assert!(compiled.is_mutation());
    assert_eq!(
        compiled.mutation_field_order(),
        Some(&["first".to_owned(), "second".to_owned(), "third".to_owned(), "fourth".to_owned(), "fifth".to_owned()][..])
    );

    let outcome = compiled
        .query(Arc::new(()) as Source, no_context(), &no_vars())
        .resolve()
        .await;

    assert_eq!(outcome.errors, []);
    let obj = outcome.data.as_object().unwrap();
    for name in ["first", "second", "third", "fourth", "fifth"] {
        assert_eq!(obj.get_field_value(name), Some(&Value::Scalar(Scalar::String(name.into()))));
    }

    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third", "fourth", "fifth"]);
}
