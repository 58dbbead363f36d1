//! Resolve-Info Builder: the object passed to every resolver.
//!
//! Most of this is precomputed per-field data copied out of the plan; the
//! only per-invocation bits are `path`, `root_value` and `variable_values`.
//! `path` is kept as an intrusive linked list and materialized to a `Vec`
//! lazily, only when a resolver or error actually needs it.

use std::sync::Arc;

use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::ast::{Field, Fragment, Operation};
use crate::error::{Path, PathSegment};
use crate::schema::{Schema, Source, TypeRef};
use crate::value::Value;

/// An intrusive, stack-shaped path: each frame borrows its parent rather
/// than owning a `Vec`, so building one on the hot path costs one
/// allocation (the `Arc`) rather than a vector copy.
#[derive(Clone)]
pub enum FieldPath {
    Root,
    Field {
        parent: Arc<FieldPath>,
        segment: PathSegment,
    },
}

impl FieldPath {
    pub fn child(self: &Arc<Self>, segment: PathSegment) -> Arc<Self> {
        Arc::new(Self::Field {
            parent: Arc::clone(self),
            segment,
        })
    }

    /// Materializes the path root-first, as required whenever an error is
    /// emitted or a [`ResolveInfo`] is built.
    pub fn to_vec(&self) -> Path {
        let mut frames = Vec::new();
        let mut cursor = self;
        loop {
            match cursor {
                Self::Root => break,
                Self::Field { parent, segment } => {
                    frames.push(segment.clone());
                    cursor = parent;
                }
            }
        }
        frames.reverse();
        frames
    }
}

/// The per-invocation bits, plus the precomputed per-field data a plan
/// node already carries — bundled so resolvers get one coherent object.
pub struct ResolveInfo {
    pub field_name: String,
    pub field_nodes: Vec<Arc<Field>>,
    pub return_type: TypeRef,
    pub parent_type: String,
    pub path: Arc<FieldPath>,
    pub schema: Arc<Schema>,
    pub fragments: Arc<FnvHashMap<String, Fragment>>,
    pub root_value: Source,
    pub operation: Arc<Operation>,
    pub variable_values: Arc<IndexMap<String, Value>>,
}

impl ResolveInfo {
    pub fn materialized_path(&self) -> Path {
        self.path.to_vec()
    }
}
