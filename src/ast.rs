//! Query document AST and the AST utilities: field collection,
//! directive gating, subfield memoization, argument-definition lookup.
//!
//! The parser that produces this AST lives outside this crate; the shapes
//! below are what an external parser is expected to hand the compiler:
//! a concrete, non-generic `Document`/`Definition`/`Operation`/`Selection`/
//! `Type` tree, since parsing itself isn't reimplemented here.

use std::collections::HashMap;
use std::sync::Arc;

use fnv::FnvHashMap;
use indexmap::IndexMap;

use crate::error::{CompileError, Location};
use crate::value::InputValue;

/// A wrapper that carries a node's source [`Location`] alongside its value.
#[derive(Clone, Debug, PartialEq)]
pub struct Spanning<T> {
    pub item: T,
    pub location: Location,
}

impl<T> Spanning<T> {
    pub fn new(item: T, location: Location) -> Self {
        Self { item, location }
    }

    pub fn unlocated(item: T) -> Self {
        Self {
            item,
            location: Location::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

/// A named or wrapped type reference as written in the document (variable
/// declarations, not the schema's own type system).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Type {
    Named(String),
    List(Box<Type>),
    NonNull(Box<Type>),
}

impl Type {
    pub fn innermost_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.innermost_name(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(n) => write!(f, "{n}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: InputValue,
    pub location: Location,
}

pub type Arguments = Vec<Argument>;

#[derive(Clone, Debug, PartialEq)]
pub struct Directive {
    pub name: String,
    pub arguments: Arguments,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VariableDefinition {
    pub name: String,
    pub var_type: Type,
    pub default_value: Option<InputValue>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub alias: Option<String>,
    pub name: String,
    pub arguments: Arguments,
    pub directives: Vec<Directive>,
    pub selection_set: Vec<Selection>,
    pub location: Location,
}

impl Field {
    /// The key this field contributes under in the response object: the
    /// alias if present, else the field name.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FragmentSpread {
    pub name: String,
    pub directives: Vec<Directive>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InlineFragment {
    pub type_condition: Option<String>,
    pub directives: Vec<Directive>,
    pub selection_set: Vec<Selection>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Selection {
    Field(Field),
    FragmentSpread(FragmentSpread),
    InlineFragment(InlineFragment),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub operation_type: OperationType,
    pub name: Option<String>,
    pub variable_definitions: Vec<VariableDefinition>,
    pub directives: Vec<Directive>,
    pub selection_set: Vec<Selection>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub type_condition: String,
    pub directives: Vec<Directive>,
    pub selection_set: Vec<Selection>,
    pub location: Location,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Definition {
    Operation(Operation),
    Fragment(Fragment),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub definitions: Vec<Definition>,
}

impl Document {
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Operation(op) => Some(op),
            Definition::Fragment(_) => None,
        })
    }

    pub fn fragments(&self) -> FnvHashMap<String, &Fragment> {
        self.definitions
            .iter()
            .filter_map(|d| match d {
                Definition::Fragment(f) => Some((f.name.clone(), f)),
                Definition::Operation(_) => None,
            })
            .collect()
    }

    /// Picks the operation to execute: by name if given, otherwise the
    /// document's sole operation. Unknown name, no operations, and multiple
    /// unnamed operations are all fatal compile errors.
    pub fn get_operation(&self, operation_name: Option<&str>) -> Result<&Operation, CompileError> {
        let ops: Vec<&Operation> = self.operations().collect();
        match operation_name {
            Some(name) => ops
                .into_iter()
                .find(|op| op.name.as_deref() == Some(name))
                .ok_or_else(|| CompileError::UnknownOperationName {
                    name: name.to_owned(),
                }),
            None => match ops.len() {
                0 => Err(CompileError::NoOperationProvided),
                1 => Ok(ops[0]),
                _ => Err(CompileError::MultipleOperationsProvided),
            },
        }
    }
}

/// `@skip`/`@include` evaluated to either a compile-time constant or a
/// variable name whose value is only known at invocation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Inclusion {
    Always,
    Never,
    /// Deferred to runtime: depends on the named boolean variable.
    IfVariableTrue,
    IfVariableFalse,
}

fn find_argument<'a>(directive: &'a Directive, name: &str) -> Option<&'a Argument> {
    directive.arguments.iter().find(|a| a.name == name)
}

/// Evaluates `@skip`/`@include` on one selection node against the given
/// directives, baking in literal/default-variable conditions at compile
/// time and deferring genuinely dynamic ones to runtime.
pub fn evaluate_inclusion(
    directives: &[Directive],
    known_variables: &HashMap<String, bool>,
) -> Result<Inclusion, CompileError> {
    let mut skip = None;
    let mut include = None;

    for directive in directives {
        match directive.name.as_str() {
            "skip" | "include" => {
                let arg = find_argument(directive, "if").ok_or_else(|| {
                    CompileError::UnknownDirectiveArgument {
                        directive: directive.name.clone(),
                        name: "if".to_owned(),
                    }
                })?;
                let resolved = match &arg.value {
                    InputValue::Scalar(crate::value::Scalar::Boolean(b)) => Some(*b),
                    InputValue::Variable(name) => known_variables.get(name).copied(),
                    other => {
                        return Err(CompileError::InvalidArgumentLiteral {
                            name: "if".to_owned(),
                            reason: format!("expected Boolean, found {other:?}"),
                        });
                    }
                };
                if directive.name == "skip" {
                    skip = Some((resolved, directive.clone()));
                } else {
                    include = Some((resolved, directive.clone()));
                }
            }
            _ => {}
        }
    }

    // Contract: @skip(if:true) suppresses; else @include(if:false)
    // suppresses; else include.
    if let Some((Some(true), _)) = skip {
        return Ok(Inclusion::Never);
    }
    if let Some((Some(false), _)) = include {
        return Ok(Inclusion::Never);
    }
    if let Some((None, d)) = &skip {
        let var = find_argument(d, "if").and_then(|a| a.value.as_variable_name());
        if var.is_some() {
            return Ok(Inclusion::IfVariableFalse);
        }
    }
    if let Some((None, d)) = &include {
        let var = find_argument(d, "if").and_then(|a| a.value.as_variable_name());
        if var.is_some() {
            return Ok(Inclusion::IfVariableTrue);
        }
    }
    Ok(Inclusion::Always)
}

/// An ordered map from response key to every field-node occurrence that
/// contributes to it, as produced by [`collect_fields`].
pub type FieldGroup = IndexMap<String, Vec<Arc<Field>>>;

/// Field collection: given a selection set and the static
/// object-type name it is being collected against, produce an ordered
/// map from response key to field occurrences, recursing into inline and
/// named fragments whose type condition applies.
///
/// `type_applies` decides whether a type condition (object/interface/
/// union name) is satisfied by `object_type_name` — same type, or the
/// object implements the interface / belongs to the union. It is
/// supplied by the caller (the plan builder) since only the schema knows
/// type relationships.
pub fn collect_fields(
    selection_set: &[Selection],
    object_type_name: &str,
    fragments: &FnvHashMap<String, &Fragment>,
    known_variables: &HashMap<String, bool>,
    type_applies: &impl Fn(&str, &str) -> bool,
    visited_fragments: &mut std::collections::HashSet<String>,
    out: &mut FieldGroup,
) -> Result<(), CompileError> {
    for selection in selection_set {
        match selection {
            Selection::Field(field) => {
                if evaluate_inclusion(&field.directives, known_variables)? == Inclusion::Never {
                    continue;
                }
                out.entry(field.response_key().to_owned())
                    .or_default()
                    .push(Arc::new(field.clone()));
            }
            Selection::InlineFragment(frag) => {
                if evaluate_inclusion(&frag.directives, known_variables)? == Inclusion::Never {
                    continue;
                }
                if let Some(cond) = &frag.type_condition {
                    if !type_applies(cond, object_type_name) {
                        continue;
                    }
                }
                collect_fields(
                    &frag.selection_set,
                    object_type_name,
                    fragments,
                    known_variables,
                    type_applies,
                    visited_fragments,
                    out,
                )?;
            }
            Selection::FragmentSpread(spread) => {
                if evaluate_inclusion(&spread.directives, known_variables)? == Inclusion::Never {
                    continue;
                }
                if !visited_fragments.insert(spread.name.clone()) {
                    // Cycle guard: already expanding this fragment on this path.
                    continue;
                }
                if let Some(fragment) = fragments.get(&spread.name) {
                    if type_applies(&fragment.type_condition, object_type_name) {
                        collect_fields(
                            &fragment.selection_set,
                            object_type_name,
                            fragments,
                            known_variables,
                            type_applies,
                            visited_fragments,
                            out,
                        )?;
                    }
                }
                visited_fragments.remove(&spread.name);
            }
        }
    }
    Ok(())
}

/// Per-field argument split: literal values already coerced, and
/// variable-bound names deferred to invocation time.
#[derive(Clone, Debug, Default)]
pub struct ArgumentDefinitions {
    pub values: IndexMap<String, InputValue>,
    pub missing: IndexMap<String, String>,
}

/// Splits a field node's arguments against its field-definition argument
/// names, producing literal values and variable-bound placeholders.
/// `required_non_null` lists argument names whose type is non-null, for
/// the missing-argument compile error.
pub fn resolve_argument_definitions(
    field: &Field,
    known_argument_names: &std::collections::HashSet<String>,
    required_non_null: &std::collections::HashMap<String, String>,
) -> Result<ArgumentDefinitions, CompileError> {
    let mut result = ArgumentDefinitions::default();

    for arg in &field.arguments {
        if !known_argument_names.contains(&arg.name) {
            return Err(CompileError::UnknownArgument {
                field: field.name.clone(),
                name: arg.name.clone(),
            });
        }
        match &arg.value {
            InputValue::Variable(var_name) => {
                result.missing.insert(arg.name.clone(), var_name.clone());
            }
            literal => {
                result.values.insert(arg.name.clone(), literal.clone());
            }
        }
    }

    for (name, type_name) in required_non_null {
        let supplied_literal_non_null = result
            .values
            .get(name)
            .map(|v| !v.is_null())
            .unwrap_or(false);
        let supplied_as_variable = result.missing.contains_key(name);
        if !supplied_literal_non_null && !supplied_as_variable {
            return Err(CompileError::MissingNonNullArgument {
                name: name.clone(),
                type_name: type_name.clone(),
            });
        }
    }

    Ok(result)
}

/// Subfield memoization cache: keyed by
/// `(return_type_name, field_node_list pointer identity)`, owned by a
/// single compilation and dropped with it.
#[derive(Default)]
pub struct SubfieldCache {
    entries: FnvHashMap<(String, usize), FieldGroup>,
}

impl SubfieldCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity of a field-node list: the address of its first element is
    /// stable for the lifetime of one compilation, since the AST is
    /// never mutated after parse.
    pub fn key_for(return_type: &str, field_nodes: &[Arc<Field>]) -> (String, usize) {
        let key_id = field_nodes.first().map_or(0, |f| Arc::as_ptr(f) as usize);
        (return_type.to_owned(), key_id)
    }

    pub fn get(&self, key: &(String, usize)) -> Option<&FieldGroup> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: (String, usize), group: FieldGroup) {
        self.entries.insert(key, group);
    }
}
