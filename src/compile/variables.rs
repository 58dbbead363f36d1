//! Variable Coercer.
//!
//! Coerces the caller-provided raw variable map against the operation's
//! declared variable types, applying defaults and producing
//! location-tagged diagnostics. The same literal-coercion core is reused
//! by the argument resolver for field-argument literals and by the plan
//! builder for argument/field default values, since both are "coerce
//! this AST literal against this declared type" problems.

use indexmap::IndexMap;

use crate::ast::{Type as AstType, VariableDefinition};
use crate::compile::inspect::{inspect_input, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LENGTH};
use crate::error::CoercionError;
use crate::schema::{NamedType, Schema, TypeRef};
use crate::value::{InputValue, Object, Scalar, Value};

fn ast_type_to_type_ref(ast_type: &AstType) -> TypeRef {
    match ast_type {
        AstType::Named(name) => TypeRef::Named(name.clone()),
        AstType::List(inner) => TypeRef::List(Box::new(ast_type_to_type_ref(inner))),
        AstType::NonNull(inner) => TypeRef::NonNull(Box::new(ast_type_to_type_ref(inner))),
    }
}

/// Numeric/boolean representability rules.
fn coerce_builtin_scalar(
    type_name: &str,
    scalar: &Scalar,
    value_path: &str,
) -> Result<Value, CoercionError> {
    let bad = || {
        Err(CoercionError::new(
            format!(
                "Expected type \"{type_name}\", found {}.",
                inspect_input(
                    &InputValue::Scalar(scalar.clone()),
                    DEFAULT_MAX_DEPTH,
                    DEFAULT_MAX_LENGTH
                )
            ),
            value_path,
        ))
    };

    match type_name {
        "Int" => match scalar {
            Scalar::Int(i) => Ok(Value::Scalar(Scalar::Int(*i))),
            _ => bad(),
        },
        "Float" => match scalar {
            Scalar::Float(f) if f.is_finite() => Ok(Value::Scalar(Scalar::Float(*f))),
            Scalar::Int(i) => Ok(Value::Scalar(Scalar::Float(*i as f64))),
            _ => bad(),
        },
        "String" => match scalar {
            Scalar::String(s) => Ok(Value::Scalar(Scalar::String(s.clone()))),
            _ => bad(),
        },
        "ID" => match scalar {
            Scalar::String(s) => Ok(Value::Scalar(Scalar::String(s.clone()))),
            Scalar::Int(i) => Ok(Value::Scalar(Scalar::String(i.to_string()))),
            _ => bad(),
        },
        "Boolean" => match scalar {
            Scalar::Boolean(b) => Ok(Value::Scalar(Scalar::Boolean(*b))),
            _ => bad(),
        },
        _ => unreachable!("coerce_builtin_scalar called with non-builtin type {type_name}"),
    }
}

const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "ID", "Boolean"];

/// Coerces one literal `InputValue` against a declared type.
/// `variables` resolves any `InputValue::Variable` nodes
/// encountered (used when coercing argument literals that reference
/// variables; the top-level variable coercer itself never has
/// `Variable` nodes to resolve, since variable *defaults* cannot
/// reference other variables).
pub fn coerce_literal(
    schema: &Schema,
    type_ref: &TypeRef,
    literal: &InputValue,
    variables: Option<&IndexMap<String, Value>>,
    value_path: &str,
) -> Result<Value, CoercionError> {
    if let InputValue::Variable(name) = literal {
        return match variables.and_then(|vars| vars.get(name)) {
            Some(value) => Ok(value.clone()),
            None => Err(CoercionError::new(
                format!("Variable \"${name}\" is not defined."),
                value_path,
            )),
        };
    }

    match type_ref {
        TypeRef::NonNull(inner) => {
            if literal.is_null() {
                return Err(CoercionError::new(
                    format!(
                        "Expected non-nullable type \"{inner}!\" not to be null at {value_path}."
                    ),
                    value_path,
                ));
            }
            coerce_literal(schema, inner, literal, variables, value_path)
        }
        TypeRef::List(inner) => match literal {
            InputValue::Null => Ok(Value::Null),
            InputValue::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    out.push(coerce_literal(
                        schema,
                        inner,
                        item,
                        variables,
                        &format!("{value_path}[{i}]"),
                    )?);
                }
                Ok(Value::List(out))
            }
            // A single value coerces as a one-item list.
            single => Ok(Value::List(vec![coerce_literal(
                schema, inner, single, variables, value_path,
            )?])),
        },
        TypeRef::Named(name) => {
            if literal.is_null() {
                return Ok(Value::Null);
            }
            if BUILTIN_SCALARS.contains(&name.as_str()) {
                return match literal {
                    InputValue::Scalar(s) => coerce_builtin_scalar(name, s, value_path),
                    _ => Err(CoercionError::new(
                        format!("Expected type \"{name}\" at {value_path}."),
                        value_path,
                    )),
                };
            }

            match schema.type_by_name(name) {
                Some(NamedType::Scalar(scalar_type)) => (scalar_type.parse_literal)(literal)
                    .map_err(|msg| CoercionError::new(msg, value_path)),
                Some(NamedType::Enum(enum_type)) => match literal {
                    InputValue::Scalar(Scalar::Enum(variant)) if enum_type.values.contains_key(variant) => {
                        Ok(Value::Scalar(Scalar::Enum(variant.clone())))
                    }
                    other => Err(CoercionError::new(
                        format!(
                            "Value {} does not exist in \"{name}\" enum.",
                            inspect_input(other, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LENGTH)
                        ),
                        value_path,
                    )),
                },
                Some(NamedType::InputObject(input_object)) => match literal {
                    InputValue::Object(fields) => {
                        for field_name in fields.iter().map(|(k, _)| k) {
                            if !input_object.fields.contains_key(field_name) {
                                return Err(CoercionError::new(
                                    format!(
                                        "Field \"{field_name}\" is not defined by type \"{name}\"."
                                    ),
                                    value_path,
                                ));
                            }
                        }
                        let mut out = Object::with_capacity(input_object.fields.len());
                        for (field_name, field_def) in &input_object.fields {
                            let child_path = format!("{value_path}.{field_name}");
                            match fields.get_field_value(field_name) {
                                Some(provided) => {
                                    out.add_field(
                                        field_name.clone(),
                                        coerce_literal(
                                            schema,
                                            &field_def.field_type,
                                            provided,
                                            variables,
                                            &child_path,
                                        )?,
                                    );
                                }
                                None => {
                                    if let Some(default) = &field_def.default_value {
                                        out.add_field(
                                            field_name.clone(),
                                            coerce_literal(
                                                schema,
                                                &field_def.field_type,
                                                default,
                                                variables,
                                                &child_path,
                                            )?,
                                        );
                                    } else if field_def.field_type.is_non_null() {
                                        return Err(CoercionError::new(
                                            format!(
                                                "Field \"{field_name}\" of required type \"{}\" was not provided.",
                                                field_def.field_type
                                            ),
                                            child_path,
                                        ));
                                    }
                                }
                            }
                        }
                        Ok(Value::Object(out))
                    }
                    _ => Err(CoercionError::new(
                        format!("Expected type \"{name}\" to be an object at {value_path}."),
                        value_path,
                    )),
                },
                Some(_) => Err(CoercionError::new(
                    format!("\"{name}\" cannot be used as an input type."),
                    value_path,
                )),
                None => Err(CoercionError::new(format!("Unknown type \"{name}\"."), value_path)),
            }
        }
    }
}

/// Coerces the full set of declared variables against caller-provided raw
/// values, dispatching to [`coerce_literal`] for
/// rule 4's recursive case). `raw_values` holds literals the caller
/// supplied out-of-band (e.g. parsed from request JSON into `InputValue`s
/// ahead of time); this crate does not parse request JSON itself.
pub fn coerce_variable_values(
    schema: &Schema,
    variable_definitions: &[VariableDefinition],
    raw_values: &IndexMap<String, InputValue>,
) -> Result<IndexMap<String, Value>, Vec<CoercionError>> {
    let mut coerced = IndexMap::new();
    let mut errors = Vec::new();

    for def in variable_definitions {
        let type_ref = ast_type_to_type_ref(&def.var_type);
        let path = format!("${}", def.name);

        if !is_input_type(schema, &type_ref) {
            errors.push(CoercionError::new(
                format!(
                    "${} expected value of type \"{}\" which cannot be used as an input type.",
                    def.name, def.var_type
                ),
                &path,
            ));
            continue;
        }

        let provided = raw_values.get(&def.name);
        let provided_is_null = matches!(provided, Some(InputValue::Null));

        if provided.is_none() || provided_is_null {
            if let Some(default) = &def.default_value {
                match coerce_literal(schema, &type_ref, default, None, &path) {
                    Ok(value) => {
                        coerced.insert(def.name.clone(), value);
                    }
                    Err(e) => errors.push(e),
                }
                continue;
            }
            if type_ref.is_non_null() {
                let message = if provided.is_none() {
                    format!(
                        "${} of required type \"{}\" was not provided.",
                        def.name, def.var_type
                    )
                } else {
                    format!(
                        "${} of non-null type \"{}\" must not be null.",
                        def.name, def.var_type
                    )
                };
                errors.push(CoercionError::new(message, &path));
                continue;
            }
            coerced.insert(def.name.clone(), Value::Null);
            continue;
        }

        match coerce_literal(schema, &type_ref, provided.unwrap(), None, &path) {
            Ok(value) => {
                coerced.insert(def.name.clone(), value);
            }
            Err(e) => errors.push(e),
        }
    }

    if errors.is_empty() {
        Ok(coerced)
    } else {
        Err(errors)
    }
}

fn is_input_type(schema: &Schema, type_ref: &TypeRef) -> bool {
    match type_ref {
        TypeRef::List(inner) | TypeRef::NonNull(inner) => is_input_type(schema, inner),
        TypeRef::Named(name) => {
            BUILTIN_SCALARS.contains(&name.as_str())
                || matches!(
                    schema.type_by_name(name),
                    Some(NamedType::Scalar(_) | NamedType::Enum(_) | NamedType::InputObject(_))
                )
        }
    }
}
