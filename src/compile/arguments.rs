//! Argument Resolver.
//!
//! The plan holds one [`ArgumentAssembler`] per field, built once at
//! compile time from the field's literal argument values (already
//! coerced, including defaults) and its variable-bound argument names.
//! At call time it combines those with the coerced runtime variables.

use indexmap::IndexMap;

use crate::error::FieldError;
use crate::schema::Argument as SchemaArgument;
use crate::value::{Object, Value};

#[derive(Clone)]
pub struct ArgumentAssembler {
    /// Literal values already coerced at compile time, including any
    /// applied defaults. Present for every argument supplied as a
    /// literal, or that has a default and was omitted.
    literal_values: IndexMap<String, Value>,
    /// Argument name -> variable name, for arguments bound to a variable.
    variable_bound: IndexMap<String, String>,
    /// Every declared argument's schema definition, used to check
    /// non-null constraints regardless of whether the value came from a
    /// literal or a variable.
    arg_defs: IndexMap<String, SchemaArgument>,
    field_name: String,
}

impl ArgumentAssembler {
    pub fn new(
        field_name: impl Into<String>,
        arg_defs: IndexMap<String, SchemaArgument>,
        literal_values: IndexMap<String, Value>,
        variable_bound: IndexMap<String, String>,
    ) -> Self {
        Self {
            literal_values,
            variable_bound,
            arg_defs,
            field_name: field_name.into(),
        }
    }

    /// Combines the precomputed literal map with coerced runtime
    /// variables, enforcing non-null constraints along the way.
    pub fn assemble(&self, variables: &IndexMap<String, Value>) -> Result<Object<Value>, FieldError> {
        let mut out = Object::with_capacity(self.arg_defs.len());

        for (name, def) in &self.arg_defs {
            if let Some(var_name) = self.variable_bound.get(name) {
                match variables.get(var_name) {
                    Some(value) => {
                        if value.is_null() && def.arg_type.is_non_null() {
                            return Err(FieldError::new(
                                format!(
                                    "Argument \"{name}\" of non-null type \"{}\" must not be null.",
                                    def.arg_type
                                ),
                                None,
                            ));
                        }
                        out.add_field(name.clone(), value.clone());
                    }
                    None => {
                        if def.arg_type.is_non_null() {
                            return Err(FieldError::new(
                                format!(
                                    "Argument \"{name}\" of field \"{}\" was provided the \
                                     variable \"${var_name}\" which was not provided a runtime \
                                     value.",
                                    self.field_name
                                ),
                                None,
                            ));
                        }
                        // Variable omitted at runtime and the argument is
                        // nullable: leave the key absent.
                    }
                }
                continue;
            }

            if let Some(value) = self.literal_values.get(name) {
                if value.is_null() && def.arg_type.is_non_null() {
                    return Err(FieldError::new(
                        format!(
                            "Argument \"{name}\" of non-null type \"{}\" must not be null.",
                            def.arg_type
                        ),
                        None,
                    ));
                }
                out.add_field(name.clone(), value.clone());
            }
        }

        Ok(out)
    }
}
