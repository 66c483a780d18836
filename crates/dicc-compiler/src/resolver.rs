//! Parameter substitution.
//!
//! Replaces parameter references inside values with the parameters held by
//! a [`ContainerBuilder`]. A whole-value reference keeps the referenced
//! value's type; only string expressions are flattened to strings.

use std::collections::BTreeMap;

use dicc_common::error::{DiccError, Result};
use dicc_common::types::ParameterKey;

use crate::builder::ContainerBuilder;
use crate::definition::{Configurator, ServiceDefinition};
use crate::value::{Part, Value};

/// Resolves parameter references against a builder's parameters.
#[derive(Debug, Clone, Copy)]
pub struct ParameterResolver<'a> {
    builder: &'a ContainerBuilder,
}

impl<'a> ParameterResolver<'a> {
    /// Creates a resolver reading parameters from `builder`.
    #[must_use]
    pub const fn new(builder: &'a ContainerBuilder) -> Self {
        Self { builder }
    }

    /// Returns `value` with every parameter reference substituted.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::NotFound`] for unknown parameters,
    /// [`DiccError::CircularReference`] for parameters that refer back to
    /// themselves, and [`DiccError::InvalidConfig`] when a list or object
    /// parameter is interpolated into a string.
    pub fn resolve(&self, value: &Value) -> Result<Value> {
        self.resolve_with(value, &mut Vec::new())
    }

    /// Resolves every parameter of the builder.
    ///
    /// # Errors
    ///
    /// See [`ParameterResolver::resolve`].
    pub fn resolve_all(&self) -> Result<BTreeMap<ParameterKey, Value>> {
        self.builder
            .parameters()
            .keys()
            .map(|key| Ok((key.clone(), self.lookup(key, &mut Vec::new())?)))
            .collect()
    }

    /// Returns a copy of `definition` with its values resolved.
    ///
    /// Service references are left untouched.
    ///
    /// # Errors
    ///
    /// See [`ParameterResolver::resolve`].
    pub fn resolve_definition(&self, definition: &ServiceDefinition) -> Result<ServiceDefinition> {
        let mut resolved = definition.clone();
        resolved.class = self.resolve(&definition.class)?;
        resolved.file = definition.file.as_ref().map(|file| self.resolve(file)).transpose()?;
        for (_, argument) in &mut resolved.arguments {
            *argument = self.resolve(argument)?;
        }
        for call in &mut resolved.method_calls {
            for (_, argument) in &mut call.arguments {
                *argument = self.resolve(argument)?;
            }
        }
        if let Some(Configurator::StaticMethod { target, .. }) = &mut resolved.configurator {
            *target = self.resolve(target)?;
        }
        Ok(resolved)
    }

    fn resolve_with(&self, value: &Value, stack: &mut Vec<ParameterKey>) -> Result<Value> {
        match value {
            Value::ParameterReference(key) => self.lookup(key, stack),
            Value::ParameterStringExpression(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        Part::Literal(text) => out.push_str(text),
                        Part::Parameter(key) => match self.lookup(key, stack)? {
                            Value::Scalar(scalar) => out.push_str(&scalar.to_interpolated()),
                            other => {
                                return Err(DiccError::invalid(format!(
                                    "parameter \"{key}\" cannot be interpolated into a string (value: {other})"
                                )));
                            }
                        },
                    }
                }
                Ok(Value::string(out))
            }
            Value::ListOf(items) => Ok(Value::ListOf(
                items
                    .iter()
                    .map(|(key, item)| Ok((key.clone(), self.resolve_with(item, stack)?)))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Value::Scalar(_) | Value::ServiceReference(_) | Value::Opaque(_) => Ok(value.clone()),
        }
    }

    fn lookup(&self, key: &ParameterKey, stack: &mut Vec<ParameterKey>) -> Result<Value> {
        if stack.contains(key) {
            let mut path: Vec<String> = stack.iter().map(ToString::to_string).collect();
            path.push(key.to_string());
            return Err(DiccError::CircularReference { path });
        }
        let raw = self.builder.parameter(key.as_str())?;
        stack.push(key.clone());
        let resolved = self.resolve_with(raw, stack);
        let _ = stack.pop();
        resolved
    }
}
