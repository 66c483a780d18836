//! Config document parser.
//!
//! Walks a validated [`RawValue`] document and feeds service definitions,
//! aliases, and parameters into a [`ContainerBuilder`]. Every string-typed
//! field goes through the expression parser exactly once.

pub mod validator;

use dicc_common::config::ParserMode;
use dicc_common::constants::SERVICE_SIGIL;
use dicc_common::error::{DiccError, Result};

use crate::builder::ContainerBuilder;
use crate::definition::{Configurator, MethodCall, ServiceDefinition, is_identifier};
use crate::expression;
use crate::value::{Key, RawValue, Scalar, Value};

/// Parser for one config document flavour.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigParser {
    mode: ParserMode,
}

/// A parsed `services` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceEntry {
    /// `"@target"` shorthand.
    Alias(String),
    /// Full service map.
    Definition(ServiceDefinition),
}

impl ConfigParser {
    /// Creates a parser for `mode`.
    #[must_use]
    pub const fn new(mode: ParserMode) -> Self {
        Self { mode }
    }

    /// Parses `raw` and registers its contents in `builder`.
    ///
    /// Entries already in `builder` are replaced when the document declares
    /// the same id or parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the document shape is invalid or a service entry
    /// is malformed. Nothing is guaranteed about `builder` after a failure.
    pub fn parse_into(&self, raw: &RawValue, builder: &mut ContainerBuilder) -> Result<()> {
        tracing::info!(mode = ?self.mode, "parsing service config");
        let sections = validator::validate_document(raw, self.mode)?;

        for (key, value) in sections.parameters.unwrap_or_default() {
            builder.set_parameter(&key.to_string(), expression::resolve(value));
        }

        for (key, value) in sections.services.unwrap_or_default() {
            let id = key.to_string();
            if id.is_empty() {
                return Err(DiccError::invalid("service ids must not be empty"));
            }
            match parse_service(&id, value)? {
                ServiceEntry::Alias(target) => builder.set_alias(id, target),
                ServiceEntry::Definition(definition) => {
                    let _ = builder.set_service_definition(id, definition);
                }
            }
        }

        Ok(())
    }

    /// Parses `raw` into a fresh builder.
    ///
    /// # Errors
    ///
    /// See [`ConfigParser::parse_into`].
    pub fn parse(&self, raw: &RawValue) -> Result<ContainerBuilder> {
        let mut builder = ContainerBuilder::new();
        self.parse_into(raw, &mut builder)?;
        Ok(builder)
    }
}

/// Parses `raw` with parameters allowed.
///
/// # Errors
///
/// See [`ConfigParser::parse_into`].
pub fn parse(raw: &RawValue) -> Result<ContainerBuilder> {
    ConfigParser::default().parse(raw)
}

/// Parses one entry of the `services` section.
///
/// # Errors
///
/// Returns an error if the entry is neither an alias string nor a valid
/// service map.
pub fn parse_service(id: &str, raw: &RawValue) -> Result<ServiceEntry> {
    let entries = match raw {
        RawValue::String(s) => {
            return s
                .strip_prefix(SERVICE_SIGIL)
                .filter(|target| !target.is_empty())
                .map(|target| ServiceEntry::Alias(target.to_owned()))
                .ok_or_else(|| {
                    DiccError::invalid(format!(
                        "service \"{id}\" must be a map or an \"@id\" alias, got \"{s}\""
                    ))
                });
        }
        RawValue::Map(entries) => entries,
        other => {
            return Err(DiccError::invalid(format!(
                "service \"{id}\" must be a map or an \"@id\" alias, got {}",
                other.kind()
            )));
        }
    };

    validator::check_service_keys(id, entries)?;
    tracing::debug!(id, "parsing service definition");

    let class = match raw.get("class") {
        None | Some(RawValue::Null) => {
            return Err(DiccError::MissingField {
                service: id.to_owned(),
                field: "class",
            });
        }
        Some(class) => expression::resolve(class),
    };
    let mut definition = ServiceDefinition::new(class);

    if let Some(shared) = raw.get("shared") {
        definition.shared = match shared {
            RawValue::Bool(b) => *b,
            other => return Err(field_type(id, "shared", "a boolean", other)),
        };
    }

    if let Some(constructor) = raw.get("constructor") {
        definition.constructor = Some(expect_str(id, "constructor", constructor)?.to_owned());
    }

    definition.file = raw.get("file").map(expression::resolve);

    if let Some(arguments) = raw.get("arguments") {
        definition.arguments = parse_arguments(id, "arguments", arguments)?;
    }

    if let Some(configurator) = raw.get("configurator") {
        definition.configurator = Some(parse_configurator(id, configurator)?);
    }

    if let Some(calls) = raw.get("calls") {
        definition.method_calls = parse_calls(id, calls)?;
    }

    Ok(ServiceEntry::Definition(definition))
}

fn parse_arguments(id: &str, field: &str, raw: &RawValue) -> Result<Vec<(Key, Value)>> {
    match raw {
        RawValue::Map(entries) => Ok(entries
            .iter()
            .map(|(key, value)| (key.clone(), expression::resolve(value)))
            .collect()),
        RawValue::Null => Ok(Vec::new()),
        other => Err(field_type(id, field, "a list or map", other)),
    }
}

fn parse_configurator(id: &str, raw: &RawValue) -> Result<Configurator> {
    match raw {
        RawValue::String(name) => Ok(Configurator::Function { name: name.clone() }),
        RawValue::Map(entries) => match entries.as_slice() {
            [(Key::Index(0), target), (Key::Index(1), method)] => {
                let method = expect_str(id, "configurator", method)?.to_owned();
                Ok(match expression::resolve(target) {
                    Value::ServiceReference(service) => {
                        Configurator::ServiceMethod { service, method }
                    }
                    Value::Scalar(Scalar::String(class)) if is_identifier(&class, true) => {
                        Configurator::ClassMethod { class, method }
                    }
                    target => Configurator::StaticMethod { target, method },
                })
            }
            _ => Err(DiccError::invalid(format!(
                "service \"{id}\": configurator must be a callable name or a [target, method] pair"
            ))),
        },
        other => Err(field_type(id, "configurator", "a string or a pair", other)),
    }
}

fn parse_calls(id: &str, raw: &RawValue) -> Result<Vec<MethodCall>> {
    let calls = match raw {
        RawValue::Map(calls) => calls,
        RawValue::Null => return Ok(Vec::new()),
        other => return Err(field_type(id, "calls", "a list", other)),
    };

    calls
        .iter()
        .map(|(_, call)| match call.as_map() {
            Some([(Key::Index(0), method)]) => Ok(MethodCall {
                method: expect_str(id, "calls", method)?.to_owned(),
                arguments: Vec::new(),
            }),
            Some([(Key::Index(0), method), (Key::Index(1), arguments)]) => Ok(MethodCall {
                method: expect_str(id, "calls", method)?.to_owned(),
                arguments: parse_arguments(id, "calls", arguments)?,
            }),
            _ => Err(DiccError::invalid(format!(
                "service \"{id}\": each call must be a [method, arguments] pair"
            ))),
        })
        .collect()
}

fn expect_str<'a>(id: &str, field: &str, raw: &'a RawValue) -> Result<&'a str> {
    raw.as_str()
        .ok_or_else(|| field_type(id, field, "a string", raw))
}

fn field_type(id: &str, field: &str, expected: &str, got: &RawValue) -> DiccError {
    DiccError::invalid(format!(
        "service \"{id}\": \"{field}\" must be {expected}, got {}",
        got.kind()
    ))
}
