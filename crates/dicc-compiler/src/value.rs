//! Tagged intermediate representation of configured values.
//!
//! [`RawValue`] is the untyped document tree handed over by the loaders.
//! [`Value`] is what the expression parser produces from it and what every
//! later stage (builder, resolver, dumper) consumes.

use std::fmt;

use dicc_common::error::{DiccError, Result};
use dicc_common::types::{ParameterKey, ServiceId};
use serde::Serialize;

/// Key of a list entry.
///
/// Index keys mark positional arguments; name keys mark named ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Key {
    /// Integer key.
    Index(i64),
    /// String key.
    Name(String),
}

impl Key {
    /// Builds a key from a map key, turning canonical integers into indexes.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.parse::<i64>() {
            Ok(index) if index.to_string() == name => Self::Index(index),
            _ => Self::Name(name.to_owned()),
        }
    }

    /// Returns the name if this is a string key.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Name(name) => write!(f, "{name}"),
        }
    }
}

/// Assigns index keys `0..n` to a sequence of values.
pub fn indexed<T>(items: impl IntoIterator<Item = T>) -> Vec<(Key, T)> {
    (0_i64..)
        .zip(items)
        .map(|(index, item)| (Key::Index(index), item))
        .collect()
}

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Absent value.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal, already unescaped.
    String(String),
}

impl Scalar {
    /// Renders the scalar the way string interpolation sees it.
    #[must_use]
    pub fn to_interpolated(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "1".into(),
            Self::Bool(false) => String::new(),
            Self::Int(n) => n.to_string(),
            Self::Float(x) => x.to_string(),
            Self::String(s) => s.clone(),
        }
    }
}

/// One segment of a parameter string expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Part {
    /// Literal text.
    Literal(String),
    /// Interpolated parameter.
    Parameter(ParameterKey),
}

/// A configured value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Value {
    /// Scalar literal.
    Scalar(Scalar),
    /// Ordered list with preserved keys.
    ListOf(Vec<(Key, Value)>),
    /// Reference to another service, written `@id`.
    ServiceReference(ServiceId),
    /// Whole-value reference to a parameter, written `%name%`.
    ParameterReference(ParameterKey),
    /// String mixing literals and parameters.
    ///
    /// Never empty and never a lone literal; build it with
    /// [`Value::expression`].
    ParameterStringExpression(Vec<Part>),
    /// Runtime object or resource that has no source representation.
    Opaque(String),
}

impl Value {
    /// Creates a null scalar.
    #[must_use]
    pub const fn null() -> Self {
        Self::Scalar(Scalar::Null)
    }

    /// Creates a string scalar.
    pub fn string(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::String(s.into()))
    }

    /// Creates a service reference.
    pub fn service(id: impl Into<ServiceId>) -> Self {
        Self::ServiceReference(id.into())
    }

    /// Creates a parameter reference; the key is lower-cased.
    #[must_use]
    pub fn parameter(name: &str) -> Self {
        Self::ParameterReference(ParameterKey::new(name))
    }

    /// Creates an index-keyed list.
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::ListOf(indexed(items))
    }

    /// Creates a parameter string expression from raw parts.
    ///
    /// Adjacent literals are merged and empty literals dropped. A result
    /// without parameters becomes a string scalar, and a lone parameter
    /// becomes a [`Value::ParameterReference`].
    #[must_use]
    pub fn expression(parts: Vec<Part>) -> Self {
        let mut merged: Vec<Part> = Vec::with_capacity(parts.len());
        for part in parts {
            if let Part::Literal(text) = &part {
                if text.is_empty() {
                    continue;
                }
                if let Some(Part::Literal(prev)) = merged.last_mut() {
                    prev.push_str(text);
                    continue;
                }
            }
            merged.push(part);
        }

        match merged.as_slice() {
            [] => Self::string(""),
            [Part::Literal(text)] => Self::string(text.clone()),
            [Part::Parameter(key)] => Self::ParameterReference(key.clone()),
            _ => Self::ParameterStringExpression(merged),
        }
    }

    /// Returns the string if this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Collects every service reference inside this value, depth first.
    pub fn collect_service_references<'a>(&'a self, out: &mut Vec<&'a ServiceId>) {
        match self {
            Self::ServiceReference(id) => out.push(id),
            Self::ListOf(items) => {
                for (_, item) in items {
                    item.collect_service_references(out);
                }
            }
            Self::Scalar(_)
            | Self::ParameterReference(_)
            | Self::ParameterStringExpression(_)
            | Self::Opaque(_) => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Self::Scalar(scalar)
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    write!(f, "{}", text.replace('%', "%%"))
}

/// Renders values back in config syntax (`@id`, `%name%`, `[k: v]`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(Scalar::Null) => write!(f, "null"),
            Self::Scalar(Scalar::Bool(b)) => write!(f, "{b}"),
            Self::Scalar(Scalar::Int(n)) => write!(f, "{n}"),
            Self::Scalar(Scalar::Float(x)) => write!(f, "{x:?}"),
            Self::Scalar(Scalar::String(s)) => {
                if s.starts_with('@') {
                    write!(f, "@")?;
                }
                write_escaped(f, s)
            }
            Self::ListOf(items) => {
                write!(f, "[")?;
                for (i, (key, item)) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                write!(f, "]")
            }
            Self::ServiceReference(id) => write!(f, "@{id}"),
            Self::ParameterReference(key) => write!(f, "%{key}%"),
            Self::ParameterStringExpression(parts) => {
                for part in parts {
                    match part {
                        Part::Literal(text) => write_escaped(f, text)?,
                        Part::Parameter(key) => write!(f, "%{key}%")?,
                    }
                }
                Ok(())
            }
            Self::Opaque(type_name) => write!(f, "<{type_name}>"),
        }
    }
}

/// Untyped document tree produced by the JSON and YAML loaders.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// `null` / `~`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    String(String),
    /// Sequence or mapping, with keys in document order.
    Map(Vec<(Key, RawValue)>),
    /// Tagged node naming a runtime object.
    Opaque(String),
}

impl RawValue {
    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid JSON.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let doc: serde_json::Value = serde_json::from_str(text)?;
        Ok(Self::from(doc))
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid YAML or uses mapping keys
    /// that are neither strings, integers, nor booleans.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
        Self::try_from(doc)
    }

    /// Builds a map from string keys.
    pub fn map<'a>(entries: impl IntoIterator<Item = (&'a str, Self)>) -> Self {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (Key::from_name(key), value))
                .collect(),
        )
    }

    /// Builds an index-keyed list.
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Map(indexed(items))
    }

    /// Returns the string if this node is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the entries if this node is a map or list.
    #[must_use]
    pub fn as_map(&self) -> Option<&[(Key, Self)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a string key in a map node.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Self> {
        self.as_map()?
            .iter()
            .find(|(key, _)| key.as_name() == Some(name))
            .map(|(_, value)| value)
    }

    /// Short description of the node kind for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Map(_) => "map",
            Self::Opaque(_) => "object",
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

#[allow(clippy::cast_precision_loss)]
fn json_number(n: &serde_json::Number) -> RawValue {
    if let Some(i) = n.as_i64() {
        RawValue::Int(i)
    } else if let Some(u) = n.as_u64() {
        RawValue::Float(u as f64)
    } else {
        RawValue::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<serde_json::Value> for RawValue {
    fn from(doc: serde_json::Value) -> Self {
        match doc {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => json_number(&n),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::list(items.into_iter().map(Self::from)),
            serde_json::Value::Object(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (Key::from_name(&key), Self::from(value)))
                    .collect(),
            ),
        }
    }
}

fn yaml_key(key: serde_yaml::Value) -> Result<Key> {
    match key {
        serde_yaml::Value::String(s) => Ok(Key::from_name(&s)),
        serde_yaml::Value::Bool(b) => Ok(Key::Index(i64::from(b))),
        serde_yaml::Value::Number(n) if n.is_i64() => {
            Ok(Key::Index(n.as_i64().unwrap_or_default()))
        }
        other => Err(DiccError::invalid(format!(
            "unsupported mapping key: {other:?}"
        ))),
    }
}

impl TryFrom<serde_yaml::Value> for RawValue {
    type Error = DiccError;

    fn try_from(doc: serde_yaml::Value) -> Result<Self> {
        Ok(match doc {
            serde_yaml::Value::Null => Self::Null,
            serde_yaml::Value::Bool(b) => Self::Bool(b),
            serde_yaml::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_yaml::Value::String(s) => Self::String(s),
            serde_yaml::Value::Sequence(items) => Self::Map(indexed(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<Vec<_>>>()?,
            )),
            serde_yaml::Value::Mapping(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| Ok((yaml_key(key)?, Self::try_from(value)?)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_yaml::Value::Tagged(tagged) => Self::Opaque(tagged.tag.to_string()),
        })
    }
}
