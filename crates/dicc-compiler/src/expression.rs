//! Parameter expression parsing.
//!
//! Turns raw config nodes into [`Value`]s. Strings go through a single
//! index-based pass that recognizes `%name%` tokens, the `%%` escape, and
//! the `@` / `@@` service sigils.

use dicc_common::constants::{PARAMETER_DELIMITER, SERVICE_SIGIL};
use dicc_common::types::{ParameterKey, ServiceId};

use crate::value::{Part, RawValue, Scalar, Value};

/// A piece of a scanned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text with `%%` already collapsed to `%`.
    Literal(String),
    /// Name between two `%` delimiters, as written.
    Parameter(&'a str),
}

/// Scans `input` left to right for `%name%` tokens.
///
/// `%%` always stands for a literal `%` and never opens or closes a token.
/// A `%` with no closing delimiter is kept as literal text. Consecutive
/// literal text is returned as one segment.
pub fn scan(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];
        let Some(offset) = rest.find(PARAMETER_DELIMITER) else {
            literal.push_str(rest);
            break;
        };
        literal.push_str(&rest[..offset]);
        pos += offset;

        let after = &input[pos + 1..];
        if after.starts_with(PARAMETER_DELIMITER) {
            literal.push(PARAMETER_DELIMITER);
            pos += 2;
            continue;
        }

        match after.find(PARAMETER_DELIMITER) {
            Some(end) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Parameter(&after[..end]));
                pos += end + 2;
            }
            None => {
                literal.push(PARAMETER_DELIMITER);
                pos += 1;
            }
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

/// Returns the name when the whole string is one `%name%` token.
fn pure_reference(input: &str) -> Option<&str> {
    let name = input
        .strip_prefix(PARAMETER_DELIMITER)?
        .strip_suffix(PARAMETER_DELIMITER)?;
    (!name.is_empty() && !name.contains(PARAMETER_DELIMITER)).then_some(name)
}

/// Resolves a raw string into a value.
pub fn resolve_str(input: &str) -> Value {
    if let Some(rest) = input.strip_prefix(SERVICE_SIGIL) {
        if rest.starts_with(SERVICE_SIGIL) {
            return Value::string(rest);
        }
        return Value::ServiceReference(ServiceId::new(rest));
    }

    if !input.contains(PARAMETER_DELIMITER) {
        return Value::string(input);
    }

    if let Some(name) = pure_reference(input) {
        return Value::parameter(name);
    }

    let parts = scan(input)
        .into_iter()
        .map(|segment| match segment {
            Segment::Literal(text) => Part::Literal(text),
            Segment::Parameter(name) => Part::Parameter(ParameterKey::new(name)),
        })
        .collect();
    Value::expression(parts)
}

/// Resolves a raw node into a value, recursing into maps.
pub fn resolve(raw: &RawValue) -> Value {
    match raw {
        RawValue::Null => Value::Scalar(Scalar::Null),
        RawValue::Bool(b) => Value::Scalar(Scalar::Bool(*b)),
        RawValue::Int(n) => Value::Scalar(Scalar::Int(*n)),
        RawValue::Float(x) => Value::Scalar(Scalar::Float(*x)),
        RawValue::String(s) => resolve_str(s),
        RawValue::Map(entries) => Value::ListOf(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), resolve(value)))
                .collect(),
        ),
        RawValue::Opaque(type_name) => Value::Opaque(type_name.clone()),
    }
}
