//! Shape validation of raw config documents.
//!
//! Checks the top-level layout and the keys of each service entry before
//! the parser interprets any value.

use dicc_common::config::ParserMode;
use dicc_common::constants::{PARAMETERS_KEY, SERVICES_KEY};
use dicc_common::error::{DiccError, Result};

use crate::value::{Key, RawValue};

/// Keys accepted inside a service map.
pub const SERVICE_KEYS: &[&str] = &[
    "class",
    "shared",
    "constructor",
    "file",
    "arguments",
    "configurator",
    "calls",
];

/// The two top-level sections of a document, both optional.
#[derive(Debug, Default)]
pub struct Sections<'a> {
    /// Entries of the `parameters` section.
    pub parameters: Option<&'a [(Key, RawValue)]>,
    /// Entries of the `services` section.
    pub services: Option<&'a [(Key, RawValue)]>,
}

/// Validates the top level of `raw` and splits it into its sections.
///
/// # Checks performed
///
/// 1. The document is a map. An empty YAML file loads as `null` and is
///    rejected like any other non-map.
/// 2. Only `parameters` and `services` appear at the top level.
/// 3. Each present section is a map or empty.
/// 4. In [`ParserMode::Strict`], no `parameters` section appears.
///
/// # Errors
///
/// Returns [`DiccError::InvalidConfig`] if any check fails.
pub fn validate_document(raw: &RawValue, mode: ParserMode) -> Result<Sections<'_>> {
    tracing::info!("validating config document");
    let entries: &[(Key, RawValue)] = match raw {
        RawValue::Map(entries) => entries.as_slice(),
        other => {
            return Err(DiccError::invalid(format!(
                "config must be a map, got {}",
                other.kind()
            )));
        }
    };

    let mut sections = Sections::default();
    for (key, value) in entries {
        match key.as_name() {
            Some(PARAMETERS_KEY) => {
                if mode == ParserMode::Strict {
                    return Err(DiccError::invalid(
                        "a \"parameters\" section is not allowed here; set parameters through the host configuration",
                    ));
                }
                sections.parameters = Some(section(PARAMETERS_KEY, value)?);
            }
            Some(SERVICES_KEY) => sections.services = Some(section(SERVICES_KEY, value)?),
            _ => {
                return Err(DiccError::invalid(format!(
                    "unexpected top-level key \"{key}\" (expected \"{PARAMETERS_KEY}\" or \"{SERVICES_KEY}\")"
                )));
            }
        }
    }
    Ok(sections)
}

fn section<'a>(name: &str, value: &'a RawValue) -> Result<&'a [(Key, RawValue)]> {
    match value {
        RawValue::Map(entries) => Ok(entries),
        RawValue::Null => Ok(&[]),
        other => Err(DiccError::invalid(format!(
            "\"{name}\" must be a map, got {}",
            other.kind()
        ))),
    }
}

/// Rejects keys a service map does not understand.
///
/// # Errors
///
/// Returns [`DiccError::InvalidConfig`] naming the first unknown key.
pub fn check_service_keys(id: &str, entries: &[(Key, RawValue)]) -> Result<()> {
    for (key, _) in entries {
        if !key.as_name().is_some_and(|name| SERVICE_KEYS.contains(&name)) {
            return Err(DiccError::invalid(format!(
                "service \"{id}\" has unknown key \"{key}\""
            )));
        }
    }
    Ok(())
}
