//! Source generation from a [`ContainerBuilder`].
//!
//! A dumper turns the builder's graph into the text of a container class
//! that extends the runtime base container. Output depends only on the
//! builder contents and the [`DumpOptions`].

pub mod php;

use std::collections::BTreeMap;

use dicc_common::config::CompilerConfig;
use dicc_common::constants::{DEFAULT_BASE_CLASS, DEFAULT_CLASS_NAME};
use dicc_common::error::{DiccError, Result};

use crate::builder::ContainerBuilder;

/// Names used for the generated class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    /// Name of the generated class.
    pub class_name: String,
    /// Base container class it extends.
    pub base_class: String,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_CLASS_NAME.into(),
            base_class: DEFAULT_BASE_CLASS.into(),
        }
    }
}

impl From<&CompilerConfig> for DumpOptions {
    fn from(config: &CompilerConfig) -> Self {
        Self {
            class_name: config.class_name.clone(),
            base_class: config.base_class.clone(),
        }
    }
}

/// Emits generated source for a builder.
pub trait Dumper {
    /// Renders the whole container class.
    ///
    /// # Errors
    ///
    /// Returns an error if some value cannot be represented in source.
    fn dump(&self, builder: &ContainerBuilder) -> Result<String>;
}

/// Camel-cases a service id: `foo_bar` becomes `FooBar`, `foo.bar`
/// becomes `Foo_Bar`.
///
/// Characters other than letters and digits act as word breaks and are
/// dropped.
#[must_use]
pub fn camelize(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut upper = true;
    for c in id.chars() {
        if c == '.' {
            out.push('_');
            upper = true;
        } else if c.is_alphanumeric() {
            if upper {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            upper = false;
        } else {
            upper = true;
        }
    }
    out
}

/// Name of the accessor generated for `id`.
#[must_use]
pub fn accessor_name(id: &str) -> String {
    format!("get{}Service", camelize(id))
}

/// Maps each id of `builder` to its accessor, in builder order.
///
/// # Errors
///
/// Returns [`DiccError::InvalidConfig`] if an id has no letters or digits,
/// or if two ids camel-case to the same accessor.
pub fn accessor_table(builder: &ContainerBuilder) -> Result<Vec<(&str, String)>> {
    let mut taken: BTreeMap<String, &str> = BTreeMap::new();
    let mut table = Vec::new();

    for id in builder.service_ids() {
        if !id.chars().any(char::is_alphanumeric) {
            return Err(DiccError::invalid(format!(
                "service id \"{id}\" cannot be turned into an accessor name"
            )));
        }
        let accessor = accessor_name(id);
        if let Some(other) = taken.insert(accessor.clone(), id) {
            return Err(DiccError::invalid(format!(
                "service ids \"{other}\" and \"{id}\" both map to accessor {accessor}"
            )));
        }
        table.push((id, accessor));
    }

    Ok(table)
}
