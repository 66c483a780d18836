//! End-to-end compilation: load documents, parse, check, dump.

use std::path::Path;

use dicc_common::config::CompilerConfig;
use dicc_common::constants::{JSON_EXTENSIONS, YAML_EXTENSIONS};
use dicc_common::error::{DiccError, Result};

use crate::builder::ContainerBuilder;
use crate::dumper::php::PhpDumper;
use crate::dumper::{DumpOptions, Dumper};
use crate::graph::ReferenceGraph;
use crate::parser::ConfigParser;
use crate::value::RawValue;

/// Reads a JSON or YAML config document, chosen by file extension.
///
/// # Errors
///
/// Returns [`DiccError::Io`] if the file cannot be read,
/// [`DiccError::InvalidConfig`] for an unsupported extension, and a
/// decoding error for malformed content.
pub fn load_document(path: &Path) -> Result<RawValue> {
    tracing::info!(path = %path.display(), "loading config document");
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let is_json = JSON_EXTENSIONS.contains(&extension.as_str());
    let is_yaml = YAML_EXTENSIONS.contains(&extension.as_str());
    if !is_json && !is_yaml {
        return Err(DiccError::invalid(format!(
            "unsupported config file {} (expected .json, .yml or .yaml)",
            path.display()
        )));
    }

    let text = std::fs::read_to_string(path).map_err(|source| DiccError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if is_json {
        RawValue::from_json_str(&text)
    } else {
        RawValue::from_yaml_str(&text)
    }
}

/// Parses every document, in order, into one builder.
///
/// Later documents override ids and parameters of earlier ones.
///
/// # Errors
///
/// Returns the first parse error.
pub fn build<'a>(
    documents: impl IntoIterator<Item = &'a RawValue>,
    config: &CompilerConfig,
) -> Result<ContainerBuilder> {
    let parser = ConfigParser::new(config.mode);
    let mut builder = ContainerBuilder::new();
    for document in documents {
        parser.parse_into(document, &mut builder)?;
    }
    Ok(builder)
}

/// Checks a builder and renders its container class.
///
/// # Errors
///
/// Returns [`DiccError::CyclicAlias`] for looping aliases whatever the
/// settings, [`DiccError::CircularReference`] when reference checking is
/// enabled and constructors depend on each other in a loop, or any error
/// raised by the dumper.
pub fn dump(builder: &ContainerBuilder, config: &CompilerConfig) -> Result<String> {
    builder.check_aliases()?;
    if config.check_references {
        ReferenceGraph::from_builder(builder).check()?;
    }
    PhpDumper::new(DumpOptions::from(config)).dump(builder)
}

/// Compiles one document into container source.
///
/// # Errors
///
/// See [`build`] and [`dump`].
pub fn compile(document: &RawValue, config: &CompilerConfig) -> Result<String> {
    let builder = build([document], config)?;
    dump(&builder, config)
}

/// Loads, merges, and compiles the given files.
///
/// # Errors
///
/// See [`load_document`], [`build`] and [`dump`].
pub fn compile_files<P: AsRef<Path>>(paths: &[P], config: &CompilerConfig) -> Result<String> {
    let documents = paths
        .iter()
        .map(|path| load_document(path.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let builder = build(&documents, config)?;
    dump(&builder, config)
}
