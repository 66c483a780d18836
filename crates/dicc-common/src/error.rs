//! Unified error types for the dicc workspace.
//!
//! Every failure is fatal: a compilation either succeeds completely or is
//! discarded, so callers only ever see one of these variants.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum DiccError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration document has an invalid shape.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A service entry lacks a required field.
    #[error("service \"{service}\" is missing required field \"{field}\"")]
    MissingField {
        /// Id of the offending service.
        service: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// A service, alias, or parameter was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing entry.
        kind: &'static str,
        /// Identifier of the missing entry.
        id: String,
    },

    /// A value cannot be turned into source text.
    #[error("unable to dump value: {message}")]
    Unserializable {
        /// Description of the value that could not be dumped.
        message: String,
    },

    /// An alias chain loops back on itself.
    #[error("cyclic alias: {}", chain.join(" -> "))]
    CyclicAlias {
        /// Ids visited, ending with the repeated one.
        chain: Vec<String>,
    },

    /// Services or parameters reference each other in a loop.
    #[error("circular reference: {}", path.join(" -> "))]
    CircularReference {
        /// Ids taking part in the cycle.
        path: Vec<String>,
    },

    /// JSON decoding failed.
    #[error("JSON error: {source}")]
    Json {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// YAML decoding failed.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying serialization error.
        #[from]
        source: serde_yaml::Error,
    },
}

impl DiccError {
    /// Shorthand for an [`DiccError::InvalidConfig`] error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, DiccError>;
