//! Compiler configuration model.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BASE_CLASS, DEFAULT_CLASS_NAME};

/// How the config parser treats a `parameters` section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserMode {
    /// Parameters are accepted and resolved from the document.
    #[default]
    WithParameters,
    /// Parameters must come from the host configuration; a `parameters`
    /// section is rejected.
    Strict,
}

/// Root configuration for one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Name of the generated container class.
    pub class_name: String,
    /// Base container class the generated class extends.
    pub base_class: String,
    /// Parameter handling of the config parser.
    pub mode: ParserMode,
    /// Whether circular constructor references abort the compilation.
    pub check_references: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_CLASS_NAME.into(),
            base_class: DEFAULT_BASE_CLASS.into(),
            mode: ParserMode::default(),
            check_references: true,
        }
    }
}
