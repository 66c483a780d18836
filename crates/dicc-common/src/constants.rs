//! Compiler-wide constants and defaults.

/// Id under which the running container exposes itself.
pub const SERVICE_CONTAINER_ID: &str = "service_container";

/// Default name of the generated container class.
pub const DEFAULT_CLASS_NAME: &str = "ProjectServiceContainer";

/// Default base class the generated container extends.
pub const DEFAULT_BASE_CLASS: &str = "Container";

/// Top-level section holding parameters.
pub const PARAMETERS_KEY: &str = "parameters";

/// Top-level section holding service entries.
pub const SERVICES_KEY: &str = "services";

/// Sigil marking a service reference.
pub const SERVICE_SIGIL: char = '@';

/// Delimiter around parameter names.
pub const PARAMETER_DELIMITER: char = '%';

/// File extensions accepted for JSON documents.
pub const JSON_EXTENSIONS: &[&str] = &["json"];

/// File extensions accepted for YAML documents.
pub const YAML_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Application name used in CLI output.
pub const APP_NAME: &str = "dicc";
