//! # dicc-compiler
//!
//! Compiles declarative service configuration into generated container
//! source code.
//!
//! Handles:
//! - **Value**: The tagged IR for configured values and the raw input tree.
//! - **Expression**: Scanning of `%parameter%` interpolation and `@` sigils.
//! - **Parser**: Validation and walking of the raw config document.
//! - **Builder**: The in-memory store of definitions, aliases, and parameters.
//! - **Resolver**: Substitution of parameter references.
//! - **Graph**: Circular constructor reference detection.
//! - **Dumper**: Emission of the generated container class.
//! - **Compile**: The load, parse, check, dump pipeline.

pub mod builder;
pub mod compile;
pub mod definition;
pub mod dumper;
pub mod expression;
pub mod graph;
pub mod parser;
pub mod resolver;
pub mod value;

pub use builder::{ContainerBuilder, Entry};
pub use definition::{CallTarget, Configurator, MethodCall, ServiceDefinition};
pub use dumper::{DumpOptions, php::PhpDumper};
pub use value::{Key, Part, RawValue, Scalar, Value};
