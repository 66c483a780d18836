//! Formatted output for `dicc inspect`.

use std::collections::BTreeMap;
use std::fmt::Write;

use dicc_compiler::{Configurator, ContainerBuilder, Key, ServiceDefinition, Value};
use serde::Serialize;

/// Everything a configuration declares, ready for printing.
#[derive(Debug, Serialize)]
pub struct Report {
    /// Definitions by id.
    pub services: BTreeMap<String, ServiceDefinition>,
    /// Alias targets by alias id.
    pub aliases: BTreeMap<String, String>,
    /// Parameters by normalized key.
    pub parameters: BTreeMap<String, Value>,
    /// Construction order, absent when constructors reference each other in
    /// a loop.
    pub build_order: Option<Vec<String>>,
}

impl Report {
    /// Snapshots the contents of `builder`.
    #[must_use]
    pub fn from_builder(builder: &ContainerBuilder) -> Self {
        Self {
            services: builder
                .definitions()
                .map(|(id, definition)| (id.to_string(), definition.clone()))
                .collect(),
            aliases: builder.aliases(),
            parameters: builder
                .parameters()
                .iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect(),
            build_order: None,
        }
    }

    /// Renders the report as indented text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Services ({})", self.services.len());
        for (id, definition) in &self.services {
            render_service(&mut out, id, definition);
        }

        if !self.aliases.is_empty() {
            let _ = writeln!(out, "\nAliases ({})", self.aliases.len());
            for (alias, target) in &self.aliases {
                let _ = writeln!(out, "  {alias} -> {target}");
            }
        }

        if !self.parameters.is_empty() {
            let _ = writeln!(out, "\nParameters ({})", self.parameters.len());
            for (key, value) in &self.parameters {
                let _ = writeln!(out, "  {key} = {value}");
            }
        }

        match &self.build_order {
            Some(order) if !order.is_empty() => {
                let _ = writeln!(out, "\nBuild order: {}", order.join(", "));
            }
            Some(_) => {}
            None => out.push_str("\nBuild order: unavailable (circular references)\n"),
        }

        out
    }
}

fn render_service(out: &mut String, id: &str, definition: &ServiceDefinition) {
    let scope = if definition.shared { "shared" } else { "prototype" };
    let _ = writeln!(out, "  + {id}: {} [{scope}]", definition.class);
    if let Some(constructor) = &definition.constructor {
        let _ = writeln!(out, "      constructor: {constructor}");
    }
    if let Some(file) = &definition.file {
        let _ = writeln!(out, "      file: {file}");
    }
    if !definition.arguments.is_empty() {
        let _ = writeln!(out, "      arguments: {}", format_arguments(&definition.arguments));
    }
    for call in &definition.method_calls {
        let _ = writeln!(
            out,
            "      call: {}({})",
            call.method,
            format_arguments(&call.arguments)
        );
    }
    if let Some(configurator) = &definition.configurator {
        let _ = writeln!(out, "      configurator: {}", format_configurator(configurator));
    }
}

/// Formats arguments as `a, b, name: c`.
#[must_use]
pub fn format_arguments(arguments: &[(Key, Value)]) -> String {
    arguments
        .iter()
        .map(|(key, value)| match key {
            Key::Index(_) => value.to_string(),
            Key::Name(name) => format!("{name}: {value}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Formats a configurator as the callable it invokes.
#[must_use]
pub fn format_configurator(configurator: &Configurator) -> String {
    match configurator {
        Configurator::Function { name } => name.clone(),
        Configurator::ServiceMethod { service, method } => format!("@{service}->{method}"),
        Configurator::ClassMethod { class, method } => format!("{class}::{method}"),
        Configurator::StaticMethod { target, method } => format!("{target}::{method}"),
    }
}
