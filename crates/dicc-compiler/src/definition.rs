//! Service definitions: the recipe for building one service.

use dicc_common::types::ServiceId;
use serde::Serialize;

use crate::value::{Key, Scalar, Value};

/// A method invoked on the fresh instance after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodCall {
    /// Method name.
    pub method: String,
    /// Arguments; index keys are positional, name keys are named.
    pub arguments: Vec<(Key, Value)>,
}

impl MethodCall {
    /// Creates a call with positional arguments.
    pub fn new(method: impl Into<String>, arguments: impl IntoIterator<Item = Value>) -> Self {
        Self {
            method: method.into(),
            arguments: crate::value::indexed(arguments),
        }
    }
}

/// Callable run against the instance once it is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Configurator {
    /// Plain function, called with the instance.
    Function {
        /// Function name.
        name: String,
    },
    /// Method on another service.
    ServiceMethod {
        /// Service providing the method.
        service: ServiceId,
        /// Method name.
        method: String,
    },
    /// Static method on a class named literally in the config.
    ClassMethod {
        /// Class name.
        class: String,
        /// Method name.
        method: String,
    },
    /// Static method on a class computed from parameters.
    StaticMethod {
        /// Class expression.
        target: Value,
        /// Method name.
        method: String,
    },
}

/// How an instance gets constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CallTarget<'a> {
    /// `new` on a literal class name.
    New {
        /// Class name.
        class: &'a str,
    },
    /// `new` on a class name only known at run time.
    DynamicNew {
        /// Class expression.
        class: &'a Value,
    },
    /// Static factory method on a class.
    StaticFactory {
        /// Class expression.
        class: &'a Value,
        /// Factory method name.
        method: &'a str,
    },
}

/// Declarative recipe for one service id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceDefinition {
    /// Class to instantiate.
    pub class: Value,
    /// Whether the instance is cached after first use.
    pub shared: bool,
    /// Static factory method replacing `new`.
    pub constructor: Option<String>,
    /// File required before instantiation.
    pub file: Option<Value>,
    /// Constructor arguments.
    pub arguments: Vec<(Key, Value)>,
    /// Callable configuring the built instance.
    pub configurator: Option<Configurator>,
    /// Methods called on the built instance, in order.
    pub method_calls: Vec<MethodCall>,
}

impl ServiceDefinition {
    /// Creates a shared definition for `class` with no arguments.
    pub fn new(class: impl Into<Value>) -> Self {
        Self {
            class: class.into(),
            shared: true,
            constructor: None,
            file: None,
            arguments: Vec::new(),
            configurator: None,
            method_calls: Vec::new(),
        }
    }

    /// Sets whether the instance is shared.
    #[must_use]
    pub const fn with_shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }

    /// Sets the static factory method.
    #[must_use]
    pub fn with_constructor(mut self, method: impl Into<String>) -> Self {
        self.constructor = Some(method.into());
        self
    }

    /// Sets the file to require.
    #[must_use]
    pub fn with_file(mut self, file: Value) -> Self {
        self.file = Some(file);
        self
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn with_argument(mut self, value: Value) -> Self {
        let next = self
            .arguments
            .iter()
            .filter_map(|(key, _)| match key {
                Key::Index(index) => Some(index + 1),
                Key::Name(_) => None,
            })
            .max()
            .unwrap_or(0);
        self.arguments.push((Key::Index(next), value));
        self
    }

    /// Appends a named argument.
    #[must_use]
    pub fn with_named_argument(mut self, name: impl Into<String>, value: Value) -> Self {
        self.arguments.push((Key::Name(name.into()), value));
        self
    }

    /// Sets the configurator.
    #[must_use]
    pub fn with_configurator(mut self, configurator: Configurator) -> Self {
        self.configurator = Some(configurator);
        self
    }

    /// Appends a method call.
    #[must_use]
    pub fn with_method_call(mut self, call: MethodCall) -> Self {
        self.method_calls.push(call);
        self
    }

    /// Classifies how the instance is constructed.
    pub fn call_target(&self) -> CallTarget<'_> {
        match (&self.constructor, &self.class) {
            (Some(method), class) => CallTarget::StaticFactory { class, method },
            (None, Value::Scalar(Scalar::String(class))) => CallTarget::New { class },
            (None, class) => CallTarget::DynamicNew { class },
        }
    }

    /// Services needed before the constructor can run.
    ///
    /// Method calls and configurators run on a built instance and are not
    /// included.
    pub fn constructor_references(&self) -> Vec<&ServiceId> {
        let mut refs = Vec::new();
        self.class.collect_service_references(&mut refs);
        if let Some(file) = &self.file {
            file.collect_service_references(&mut refs);
        }
        for (_, argument) in &self.arguments {
            argument.collect_service_references(&mut refs);
        }
        refs
    }
}

/// Whether `name` can be emitted as a bare class, function, or method name.
///
/// With `allow_namespace`, namespace segments separated by `\` and a
/// leading `\` are accepted.
#[must_use]
pub fn is_identifier(name: &str, allow_namespace: bool) -> bool {
    let name = if allow_namespace {
        name.strip_prefix('\\').unwrap_or(name)
    } else {
        name
    };
    let valid_segment = |segment: &str| {
        let mut chars = segment.chars();
        chars
            .next()
            .is_some_and(|c| c == '_' || c.is_alphabetic())
            && chars.all(|c| c == '_' || c.is_alphanumeric())
    };
    if allow_namespace {
        name.split('\\').all(valid_segment)
    } else {
        valid_segment(name)
    }
}
