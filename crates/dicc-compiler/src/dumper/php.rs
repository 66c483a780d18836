//! PHP container class generation.
//!
//! Emits one accessor per id, an id-to-accessor table backing the
//! `hasService` / `getService` / `getServiceIds` overrides, and when
//! parameters exist a constructor seeding the base container with
//! `getDefaultParameters()`.

use std::fmt::Write;

use dicc_common::constants::SERVICE_CONTAINER_ID;
use dicc_common::error::{DiccError, Result};

use super::{DumpOptions, Dumper, accessor_table};
use crate::builder::{ContainerBuilder, Entry};
use crate::definition::{CallTarget, Configurator, ServiceDefinition, is_identifier};
use crate::value::{Key, Part, Scalar, Value};

/// Generates a PHP class extending the runtime base container.
#[derive(Debug, Clone, Default)]
pub struct PhpDumper {
    options: DumpOptions,
}

impl PhpDumper {
    /// Creates a dumper with the given class names.
    #[must_use]
    pub const fn new(options: DumpOptions) -> Self {
        Self { options }
    }

    fn start_class(&self, out: &mut String) -> Result<()> {
        check_class_name("class name", &self.options.class_name)?;
        check_class_name("base class", &self.options.base_class)?;
        let _ = write!(
            out,
            "<?php\n\nclass {} extends {}\n{{\n",
            self.options.class_name, self.options.base_class
        );
        Ok(())
    }
}

impl Dumper for PhpDumper {
    fn dump(&self, builder: &ContainerBuilder) -> Result<String> {
        tracing::info!(class = %self.options.class_name, "dumping container");
        let accessors = accessor_table(builder)?;
        builder.check_aliases()?;
        let mut out = String::new();

        self.start_class(&mut out)?;
        add_service_table(&mut out, &accessors);
        if !builder.parameters().is_empty() {
            add_constructor(&mut out);
        }
        add_lookup_overrides(&mut out);

        for ((id, entry), (_, accessor)) in builder.entries().zip(&accessors) {
            match entry {
                Entry::Definition(definition) => {
                    add_service(&mut out, id.as_str(), accessor, definition)?;
                }
                Entry::Alias(target) => add_alias(&mut out, accessor, target.as_str()),
            }
        }

        if !builder.parameters().is_empty() {
            add_default_parameters(&mut out, builder)?;
        }
        out.push_str("}\n");
        Ok(out)
    }
}

fn add_service_table(out: &mut String, accessors: &[(&str, String)]) {
    out.push_str("  protected static $serviceMethods = array(\n");
    for (id, accessor) in accessors {
        let _ = writeln!(out, "    {} => '{accessor}',", quote(id));
    }
    out.push_str("  );\n");
}

fn add_constructor(out: &mut String) {
    out.push_str(
        "
  public function __construct()
  {
    parent::__construct($this->getDefaultParameters());
  }
",
    );
}

fn add_lookup_overrides(out: &mut String) {
    out.push_str(
        "
  public function hasService($id)
  {
    return isset(self::$serviceMethods[$id]) || parent::hasService($id);
  }

  public function getService($id)
  {
    if (isset(self::$serviceMethods[$id]) && !parent::hasService($id)) {
      return $this->{self::$serviceMethods[$id]}();
    }

    return parent::getService($id);
  }

  public function getServiceIds()
  {
    return array_values(array_unique(array_merge(array_keys(self::$serviceMethods), parent::getServiceIds())));
  }
",
    );
}

fn add_alias(out: &mut String, accessor: &str, target: &str) {
    let _ = write!(
        out,
        "\n  protected function {accessor}()\n  {{\n    return {};\n  }}\n",
        service_call(target)
    );
}

fn add_service(
    out: &mut String,
    id: &str,
    accessor: &str,
    definition: &ServiceDefinition,
) -> Result<()> {
    tracing::debug!(id, accessor, "dumping service");
    let _ = write!(out, "\n  protected function {accessor}()\n  {{\n");

    if let Some(file) = &definition.file {
        let _ = write!(out, "    require_once {};\n\n", dump_value(file)?);
    }

    add_instance(out, id, definition)?;

    for call in &definition.method_calls {
        check_identifier(id, "method", &call.method, false)?;
        let _ = writeln!(
            out,
            "    $instance->{}({});",
            call.method,
            dump_arguments(id, &call.arguments)?
        );
    }

    if let Some(configurator) = &definition.configurator {
        add_configurator(out, id, configurator)?;
    }

    if definition.shared {
        let _ = writeln!(out, "    $this->setService({}, $instance);", quote(id));
    }
    out.push_str("\n    return $instance;\n  }\n");
    Ok(())
}

fn add_instance(out: &mut String, id: &str, definition: &ServiceDefinition) -> Result<()> {
    let arguments = dump_arguments(id, &definition.arguments)?;
    match definition.call_target() {
        CallTarget::New { class } => {
            check_identifier(id, "class", class, true)?;
            let _ = writeln!(out, "    $instance = new {class}({arguments});");
        }
        CallTarget::DynamicNew { class } => {
            let _ = writeln!(out, "    $class = {};", dump_value(class)?);
            let _ = writeln!(out, "    $instance = new $class({arguments});");
        }
        CallTarget::StaticFactory { class, method } => {
            check_identifier(id, "constructor", method, false)?;
            match class {
                Value::Scalar(Scalar::String(name)) => {
                    check_identifier(id, "class", name, true)?;
                    let _ = writeln!(out, "    $instance = {name}::{method}({arguments});");
                }
                dynamic => {
                    let _ = writeln!(out, "    $class = {};", dump_value(dynamic)?);
                    let _ = writeln!(out, "    $instance = $class::{method}({arguments});");
                }
            }
        }
    }
    Ok(())
}

fn add_configurator(out: &mut String, id: &str, configurator: &Configurator) -> Result<()> {
    match configurator {
        Configurator::Function { name } => {
            check_identifier(id, "configurator", name, true)?;
            let _ = writeln!(out, "    {name}($instance);");
        }
        Configurator::ServiceMethod { service, method } => {
            check_identifier(id, "configurator method", method, false)?;
            let _ = writeln!(
                out,
                "    {}->{method}($instance);",
                service_call(service.as_str())
            );
        }
        Configurator::ClassMethod { class, method } => {
            check_identifier(id, "configurator class", class, true)?;
            check_identifier(id, "configurator method", method, false)?;
            let _ = writeln!(out, "    {class}::{method}($instance);");
        }
        Configurator::StaticMethod { target, method } => {
            let _ = writeln!(
                out,
                "    call_user_func(array({}, {}), $instance);",
                dump_value(target)?,
                quote(method)
            );
        }
    }
    Ok(())
}

fn add_default_parameters(out: &mut String, builder: &ContainerBuilder) -> Result<()> {
    out.push_str("\n  protected function getDefaultParameters()\n  {\n    return array(\n");
    for (key, value) in builder.parameters() {
        let _ = writeln!(
            out,
            "      {} => {},",
            quote(key.as_str()),
            render(value, Context::ParameterBag)?
        );
    }
    out.push_str("    );\n  }\n");
    Ok(())
}

/// Renders call arguments: index keys positionally, name keys as PHP
/// named arguments.
///
/// # Errors
///
/// Returns an error if a value cannot be dumped, a named argument is not a
/// valid identifier, or a positional argument follows a named one.
pub fn dump_arguments(id: &str, arguments: &[(Key, Value)]) -> Result<String> {
    let mut rendered = Vec::with_capacity(arguments.len());
    let mut named_seen = false;
    for (key, value) in arguments {
        match key {
            Key::Index(_) if named_seen => {
                return Err(DiccError::invalid(format!(
                    "service \"{id}\": positional argument {key} follows a named argument"
                )));
            }
            Key::Index(_) => rendered.push(dump_value(value)?),
            Key::Name(name) => {
                check_identifier(id, "argument name", name, false)?;
                named_seen = true;
                rendered.push(format!("{name}: {}", dump_value(value)?));
            }
        }
    }
    Ok(rendered.join(", "))
}

/// Renders a value as a PHP expression evaluated inside the container.
///
/// # Errors
///
/// Returns [`DiccError::Unserializable`] for [`Value::Opaque`] anywhere in
/// the value.
pub fn dump_value(value: &Value) -> Result<String> {
    render(value, Context::Code)
}

/// Where a dumped value ends up at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// Passed straight to constructors, calls, and configurators.
    Code,
    /// Stored in the base container's parameter bag, which reads `%%` as
    /// an escaped `%`.
    ParameterBag,
}

fn render(value: &Value, context: Context) -> Result<String> {
    match value {
        Value::Scalar(Scalar::String(s)) if context == Context::ParameterBag => {
            Ok(quote(&s.replace('%', "%%")))
        }
        Value::Scalar(scalar) => Ok(dump_scalar(scalar)),
        Value::ListOf(items) => {
            let entries = items
                .iter()
                .map(|(key, item)| Ok(format!("{} => {}", dump_key(key), render(item, context)?)))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("array({})", entries.join(", ")))
        }
        Value::ServiceReference(id) => Ok(service_call(id.as_str())),
        Value::ParameterReference(key) => Ok(parameter_call(key.as_str())),
        Value::ParameterStringExpression(parts) => Ok(parts
            .iter()
            .map(|part| match part {
                Part::Literal(text) if context == Context::ParameterBag => {
                    quote(&text.replace('%', "%%"))
                }
                Part::Literal(text) => quote(text),
                Part::Parameter(key) => parameter_call(key.as_str()),
            })
            .collect::<Vec<_>>()
            .join(".")),
        Value::Opaque(type_name) => Err(DiccError::Unserializable {
            message: format!(
                "{type_name} is a runtime object or resource and has no source representation"
            ),
        }),
    }
}

/// Renders a scalar literal exactly as the running code should see it.
///
/// Strings are emitted verbatim. Only values written into
/// `getDefaultParameters` get their `%` doubled, since the parameter bag
/// unescapes `%%` when read.
#[must_use]
pub fn dump_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".into(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i64::MIN) => "PHP_INT_MIN".into(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(x) if x.is_nan() => "NAN".into(),
        Scalar::Float(x) if x.is_infinite() && x.is_sign_positive() => "INF".into(),
        Scalar::Float(x) if x.is_infinite() => "-INF".into(),
        Scalar::Float(x) => format!("{x:?}"),
        Scalar::String(s) => quote(s),
    }
}

fn dump_key(key: &Key) -> String {
    match key {
        Key::Index(index) => index.to_string(),
        Key::Name(name) => quote(name),
    }
}

fn service_call(id: &str) -> String {
    if id == SERVICE_CONTAINER_ID {
        "$this".into()
    } else {
        format!("$this->getService({})", quote(id))
    }
}

fn parameter_call(key: &str) -> String {
    format!("$this->getParameter({})", quote(&key.to_lowercase()))
}

/// Single-quoted PHP string literal.
fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn check_identifier(id: &str, what: &str, name: &str, allow_namespace: bool) -> Result<()> {
    if is_identifier(name, allow_namespace) {
        Ok(())
    } else {
        Err(DiccError::invalid(format!(
            "service \"{id}\": invalid {what} \"{name}\""
        )))
    }
}

fn check_class_name(what: &str, name: &str) -> Result<()> {
    if is_identifier(name, true) {
        Ok(())
    } else {
        Err(DiccError::invalid(format!("invalid {what} \"{name}\"")))
    }
}

#[cfg(test)]
mod tests {
    use dicc_common::types::ParameterKey;

    use super::*;
    use crate::definition::MethodCall;
    use crate::expression::resolve_str;

    fn dump(builder: &ContainerBuilder) -> String {
        PhpDumper::default().dump(builder).expect("should dump")
    }

    #[test]
    fn dump_empty_container() {
        let code = dump(&ContainerBuilder::new());
        assert!(code.starts_with("<?php\n\nclass ProjectServiceContainer extends Container\n{\n"));
        assert!(code.contains("protected static $serviceMethods = array(\n  );"));
        assert!(!code.contains("__construct"));
        assert!(!code.contains("getDefaultParameters"));
        assert!(code.ends_with("}\n"));
    }

    #[test]
    fn dump_uses_custom_class_names() {
        let options = DumpOptions {
            class_name: "AppContainer".into(),
            base_class: "\\Framework\\Container".into(),
        };
        let code = PhpDumper::new(options)
            .dump(&ContainerBuilder::new())
            .expect("should dump");
        assert!(code.contains("class AppContainer extends \\Framework\\Container"));
    }

    #[test]
    fn dump_rejects_bad_class_name() {
        let options = DumpOptions {
            class_name: "App Container".into(),
            ..DumpOptions::default()
        };
        assert!(PhpDumper::new(options).dump(&ContainerBuilder::new()).is_err());
    }

    #[test]
    fn dump_shared_service() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "foo",
            ServiceDefinition::new("FooClass")
                .with_argument(Value::service("bar"))
                .with_argument(Value::string("x")),
        );
        let code = dump(&builder);
        assert!(code.contains("    'foo' => 'getFooService',\n"));
        assert!(code.contains(
            "  protected function getFooService()
  {
    $instance = new FooClass($this->getService('bar'), 'x');
    $this->setService('foo', $instance);

    return $instance;
  }
"
        ));
    }

    #[test]
    fn dump_non_shared_service_is_not_cached() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "foo",
            ServiceDefinition::new("FooClass").with_shared(false),
        );
        let code = dump(&builder);
        assert!(!code.contains("setService('foo'"));
        assert!(code.contains("    $instance = new FooClass();\n\n    return $instance;"));
    }

    #[test]
    fn dump_full_definition() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "mailer",
            ServiceDefinition::new("Mailer")
                .with_file(resolve_str("%lib_dir%/mailer.php"))
                .with_constructor("create")
                .with_named_argument("transport", Value::service("transport"))
                .with_method_call(MethodCall::new("setLogger", [Value::service("logger")]))
                .with_configurator(Configurator::ServiceMethod {
                    service: "configurator".into(),
                    method: "configure".into(),
                }),
        );
        let code = dump(&builder);
        assert!(code.contains(
            "    require_once $this->getParameter('lib_dir').'/mailer.php';\n\n"
        ));
        assert!(code.contains(
            "    $instance = Mailer::create(transport: $this->getService('transport'));\n"
        ));
        assert!(code.contains("    $instance->setLogger($this->getService('logger'));\n"));
        assert!(code.contains("    $this->getService('configurator')->configure($instance);\n"));
    }

    #[test]
    fn dump_dynamic_class_binds_local() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "foo",
            ServiceDefinition::new(Value::parameter("foo.class")),
        );
        let code = dump(&builder);
        assert!(code.contains(
            "    $class = $this->getParameter('foo.class');\n    $instance = new $class();\n"
        ));
    }

    #[test]
    fn dump_dynamic_static_factory() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "foo",
            ServiceDefinition::new(Value::parameter("foo.class")).with_constructor("build"),
        );
        let code = dump(&builder);
        assert!(code.contains("    $instance = $class::build();\n"));
    }

    #[test]
    fn dump_configurator_shapes() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "a",
            ServiceDefinition::new("A").with_configurator(Configurator::Function {
                name: "configure_a".into(),
            }),
        );
        let _ = builder.set_service_definition(
            "b",
            ServiceDefinition::new("B").with_configurator(Configurator::ClassMethod {
                class: "BConfigurator".into(),
                method: "setup".into(),
            }),
        );
        let _ = builder.set_service_definition(
            "c",
            ServiceDefinition::new("C").with_configurator(Configurator::StaticMethod {
                target: Value::parameter("c.configurator"),
                method: "setup".into(),
            }),
        );
        let code = dump(&builder);
        assert!(code.contains("    configure_a($instance);\n"));
        assert!(code.contains("    BConfigurator::setup($instance);\n"));
        assert!(code.contains(
            "    call_user_func(array($this->getParameter('c.configurator'), 'setup'), $instance);\n"
        ));
    }

    #[test]
    fn dump_rejects_invalid_configurator_class() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "a",
            ServiceDefinition::new("A").with_configurator(Configurator::ClassMethod {
                class: "Not-A-Class".into(),
                method: "setup".into(),
            }),
        );
        let err = PhpDumper::default().dump(&builder).unwrap_err();
        assert!(err.to_string().contains("Not-A-Class"), "got: {err}");
    }

    #[test]
    fn dump_rejects_cyclic_alias() {
        let mut builder = ContainerBuilder::new();
        builder.set_alias("a", "b");
        builder.set_alias("b", "a");
        let err = PhpDumper::default().dump(&builder).unwrap_err();
        assert!(matches!(err, DiccError::CyclicAlias { .. }), "got: {err}");
    }

    #[test]
    fn dump_alias_delegates() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition("foo", ServiceDefinition::new("FooClass"));
        builder.set_alias("alias_for_foo", "foo");
        builder.set_alias("container", SERVICE_CONTAINER_ID);
        let code = dump(&builder);
        assert!(code.contains("    'alias_for_foo' => 'getAliasForFooService',\n"));
        assert!(code.contains(
            "  protected function getAliasForFooService()\n  {\n    return $this->getService('foo');\n  }\n"
        ));
        assert!(code.contains(
            "  protected function getContainerService()\n  {\n    return $this;\n  }\n"
        ));
    }

    #[test]
    fn dump_parameters_adds_constructor_and_defaults() {
        let mut builder = ContainerBuilder::new();
        builder.set_parameter("Foo", Value::string("bar"));
        builder.set_parameter("ratio", Value::string("50%"));
        builder.set_parameter("hosts", Value::list([Value::string("a"), Value::string("b")]));
        let code = dump(&builder);
        assert!(code.contains("parent::__construct($this->getDefaultParameters());"));
        assert!(code.contains(
            "    return array(
      'foo' => 'bar',
      'hosts' => array(0 => 'a', 1 => 'b'),
      'ratio' => '50%%',
    );"
        ));
    }

    #[test]
    fn percent_is_doubled_only_for_parameter_defaults() {
        let mut builder = ContainerBuilder::new();
        builder.set_parameter("discount", resolve_str("50%% of %price%"));
        let _ = builder.set_service_definition(
            "promo",
            ServiceDefinition::new("Promo")
                .with_argument(resolve_str("50%% off"))
                .with_argument(resolve_str("50%% of %price%")),
        );
        let code = dump(&builder);
        assert!(code.contains(
            "    $instance = new Promo('50% off', '50% of '.$this->getParameter('price'));\n"
        ));
        assert!(code.contains("      'discount' => '50%% of '.$this->getParameter('price'),\n"));
    }

    #[test]
    fn dump_value_kinds() {
        assert_eq!(dump_value(&Value::null()).expect("dump"), "null");
        assert_eq!(
            dump_value(&Value::Scalar(Scalar::Bool(false))).expect("dump"),
            "false"
        );
        assert_eq!(
            dump_value(&Value::Scalar(Scalar::Float(1.0))).expect("dump"),
            "1.0"
        );
        assert_eq!(
            dump_value(&Value::string("it's a \\ test")).expect("dump"),
            "'it\\'s a \\\\ test'"
        );
        assert_eq!(
            dump_value(&Value::service(SERVICE_CONTAINER_ID)).expect("dump"),
            "$this"
        );
        assert_eq!(
            dump_value(&Value::ParameterReference(ParameterKey::new("Foo"))).expect("dump"),
            "$this->getParameter('foo')"
        );
        assert_eq!(
            dump_value(&Value::ListOf(vec![
                (Key::Name("host".into()), Value::string("x")),
                (Key::Index(3), Value::Scalar(Scalar::Int(-2))),
            ]))
            .expect("dump"),
            "array('host' => 'x', 3 => -2)"
        );
    }

    #[test]
    fn dump_expression_concatenates() {
        let value = resolve_str("http://%subdomain%.%base_host%/");
        assert_eq!(
            dump_value(&value).expect("dump"),
            "'http://'.$this->getParameter('subdomain').'.'.$this->getParameter('base_host').'/'"
        );
    }

    #[test]
    fn dump_opaque_is_unserializable() {
        let err = dump_value(&Value::list([Value::Opaque("!resource".into())])).unwrap_err();
        assert!(matches!(err, DiccError::Unserializable { .. }));
    }

    #[test]
    fn dump_opaque_argument_fails_whole_dump() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "foo",
            ServiceDefinition::new("Foo").with_argument(Value::Opaque("PDO".into())),
        );
        let err = PhpDumper::default().dump(&builder).unwrap_err();
        assert!(matches!(err, DiccError::Unserializable { .. }));
    }

    #[test]
    fn positional_after_named_fails() {
        let arguments = vec![
            (Key::Name("a".into()), Value::null()),
            (Key::Index(0), Value::null()),
        ];
        assert!(dump_arguments("foo", &arguments).is_err());
    }

    #[test]
    fn invalid_method_name_fails() {
        let mut builder = ContainerBuilder::new();
        let _ = builder.set_service_definition(
            "foo",
            ServiceDefinition::new("Foo").with_method_call(MethodCall::new("set-bar", Vec::new())),
        );
        assert!(PhpDumper::default().dump(&builder).is_err());
    }

    #[test]
    fn dump_is_idempotent() {
        let mut builder = ContainerBuilder::new();
        builder.set_parameter("a", Value::string("x"));
        let _ = builder.set_service_definition("foo", ServiceDefinition::new("Foo"));
        builder.set_alias("bar", "foo");
        assert_eq!(dump(&builder), dump(&builder));
    }
}
