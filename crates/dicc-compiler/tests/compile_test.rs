//! End-to-end tests for the config-to-source pipeline.
//!
//! These tests exercise the public API the way a host framework would:
//! 1. Load a document (YAML or JSON)
//! 2. Parse it into a builder
//! 3. Inspect the builder and resolve parameters
//! 4. Dump the container class

#![allow(clippy::expect_used, clippy::unwrap_used)]

use dicc_common::config::{CompilerConfig, ParserMode};
use dicc_common::error::DiccError;
use dicc_compiler::dumper::Dumper;
use dicc_compiler::expression::resolve_str;
use dicc_compiler::parser::{self, ConfigParser};
use dicc_compiler::resolver::ParameterResolver;
use dicc_compiler::{
    ContainerBuilder, Key, Part, PhpDumper, RawValue, Scalar, ServiceDefinition, Value, compile,
};
use dicc_common::types::ParameterKey;

const WEB_STACK: &str = r"
parameters:
  Base_Host: example.com
  subdomain: app
  enabled: true
  mailer.class: SmtpMailer

services:
  mailer:
    class: '%mailer.class%'
    arguments: ['@transport', 'http://%subdomain%.%base_host%/', '%enabled%']
    calls:
      - [setLogger, ['@logger']]
  transport:
    class: Transport
    shared: false
    arguments:
      host: '%base_host%'
  logger:
    class: Logger
    constructor: create
    configurator: ['@@StaticConfigurator', configure]
  alias_for_mailer: '@mailer'
";

// ── Parsing ──────────────────────────────────────────────────────────

#[test]
fn pipeline_parses_web_stack() {
    let raw = RawValue::from_yaml_str(WEB_STACK).expect("yaml");
    let builder = parser::parse(&raw).expect("parse");

    assert_eq!(
        builder.service_ids(),
        vec!["alias_for_mailer", "logger", "mailer", "transport"]
    );
    assert_eq!(builder.alias("alias_for_mailer").expect("alias").as_str(), "mailer");
    assert!(builder.has_parameter("base_host"));

    let transport = builder.service_definition("transport").expect("transport");
    assert!(!transport.shared);
    assert_eq!(
        transport.arguments,
        vec![(Key::Name("host".into()), Value::parameter("base_host"))]
    );
}

#[test]
fn round_trip_shape() {
    let raw = RawValue::map([(
        "services",
        RawValue::map([("foo", RawValue::map([("class", RawValue::from("FooClass"))]))]),
    )]);
    let builder = parser::parse(&raw).expect("parse");
    assert!(builder.has_service_definition("foo"));
    assert_eq!(
        builder.service_definition("foo").expect("foo").class,
        Value::Scalar(Scalar::String("FooClass".into()))
    );
}

#[test]
fn expression_composition() {
    let raw = RawValue::from_yaml_str(WEB_STACK).expect("yaml");
    let builder = parser::parse(&raw).expect("parse");
    let mailer = builder.service_definition("mailer").expect("mailer");
    assert_eq!(
        mailer.arguments[1].1,
        Value::ParameterStringExpression(vec![
            Part::Literal("http://".into()),
            Part::Parameter(ParameterKey::new("subdomain")),
            Part::Literal(".".into()),
            Part::Parameter(ParameterKey::new("base_host")),
            Part::Literal("/".into()),
        ])
    );
}

#[test]
fn escape_correctness() {
    assert_eq!(resolve_str("@@foo"), Value::string("@foo"));
    assert!(!matches!(resolve_str("@@foo"), Value::ServiceReference(_)));
}

#[test]
fn validation_failure() {
    let raw = RawValue::map([("unexpected_key", RawValue::Map(Vec::new()))]);
    let err = parser::parse(&raw).unwrap_err();
    assert!(matches!(err, DiccError::InvalidConfig { .. }));
}

#[test]
fn strict_variant_rejects_document_parameters() {
    let raw = RawValue::from_yaml_str(WEB_STACK).expect("yaml");
    let err = ConfigParser::new(ParserMode::Strict).parse(&raw).unwrap_err();
    assert!(matches!(err, DiccError::InvalidConfig { .. }));
}

// ── Builder ──────────────────────────────────────────────────────────

#[test]
fn exclusivity_invariant() {
    let mut builder = ContainerBuilder::new();
    builder.set_alias("x", "y");
    let _ = builder.set_service_definition("x", ServiceDefinition::new("X"));
    assert!(!builder.has_alias("x"));

    builder.set_alias("x", "y");
    assert!(!builder.has_service_definition("x"));
}

#[test]
fn cyclic_alias_is_an_error() {
    let raw = RawValue::from_yaml_str("services:\n  a: '@b'\n  b: '@a'\n").expect("yaml");
    let builder = parser::parse(&raw).expect("parse");
    let err = builder.find_definition("a").unwrap_err();
    assert!(matches!(err, DiccError::CyclicAlias { .. }));
}

#[test]
fn cyclic_alias_never_compiles() {
    let raw = RawValue::from_yaml_str("services:\n  a: '@b'\n  b: '@a'\n").expect("yaml");

    let err = compile::compile(&raw, &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, DiccError::CyclicAlias { .. }), "got: {err}");

    let unchecked = CompilerConfig {
        check_references: false,
        ..CompilerConfig::default()
    };
    let err = compile::compile(&raw, &unchecked).unwrap_err();
    match err {
        DiccError::CyclicAlias { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
        other => panic!("unexpected error: {other}"),
    }
}

// ── Parameters ───────────────────────────────────────────────────────

#[test]
fn pure_parameter_reference_preserves_type() {
    let raw = RawValue::from_yaml_str(WEB_STACK).expect("yaml");
    let builder = parser::parse(&raw).expect("parse");
    let mailer = builder.service_definition("mailer").expect("mailer");
    assert_eq!(mailer.arguments[2].1, Value::parameter("enabled"));

    let resolved = ParameterResolver::new(&builder)
        .resolve(&mailer.arguments[2].1)
        .expect("resolve");
    assert_eq!(resolved, Value::Scalar(Scalar::Bool(true)));
}

#[test]
fn case_insensitive_parameters() {
    let mut builder = ContainerBuilder::new();
    builder.set_parameter("Foo", Value::string("bar"));
    let resolved = ParameterResolver::new(&builder)
        .resolve(&Value::parameter("foo"))
        .expect("resolve");
    assert_eq!(resolved, Value::string("bar"));
}

#[test]
fn resolved_definition_has_concrete_values() {
    let raw = RawValue::from_yaml_str(WEB_STACK).expect("yaml");
    let builder = parser::parse(&raw).expect("parse");
    let mailer = builder.service_definition("mailer").expect("mailer");
    let resolved = ParameterResolver::new(&builder)
        .resolve_definition(mailer)
        .expect("resolve");
    assert_eq!(resolved.class, Value::string("SmtpMailer"));
    assert_eq!(resolved.arguments[1].1, Value::string("http://app.example.com/"));
}

// ── Dumping ──────────────────────────────────────────────────────────

#[test]
fn dump_is_idempotent() {
    let raw = RawValue::from_yaml_str(WEB_STACK).expect("yaml");
    let builder = parser::parse(&raw).expect("parse");
    let dumper = PhpDumper::default();
    let first = dumper.dump(&builder).expect("dump");
    let second = dumper.dump(&builder).expect("dump");
    assert_eq!(first, second);
}

#[test]
fn alias_transparency() {
    let mut builder = ContainerBuilder::new();
    let _ = builder.set_service_definition("foo", ServiceDefinition::new("FooClass"));
    builder.set_alias("alias_for_foo", "foo");
    assert_eq!(builder.alias("alias_for_foo").expect("alias").as_str(), "foo");

    let code = PhpDumper::default().dump(&builder).expect("dump");
    assert!(code.contains("'alias_for_foo' => 'getAliasForFooService'"));
    assert!(code.contains("'foo' => 'getFooService'"));
}

#[test]
fn unserializable_failure() {
    let raw = RawValue::from_yaml_str(
        "services:\n  foo:\n    class: Foo\n    arguments: [!php/object 'O:8:\"stdClass\":0:{}']\n",
    )
    .expect("yaml");
    let builder = parser::parse(&raw).expect("parse");
    let err = PhpDumper::default().dump(&builder).unwrap_err();
    assert!(matches!(err, DiccError::Unserializable { .. }));
}

#[test]
fn compiled_web_stack_contains_every_accessor() {
    let raw = RawValue::from_yaml_str(WEB_STACK).expect("yaml");
    let code = compile::compile(&raw, &CompilerConfig::default()).expect("compile");

    assert!(code.contains("  protected function getMailerService()\n"));
    assert!(code.contains("    $class = $this->getParameter('mailer.class');\n"));
    assert!(code.contains(
        "    $instance = new $class($this->getService('transport'), 'http://'.$this->getParameter('subdomain').'.'.$this->getParameter('base_host').'/', $this->getParameter('enabled'));\n"
    ));
    assert!(code.contains("    $instance->setLogger($this->getService('logger'));\n"));
    assert!(code.contains("    $instance = new Transport(host: $this->getParameter('base_host'));\n"));
    assert!(code.contains("    $instance = Logger::create();\n"));
    assert!(code.contains(
        "    call_user_func(array('@StaticConfigurator', 'configure'), $instance);\n"
    ));
    assert!(code.contains("    return $this->getService('mailer');\n"));
    assert!(code.contains("      'base_host' => 'example.com',\n"));
    assert!(code.contains("      'enabled' => true,\n"));
}

#[test]
fn json_and_yaml_compile_identically() {
    let yaml = RawValue::from_yaml_str(
        "parameters:\n  port: 25\nservices:\n  mailer: { class: Mailer, arguments: ['%port%', '@@home'] }\n",
    )
    .expect("yaml");
    let json = RawValue::from_json_str(
        r#"{"parameters": {"port": 25}, "services": {"mailer": {"class": "Mailer", "arguments": ["%port%", "@@home"]}}}"#,
    )
    .expect("json");
    let config = CompilerConfig::default();
    assert_eq!(
        compile::compile(&yaml, &config).expect("yaml compile"),
        compile::compile(&json, &config).expect("json compile")
    );
}
