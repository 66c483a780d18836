//! `dicc inspect` — Show what a configuration declares.

use clap::Args;
use dicc_compiler::graph::ReferenceGraph;
use dicc_compiler::resolver::ParameterResolver;

use super::SourceArgs;
use crate::output::Report;

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Config files and parsing options.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Show parameters and definitions with parameters substituted.
    #[arg(long)]
    pub resolve: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `inspect` command.
///
/// # Errors
///
/// Returns an error if parsing or parameter resolution fails.
pub fn execute(args: InspectArgs) -> anyhow::Result<()> {
    let config = args.source.compiler_config()?;
    let documents = args
        .source
        .files
        .iter()
        .map(|path| dicc_compiler::compile::load_document(path))
        .collect::<Result<Vec<_>, _>>()?;
    let builder = dicc_compiler::compile::build(&documents, &config)?;

    let mut report = Report::from_builder(&builder);
    if args.resolve {
        let resolver = ParameterResolver::new(&builder);
        report.parameters = resolver
            .resolve_all()?
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        for definition in report.services.values_mut() {
            *definition = resolver.resolve_definition(definition)?;
        }
    }
    report.build_order = ReferenceGraph::from_builder(&builder).build_order().ok();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.render());
    }

    Ok(())
}
