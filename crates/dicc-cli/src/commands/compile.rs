//! `dicc compile` — Generate the container class.

use std::path::PathBuf;

use clap::Args;

use super::SourceArgs;

/// Arguments for the `compile` subcommand.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Config files and parsing options.
    #[command(flatten)]
    pub source: SourceArgs,

    /// Name of the generated class.
    #[arg(long)]
    pub class: Option<String>,

    /// Base container class the generated class extends.
    #[arg(long)]
    pub base_class: Option<String>,

    /// Skip the circular constructor reference check.
    #[arg(long)]
    pub no_reference_check: bool,

    /// Write output to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Executes the `compile` command.
///
/// # Errors
///
/// Returns an error if a file cannot be read or the configuration does not
/// compile.
pub fn execute(args: CompileArgs) -> anyhow::Result<()> {
    let mut config = args.source.compiler_config()?;
    if let Some(class) = args.class {
        config.class_name = class;
    }
    if let Some(base_class) = args.base_class {
        config.base_class = base_class;
    }
    if args.no_reference_check {
        config.check_references = false;
    }

    tracing::info!(files = args.source.files.len(), class = %config.class_name, "compiling container");
    let code = dicc_compiler::compile::compile_files(&args.source.files, &config)?;

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, &code)
            .map_err(|e| anyhow::anyhow!("cannot write {}: {e}", out_path.display()))?;
        println!(
            "Compiled {} file(s) -> {}",
            args.source.files.len(),
            out_path.display()
        );
    } else {
        print!("{code}");
    }

    Ok(())
}
