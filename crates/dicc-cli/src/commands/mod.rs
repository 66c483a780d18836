//! CLI command definitions and dispatch.

pub mod compile;
pub mod inspect;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dicc_common::config::{CompilerConfig, ParserMode};

/// dicc — compile service configuration into a container class.
#[derive(Parser, Debug)]
#[command(name = "dicc", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log debug output (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the container class for one or more config files.
    Compile(compile::CompileArgs),
    /// List the services, aliases, and parameters a config declares.
    Inspect(inspect::InspectArgs),
}

/// Options shared by every command that reads config files.
#[derive(Args, Debug)]
pub struct SourceArgs {
    /// Config files (.yml, .yaml, .json); later files override earlier ones.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Reject `parameters` sections in config files.
    #[arg(long)]
    pub strict: bool,

    /// JSON file with compiler settings; flags take precedence.
    #[arg(long, env = "DICC_CONFIG")]
    pub config: Option<PathBuf>,
}

impl SourceArgs {
    /// Loads the compiler settings and applies the shared flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or decoded.
    pub fn compiler_config(&self) -> anyhow::Result<CompilerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    anyhow::anyhow!("cannot read settings {}: {e}", path.display())
                })?;
                serde_json::from_str(&text)?
            }
            None => CompilerConfig::default(),
        };
        if self.strict {
            config.mode = ParserMode::Strict;
        }
        Ok(config)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Compile(args) => compile::execute(args),
        Command::Inspect(args) => inspect::execute(args),
    }
}
