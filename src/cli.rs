// src/cli.rs

//! CLI argument parsing using `clap`.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::DEFAULT_SCRIPT_FILE;
use crate::errors::{PancakeError, Result};

/// Command-line arguments for `pancake`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pancake",
    version,
    about = "Minimal make-style build engine with a watch mode.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the build script (TOML), relative to `-C` if given.
    #[arg(short = 'F', long = "file", value_name = "PATH", default_value = DEFAULT_SCRIPT_FILE)]
    pub file: PathBuf,

    /// Change to this directory before loading the build script.
    #[arg(short = 'C', long = "directory", value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PANCAKE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Build a target (the default target if omitted).
    Make(MakeArgs),

    /// List registered targets; the default is marked with `*`.
    List {
        /// Include targets generated by matchers.
        #[arg(short, long)]
        all: bool,
    },

    /// Any other word is taken as a target to make.
    #[command(external_subcommand)]
    Target(Vec<OsString>),
}

#[derive(Debug, Clone, Default, Args)]
pub struct MakeArgs {
    /// Target to build.
    pub target: Option<String>,

    /// Keep running and rebuild when sources change.
    #[arg(short, long)]
    pub watch: bool,

    /// Print the rules that would run, without running them.
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Parser for the flags accepted after a bare target name.
#[derive(Debug, Parser)]
#[command(no_binary_name = true)]
struct TargetArgs {
    target: String,

    #[arg(short, long)]
    watch: bool,

    #[arg(short = 'n', long)]
    dry_run: bool,
}

impl Command {
    /// The make request this command stands for, if it is one.
    pub fn make_args(&self) -> Result<Option<MakeArgs>> {
        match self {
            Command::Make(args) => Ok(Some(args.clone())),
            Command::List { .. } => Ok(None),
            Command::Target(words) => {
                let parsed = TargetArgs::try_parse_from(words)
                    .map_err(|err| PancakeError::ConfigError(err.to_string()))?;
                Ok(Some(MakeArgs {
                    target: Some(parsed.target),
                    watch: parsed.watch,
                    dry_run: parsed.dry_run,
                }))
            }
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
