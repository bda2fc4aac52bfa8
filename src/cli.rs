// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_CONFIG_FILE;

/// Command-line arguments for `stepgraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "stepgraph",
    version,
    about = "Track a dependency-gated step graph for a task instance.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Steps.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Instance to operate on. Defaults to `[graph].name` from the config.
    #[arg(long, value_name = "NAME")]
    pub instance: Option<String>,

    /// Mark a step as done. May be repeated; applied in order, stopping at
    /// the first rejected step.
    #[arg(long, value_name = "STEP")]
    pub complete: Vec<String>,

    /// Discard any stored snapshot for the instance and start over.
    #[arg(long)]
    pub reset: bool,

    /// Parse + validate, print the graph, but don't load or store anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the instance summary as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `STEPGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
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
