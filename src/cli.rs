// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `filterdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "filterdag",
    version,
    about = "Evaluate request filters over a dependency-driven task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Filterdag.toml` in the current working directory, or the
    /// built-in defaults when that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Filter to evaluate. Repeat to select several.
    ///
    /// Overrides `[demo].filters`; when both are empty every filter runs.
    #[arg(long = "filter", value_name = "NAME")]
    pub filters: Vec<String>,

    /// Number of concurrent invocations against the same engine.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub repeat: usize,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `FILTERDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Build the graph and print it with the selected sub-graph, but don't
    /// execute anything.
    #[arg(long)]
    pub dry_run: bool,
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
