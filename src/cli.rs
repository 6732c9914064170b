// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `watchsh`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchsh",
    version,
    about = "Feed file-change events to a persistent shell.",
    long_about = None
)]
pub struct CliArgs {
    /// Files to watch for modifications.
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Path to an optional config file (TOML).
    ///
    /// If omitted, built-in defaults are used.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Override the configured shell program.
    #[arg(long, value_name = "PROGRAM")]
    pub shell: Option<String>,

    /// Override the command line sent to the shell on each event.
    ///
    /// A literal `{path}` is replaced with the path that changed.
    #[arg(long, value_name = "LINE")]
    pub command: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHSH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective configuration and watch list, then exit.
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
