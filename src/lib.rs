// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod watch;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{load_from_path, validate_config, ConfigFile};
use crate::engine::Runtime;
use crate::exec::ShellBridge;
use crate::watch::{NotifyChannel, WatchRegistry, MAX_WATCH_COUNT};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - argument checks
/// - config loading + CLI overrides
/// - the notification channel and watch registry
/// - the shell bridge
/// - the runtime loop
///
/// Ordering matters for the failure cases: registration happens before the
/// shell is spawned, so "nothing could be watched" never leaves a stray
/// subprocess behind.
pub async fn run(args: CliArgs) -> Result<()> {
    if args.paths.is_empty() {
        bail!("usage: watchsh [OPTIONS] <PATH>... (at least one file to watch)");
    }
    // Mirrors the argv-based limit: the program name occupies one of the
    // MAX_WATCH_COUNT slots, so strictly fewer than MAX_WATCH_COUNT - 1
    // paths are accepted here; the registry enforces its own bound too.
    if args.paths.len() >= MAX_WATCH_COUNT - 1 {
        bail!(
            "cannot watch {} paths at once, pass fewer than {}",
            args.paths.len(),
            MAX_WATCH_COUNT - 1
        );
    }

    let mut cfg = match &args.config {
        Some(path) => load_from_path(PathBuf::from(path))?,
        None => ConfigFile::default(),
    };
    cfg.shell
        .apply_overrides(args.shell.as_deref(), args.command.as_deref());
    validate_config(&cfg)?;

    if args.dry_run {
        print_dry_run(&cfg, &args.paths);
        return Ok(());
    }

    let channel = NotifyChannel::init().context("initializing the notification channel")?;

    // Register every requested path; individual failures only cost that
    // path, but zero live watches means there is nothing to do.
    let mut registry = WatchRegistry::new();
    for path in &args.paths {
        match registry.register(&channel, path) {
            Ok(wd) => info!(path = %path.display(), wd = wd.as_raw(), "watching"),
            Err(err) => warn!(path = %path.display(), error = %err, "could not watch path"),
        }
    }
    if registry.is_empty() {
        bail!("no paths could be watched");
    }

    let bridge = ShellBridge::spawn(&cfg.shell)?;

    let runtime = Runtime::new(channel, registry, bridge, cfg.shell.command.clone());
    runtime.run().await
}

/// Simple dry-run output: print the effective config and watch list.
fn print_dry_run(cfg: &ConfigFile, paths: &[PathBuf]) {
    println!("watchsh dry-run");
    println!("  shell.program = {}", cfg.shell.program);
    if !cfg.shell.args.is_empty() {
        println!("  shell.args = {:?}", cfg.shell.args);
    }
    println!("  shell.command = {}", cfg.shell.command);
    println!();

    println!("paths ({}):", paths.len());
    for path in paths {
        println!("  - {}", path.display());
    }
}
