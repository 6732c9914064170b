// src/config/validate.rs

use anyhow::{anyhow, Result};

use crate::config::model::ConfigFile;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - the shell program is non-empty
/// - the per-event command line is non-empty
///
/// It does **not** check that the program exists or is executable; that
/// surfaces naturally as a spawn failure at startup.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_program(cfg)?;
    ensure_command(cfg)?;
    Ok(())
}

fn ensure_program(cfg: &ConfigFile) -> Result<()> {
    if cfg.shell.program.trim().is_empty() {
        return Err(anyhow!("[shell].program must not be empty"));
    }
    Ok(())
}

fn ensure_command(cfg: &ConfigFile) -> Result<()> {
    if cfg.shell.command.trim().is_empty() {
        return Err(anyhow!(
            "[shell].command must not be empty (it is sent to the shell on every event)"
        ));
    }
    Ok(())
}
