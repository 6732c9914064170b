// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [shell]
/// program = "bash"
/// args = []
/// command = "echo changed: {path}"
/// ```
///
/// Every section and field is optional and has a default, so running with no
/// config file at all is equivalent to an empty one.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    /// Subprocess settings from `[shell]`.
    #[serde(default)]
    pub shell: ShellConfig,
}

/// `[shell]` section: which shell to keep alive and what to feed it.
#[derive(Debug, Clone, Deserialize)]
pub struct ShellConfig {
    /// The shell program to spawn once at startup.
    #[serde(default = "default_program")]
    pub program: String,

    /// Startup flags passed to the shell. These are shell-specific and not
    /// part of the watcher's contract; the default is none.
    #[serde(default)]
    pub args: Vec<String>,

    /// The command line written to the shell on each file event.
    ///
    /// A literal `{path}` is replaced with the path that changed.
    #[serde(default = "default_command")]
    pub command: String,
}

fn default_program() -> String {
    "bash".to_string()
}

fn default_command() -> String {
    "echo changed: {path}".to_string()
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
            command: default_command(),
        }
    }
}

impl ShellConfig {
    /// Apply CLI-level overrides on top of whatever the file (or default)
    /// provided. `None` leaves the configured value untouched.
    pub fn apply_overrides(&mut self, program: Option<&str>, command: Option<&str>) {
        if let Some(program) = program {
            self.program = program.to_string();
        }
        if let Some(command) = command {
            self.command = command.to_string();
        }
    }
}
