// src/engine/mod.rs

//! Orchestration engine for watchsh.
//!
//! This module ties together:
//! - the notification channel and registry from [`crate::watch`]
//! - the shell bridge from [`crate::exec`]
//! - the main loop that reacts to file events and Ctrl-C

pub mod runtime;

pub use runtime::{render_command, Runtime};
