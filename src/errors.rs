// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! The wiring layer works in `anyhow`; the leaf modules expose typed errors
//! where callers need to distinguish cases. This module collects the whole
//! error surface in one place.

pub use anyhow::{Error, Result};

pub use crate::watch::event::DecodeError;
pub use crate::watch::registry::RegistryError;
