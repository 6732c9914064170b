// src/watch/mod.rs

//! File watching via inotify.
//!
//! This module is responsible for:
//! - Owning the notification channel (the inotify fd) and its syscalls.
//! - Bookkeeping between watched paths and their ephemeral watch
//!   descriptors, including the re-arm protocol after each event.
//! - Demultiplexing raw event buffers into structured records.
//!
//! It does **not** know about the shell bridge or the main loop; it only
//! turns filesystem changes into resolvable path-level records.

pub mod event;
pub mod inotify;
pub mod registry;

pub use event::{
    decode, DecodeError, EventRecord, EVENT_BUFFER_LEN, EVENT_HEADER_LEN, MAX_NAME_BYTES,
};
pub use inotify::NotifyChannel;
pub use registry::{RegistryError, WatchDescriptor, WatchRegistry, MAX_WATCH_COUNT};
