// src/watch/registry.rs

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::watch::inotify::NotifyChannel;

/// Upper bound on the watch table, including the slot the CLI reserves for
/// the program itself; at most `MAX_WATCH_COUNT - 1` paths can be tracked.
pub const MAX_WATCH_COUNT: usize = 10;

/// Opaque handle identifying one active registration with the notification
/// service.
///
/// Descriptor values are reusable and not guaranteed stable across events;
/// only the [`WatchRegistry`] creates and discards them, and any value seen
/// outside a live registry entry must be treated as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchDescriptor(i32);

impl WatchDescriptor {
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot track more than {} watched paths", MAX_WATCH_COUNT - 1)]
    CapacityExceeded,

    #[error("could not watch {path:?}")]
    Watch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug)]
struct WatchEntry {
    path: PathBuf,
    wd: WatchDescriptor,
}

/// Bidirectional mapping between the bounded set of watched paths and the
/// descriptor currently representing each path's registration.
///
/// Entries are kept in original registration (argument) order. The invariant
/// is that each live path maps to exactly one currently-valid descriptor; a
/// path whose re-registration fails is removed outright and never resolves
/// again.
#[derive(Debug, Default)]
pub struct WatchRegistry {
    entries: Vec<WatchEntry>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently tracked paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True once every tracked path has been dropped; the watch loop cannot
    /// make progress past this point.
    pub fn is_exhausted(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the tracked paths in registration order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.path.as_path())
    }

    /// Register `path` with the notification service and record its
    /// descriptor.
    ///
    /// Re-registering an already tracked path updates its entry in place
    /// (this is how [`rearm`](WatchRegistry::rearm) refreshes descriptors);
    /// new paths count against the `MAX_WATCH_COUNT - 1` capacity bound.
    pub fn register(
        &mut self,
        channel: &NotifyChannel,
        path: &Path,
    ) -> Result<WatchDescriptor, RegistryError> {
        let slot = self.position(path);
        if slot.is_none() && self.entries.len() >= MAX_WATCH_COUNT - 1 {
            return Err(RegistryError::CapacityExceeded);
        }

        let wd = channel
            .add_watch(path)
            .map_err(|source| RegistryError::Watch {
                path: path.to_path_buf(),
                source,
            })?;

        match slot {
            Some(index) => self.entries[index].wd = wd,
            None => self.entries.push(WatchEntry {
                path: path.to_path_buf(),
                wd,
            }),
        }

        Ok(wd)
    }

    /// Reverse lookup: the path whose most recent registration produced this
    /// descriptor, or `None` for stale or unknown values.
    pub fn resolve(&self, wd: WatchDescriptor) -> Option<&Path> {
        self.entries
            .iter()
            .find(|entry| entry.wd == wd)
            .map(|entry| entry.path.as_path())
    }

    /// Re-register a path whose watch just fired.
    ///
    /// On success the stored descriptor is replaced. On failure the path's
    /// entry is removed, leaving no valid descriptor for it going forward;
    /// the caller checks [`is_exhausted`](WatchRegistry::is_exhausted) to
    /// decide whether the loop can continue.
    pub fn rearm(
        &mut self,
        channel: &NotifyChannel,
        path: &Path,
    ) -> Result<WatchDescriptor, RegistryError> {
        match self.register(channel, path) {
            Ok(wd) => Ok(wd),
            Err(err) => {
                if let Some(index) = self.position(path) {
                    self.entries.remove(index);
                }
                Err(err)
            }
        }
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.entries.iter().position(|entry| entry.path == path)
    }
}
