// src/watch/inotify.rs

//! Thin owned wrapper around an inotify file descriptor.
//!
//! This is the only module that performs inotify syscalls. Everything above
//! it consumes the service through three operations: initialise a channel,
//! register a path for content-modification events, and read pending events
//! into a byte buffer. Decoding that buffer is [`crate::watch::event`]'s job.

use std::ffi::CString;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tokio::io::unix::AsyncFd;

use crate::watch::registry::WatchDescriptor;

/// An open inotify notification channel.
///
/// The descriptor is created non-blocking and registered with the tokio
/// reactor, so [`read_events`](NotifyChannel::read_events) can be awaited
/// without tying up a thread. Dropping the channel closes the fd and with it
/// every watch registered through it.
pub struct NotifyChannel {
    fd: AsyncFd<OwnedFd>,
}

impl std::fmt::Debug for NotifyChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyChannel")
            .field("fd", &self.fd.get_ref().as_raw_fd())
            .finish()
    }
}

impl NotifyChannel {
    /// Initialise a new inotify channel.
    pub fn init() -> io::Result<Self> {
        let fd = unsafe { libc::inotify_init1(libc::IN_NONBLOCK | libc::IN_CLOEXEC) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: on success the fd is open and owned by us alone.
        let fd = unsafe { OwnedFd::from_raw_fd(fd) };
        Ok(Self {
            fd: AsyncFd::new(fd)?,
        })
    }

    /// Register `path` for content-modification events only.
    ///
    /// Directory-level masks are deliberately not requested; records that
    /// carry a child name are classified and skipped downstream.
    ///
    /// Registering a path that already has a live watch on this channel
    /// returns the existing descriptor unchanged (kernel semantics).
    pub fn add_watch(&self, path: &Path) -> io::Result<WatchDescriptor> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let wd = unsafe {
            libc::inotify_add_watch(self.fd.as_raw_fd(), c_path.as_ptr(), libc::IN_MODIFY)
        };
        if wd < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(WatchDescriptor::from_raw(wd))
    }

    /// Wait until events are pending and read them into `buf`.
    ///
    /// Returns the number of bytes read; the buffer then holds zero or more
    /// variable-length records for [`crate::watch::event::decode`]. A zero
    /// return is passed through untouched so the caller can decide how fatal
    /// it is.
    pub async fn read_events(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.readable().await?;
            match guard.try_io(|inner| {
                let res = unsafe {
                    libc::read(inner.as_raw_fd(), buf.as_mut_ptr() as *mut _, buf.len())
                };
                if res < 0 {
                    Err(io::Error::last_os_error())
                } else {
                    Ok(res as usize)
                }
            }) {
                Ok(Ok(count)) => return Ok(count),
                Ok(Err(e)) => {
                    if e.kind() == io::ErrorKind::WouldBlock {
                        continue;
                    }
                    return Err(e);
                }
                Err(_would_block) => continue,
            }
        }
    }
}
