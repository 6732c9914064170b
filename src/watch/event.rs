// src/watch/event.rs

//! Demultiplexer for raw inotify event buffers.
//!
//! One `read(2)` on the notification channel yields a byte buffer holding
//! zero or more variable-length records: a fixed header (wd, mask, cookie,
//! name length) followed by `len` bytes of NUL-padded name. Adjacent records
//! can only be located by exact offset arithmetic over the declared name
//! length — the decoder trusts `len` exactly as given and never re-derives
//! it, because a single off-by-one desynchronises every record that follows
//! in the same buffer.

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

use thiserror::Error;

use crate::watch::registry::WatchDescriptor;

/// Size of the fixed record header (`struct inotify_event` without the
/// trailing name).
pub const EVENT_HEADER_LEN: usize = std::mem::size_of::<libc::inotify_event>();

/// Longest name the kernel will attach to a single record.
pub const MAX_NAME_BYTES: usize = 4096;

/// Read-buffer size: room for 16 maximum-length records per read.
pub const EVENT_BUFFER_LEN: usize = 16 * (EVENT_HEADER_LEN + MAX_NAME_BYTES);

/// A buffer that cannot be split into well-formed records.
///
/// Either error means the byte stream is corrupt from this offset onwards,
/// so iteration stops rather than resynchronise on garbage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated event header at offset {offset}: only {remaining} bytes remain")]
    TruncatedHeader { offset: usize, remaining: usize },

    #[error(
        "event record at offset {offset} declares a {declared}-byte name \
         but only {remaining} bytes remain in the buffer"
    )]
    RecordOverrun {
        offset: usize,
        declared: usize,
        remaining: usize,
    },
}

/// One decoded notification record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub wd: WatchDescriptor,
    pub mask: u32,
    /// Attached name, present iff the record's declared name length was
    /// nonzero. Trailing NUL padding is stripped.
    pub name: Option<OsString>,
}

impl EventRecord {
    /// A record carrying a name describes a child of a watched *directory*,
    /// not one of the top-level watched files; such records are reported and
    /// skipped rather than dispatched.
    pub fn is_directory_scoped(&self) -> bool {
        self.name.is_some()
    }
}

/// Decode a raw notification buffer into a lazy sequence of records.
///
/// The iterator never reads past `buf`; a record whose declared length would
/// overrun it yields a [`DecodeError`] and fuses the iterator. Decoding the
/// same slice twice yields the same sequence.
pub fn decode(buf: &[u8]) -> RecordIter<'_> {
    RecordIter {
        buf,
        offset: 0,
        failed: false,
    }
}

pub struct RecordIter<'a> {
    buf: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Iterator for RecordIter<'a> {
    type Item = Result<EventRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buf.len() {
            return None;
        }

        let remaining = self.buf.len() - self.offset;
        if remaining < EVENT_HEADER_LEN {
            self.failed = true;
            return Some(Err(DecodeError::TruncatedHeader {
                offset: self.offset,
                remaining,
            }));
        }

        let header = &self.buf[self.offset..self.offset + EVENT_HEADER_LEN];
        let wd = i32::from_ne_bytes(slice4(&header[0..4]));
        let mask = u32::from_ne_bytes(slice4(&header[4..8]));
        // header[8..12] is the rename cookie; meaningless for IN_MODIFY.
        let len = u32::from_ne_bytes(slice4(&header[12..16])) as usize;

        if len > remaining - EVENT_HEADER_LEN {
            self.failed = true;
            return Some(Err(DecodeError::RecordOverrun {
                offset: self.offset,
                declared: len,
                remaining: remaining - EVENT_HEADER_LEN,
            }));
        }

        let name = if len > 0 {
            let start = self.offset + EVENT_HEADER_LEN;
            let raw = &self.buf[start..start + len];
            let trimmed = match raw.iter().position(|&b| b == 0) {
                Some(end) => &raw[..end],
                None => raw,
            };
            Some(OsString::from_vec(trimmed.to_vec()))
        } else {
            None
        };

        self.offset += EVENT_HEADER_LEN + len;

        Some(Ok(EventRecord {
            wd: WatchDescriptor::from_raw(wd),
            mask,
            name,
        }))
    }
}

fn slice4(bytes: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes[..4]);
    out
}
