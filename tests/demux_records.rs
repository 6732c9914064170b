// tests/demux_records.rs

use std::error::Error;
use std::ffi::OsString;

use watchsh::watch::{decode, DecodeError, EventRecord, EVENT_HEADER_LEN, MAX_NAME_BYTES};

mod common;

type TestResult = Result<(), Box<dyn Error>>;

fn collect(buf: &[u8]) -> Result<Vec<EventRecord>, DecodeError> {
    decode(buf).collect()
}

#[test]
fn empty_buffer_yields_no_records() -> TestResult {
    assert!(collect(&[])?.is_empty());
    Ok(())
}

#[test]
fn well_formed_records_come_back_in_order() -> TestResult {
    let mut buf = Vec::new();
    common::push_record(&mut buf, 1, libc::IN_MODIFY, None);
    common::push_record(&mut buf, 2, libc::IN_MODIFY, Some("child.txt"));
    common::push_record(&mut buf, 7, libc::IN_MODIFY, None);

    let records = collect(&buf)?;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].wd.as_raw(), 1);
    assert_eq!(records[1].wd.as_raw(), 2);
    assert_eq!(records[2].wd.as_raw(), 7);

    assert_eq!(records[0].name, None);
    assert_eq!(records[1].name, Some(OsString::from("child.txt")));
    assert_eq!(records[2].name, None);

    Ok(())
}

#[test]
fn decoding_is_idempotent() -> TestResult {
    let mut buf = Vec::new();
    common::push_record(&mut buf, 3, libc::IN_MODIFY, Some("a"));
    common::push_record(&mut buf, 4, libc::IN_MODIFY, None);

    let first = collect(&buf)?;
    let second = collect(&buf)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn name_carrying_records_are_directory_scoped() -> TestResult {
    let mut buf = Vec::new();
    common::push_record(&mut buf, 5, libc::IN_MODIFY, Some("nested.rs"));
    common::push_record(&mut buf, 6, libc::IN_MODIFY, None);

    let records = collect(&buf)?;
    assert!(records[0].is_directory_scoped());
    assert!(!records[1].is_directory_scoped());
    Ok(())
}

#[test]
fn trailing_nul_padding_is_stripped_from_names() -> TestResult {
    let mut buf = Vec::new();
    common::push_record(&mut buf, 1, libc::IN_MODIFY, Some("short"));

    let records = collect(&buf)?;
    assert_eq!(records[0].name, Some(OsString::from("short")));
    Ok(())
}

#[test]
fn overrunning_record_aborts_with_diagnostic() {
    let mut buf = Vec::new();
    common::push_record(&mut buf, 1, libc::IN_MODIFY, None);
    common::push_overrun_record(&mut buf, 2, MAX_NAME_BYTES as u32);

    let mut iter = decode(&buf);
    assert!(matches!(iter.next(), Some(Ok(_))));
    match iter.next() {
        Some(Err(DecodeError::RecordOverrun {
            offset,
            declared,
            remaining,
        })) => {
            assert_eq!(offset, EVENT_HEADER_LEN);
            assert_eq!(declared, MAX_NAME_BYTES);
            assert_eq!(remaining, 0);
        }
        other => panic!("expected RecordOverrun, got {other:?}"),
    }
    // The iterator is fused after a structural error.
    assert!(iter.next().is_none());
}

#[test]
fn truncated_header_aborts_with_diagnostic() {
    let mut buf = Vec::new();
    common::push_record(&mut buf, 1, libc::IN_MODIFY, None);
    buf.extend_from_slice(&[0u8; 8]); // half a header

    let mut iter = decode(&buf);
    assert!(matches!(iter.next(), Some(Ok(_))));
    match iter.next() {
        Some(Err(DecodeError::TruncatedHeader { offset, remaining })) => {
            assert_eq!(offset, EVENT_HEADER_LEN);
            assert_eq!(remaining, 8);
        }
        other => panic!("expected TruncatedHeader, got {other:?}"),
    }
    assert!(iter.next().is_none());
}
