//! PE format-detection and graceful-error smoke tests (see macho_symbolize.rs
//! for why these stay at the magic/error level rather than a full synthetic
//! binary).

use native_symbolize::object::{FileFormat, Object};

fn minimal_dos_header() -> Vec<u8> {
    let mut data = vec![0u8; 64];
    data[0] = b'M';
    data[1] = b'Z';
    data
}

#[test]
fn peek_detects_dos_magic() {
    let data = minimal_dos_header();
    assert_eq!(native_symbolize::object::peek(&data), FileFormat::Pe);
}

#[test]
fn truncated_pe_fails_gracefully() {
    let data = minimal_dos_header();
    assert!(Object::parse(&data).is_err());
}

#[test]
fn non_pe_bytes_are_unknown_format() {
    let data = vec![0x7f, b'X', b'X', b'X'];
    assert_eq!(native_symbolize::object::peek(&data), FileFormat::Unknown);
}
