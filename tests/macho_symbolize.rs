//! Mach-O format-detection and graceful-error smoke tests. Constructing a
//! fully valid Mach-O binary by hand is disproportionate to what this crate
//! actually needs to verify here; the ELF suite exercises the full parse
//! path, this suite exercises magic dispatch and that malformed input
//! produces an `Err`, not a panic.

use native_symbolize::object::{FileFormat, Object};

#[test]
fn peek_detects_thin_macho_magic() {
    let mut data = vec![0u8; 32];
    data[0..4].copy_from_slice(&0xFEEDFACFu32.to_le_bytes()); // MH_MAGIC_64
    assert_eq!(native_symbolize::object::peek(&data), FileFormat::MachO);
}

#[test]
fn peek_detects_fat_macho_magic() {
    let mut data = vec![0u8; 32];
    data[0..4].copy_from_slice(&0xCAFEBABEu32.to_be_bytes()); // FAT_MAGIC
    assert_eq!(native_symbolize::object::peek(&data), FileFormat::MachO);
}

#[test]
fn truncated_macho_fails_gracefully() {
    let mut data = vec![0u8; 8];
    data[0..4].copy_from_slice(&0xFEEDFACFu32.to_le_bytes());
    assert!(Object::parse(&data).is_err());
}

#[test]
fn unrecognized_bytes_are_unknown_format() {
    let data = vec![0xde, 0xad, 0xbe, 0xef, 0x00, 0x01, 0x02, 0x03];
    assert_eq!(native_symbolize::object::peek(&data), FileFormat::Unknown);
    assert!(Object::parse(&data).is_err());
}
