//! Tests for element names
//!
//! These tests verify:
//! - Name length derived from the header/data address gap
//! - Decoding of 2-byte name units, including truncation at invalid characters
//! - Element header encoding and its Latin-1 restriction

use v8formats::format::{
    decode_name, encode_element_header, is_invalid_name_char, name_len_from_addresses,
    BLOCK_HEADER_SIZE,
};
use v8formats::V8Error;

// =============================================================================
// Helper Functions
// =============================================================================

/// Encode a name as (char, 0) units the way element headers store it
fn units(name: &str) -> Vec<u8> {
    name.bytes().flat_map(|b| [b, 0]).collect()
}

// =============================================================================
// Name Length Tests
// =============================================================================

#[test]
fn test_name_len_from_addresses() {
    let header_addr = 559;
    let header_len = 20 + 2 * 3 + 4;
    let data_addr = header_addr + BLOCK_HEADER_SIZE + header_len;
    assert_eq!(name_len_from_addresses(header_addr, data_addr), 3);
}

#[test]
fn test_name_len_saturates_when_data_precedes_header() {
    assert_eq!(name_len_from_addresses(1000, 10), 0);
    assert_eq!(name_len_from_addresses(1000, 1000 + 31 + 20), 0);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_plain_name() {
    assert_eq!(decode_name(&units("abc")), "abc");
}

#[test]
fn test_decode_ignores_high_byte() {
    assert_eq!(decode_name(&[b'a', 0x04, b'b', 0x00]), "ab");
}

#[test]
fn test_decode_truncates_at_slash() {
    assert_eq!(decode_name(&units("ab/cd")), "ab");
}

#[test]
fn test_decode_truncates_at_nul() {
    assert_eq!(decode_name(&[b'x', 0, 0, 0, b'y', 0]), "x");
}

#[test]
fn test_decode_latin1() {
    assert_eq!(decode_name(&[0xe9, 0]), "\u{e9}");
}

#[test]
fn test_invalid_chars() {
    assert!(is_invalid_name_char('/'));
    assert!(is_invalid_name_char('\0'));
    assert!(!is_invalid_name_char('a'));
    assert!(!is_invalid_name_char('.'));
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_header_layout() {
    let header = encode_element_header("ab").unwrap();
    assert_eq!(header.len(), 28);
    assert!(header[..20].iter().all(|&b| b == 0));
    assert_eq!(&header[20..24], &[b'a', 0, b'b', 0]);
    assert!(header[24..].iter().all(|&b| b == 0));
}

#[test]
fn test_encode_then_decode_name() {
    let header = encode_element_header("root").unwrap();
    assert_eq!(decode_name(&header[20..header.len() - 4]), "root");
}

#[test]
fn test_encode_rejects_wide_chars() {
    let result = encode_element_header("имя");
    assert!(matches!(result, Err(V8Error::InvalidElementName(name)) if name == "имя"));
}
