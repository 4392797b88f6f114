//! Tests for the block pager and directory format
//!
//! These tests verify:
//! - Multi-page blob reassembly following the page chain
//! - Rejection of malformed block headers and truncated pages
//! - Container validation
//! - Directory truncation at the first entry without a sentinel

use std::io::Cursor;

use v8formats::format::pager::{read_block_header, validate_stream};
use v8formats::format::{
    decode_directory, encode_directory, read_blob, read_blob_to_vec, validate, write_blob_bytes,
    BlockHeader, ElementAddress, FileHeader, BLOCK_HEADER_SIZE, DEFAULT_PAGE_SIZE, SENTINEL,
};
use v8formats::V8Error;

// =============================================================================
// Helper Functions
// =============================================================================

/// Append one physical page: header, payload, zero padding to `page_size`
fn push_page(out: &mut Vec<u8>, data_size: u32, page_size: u32, next: u32, payload: &[u8]) {
    let header = BlockHeader {
        data_size,
        page_size,
        next_page_addr: next,
    };
    out.extend_from_slice(&header.encode());
    out.extend_from_slice(payload);
    out.resize(out.len() + page_size as usize - payload.len(), 0);
}

// =============================================================================
// Page Chain Tests
// =============================================================================

#[test]
fn test_three_page_chain_follows_next_pointers() {
    // Physical order: page 1, page 3, page 2
    let page3_at = BLOCK_HEADER_SIZE + 4;
    let page2_at = page3_at + BLOCK_HEADER_SIZE + 8;

    let mut bytes = Vec::new();
    push_page(&mut bytes, 10, 4, page2_at, b"abcd");
    push_page(&mut bytes, 0, 8, SENTINEL, b"hij");
    push_page(&mut bytes, 0, 3, page3_at, b"efg");

    let blob = read_blob_to_vec(&mut Cursor::new(bytes), 0).unwrap();
    assert_eq!(blob, b"abcdefghij");
}

#[test]
fn test_chain_stops_at_declared_size() {
    let mut bytes = Vec::new();
    push_page(&mut bytes, 6, 8, SENTINEL, b"abcdefgh");

    let mut sink = Vec::new();
    let copied = read_blob(&mut Cursor::new(bytes), 0, &mut sink).unwrap();
    assert_eq!(copied, 6);
    assert_eq!(sink, b"abcdef");
}

#[test]
fn test_chain_ending_early_returns_partial_blob() {
    let mut bytes = Vec::new();
    push_page(&mut bytes, 100, 4, SENTINEL, b"abcd");

    let blob = read_blob_to_vec(&mut Cursor::new(bytes), 0).unwrap();
    assert_eq!(blob, b"abcd");
}

#[test]
fn test_single_page_write_then_read() {
    let mut bytes = Vec::new();
    let written = write_blob_bytes(&mut bytes, b"payload", DEFAULT_PAGE_SIZE).unwrap();
    assert_eq!(written, u64::from(BLOCK_HEADER_SIZE + DEFAULT_PAGE_SIZE));

    let header = read_block_header(&mut Cursor::new(&bytes), 0).unwrap();
    assert_eq!(header, BlockHeader::single_page(7, DEFAULT_PAGE_SIZE));
    assert_eq!(read_blob_to_vec(&mut Cursor::new(bytes), 0).unwrap(), b"payload");
}

// =============================================================================
// Malformed Input Tests
// =============================================================================

#[test]
fn test_zero_data_size_is_malformed() {
    let mut bytes = Vec::new();
    push_page(&mut bytes, 0, 512, SENTINEL, b"");

    let result = read_blob_to_vec(&mut Cursor::new(bytes), 0);
    assert!(matches!(result, Err(V8Error::MalformedBlock { offset: 0, .. })));
}

#[test]
fn test_zero_page_size_is_malformed() {
    let mut bytes = Vec::new();
    push_page(&mut bytes, 4, 0, SENTINEL, b"");

    let result = read_blob_to_vec(&mut Cursor::new(bytes), 0);
    assert!(matches!(result, Err(V8Error::MalformedBlock { .. })));
}

#[test]
fn test_truncated_page_is_malformed() {
    let mut bytes = BlockHeader::single_page(100, 512).encode().to_vec();
    bytes.extend_from_slice(b"only a few bytes");

    let result = read_blob_to_vec(&mut Cursor::new(bytes), 0);
    assert!(matches!(result, Err(V8Error::MalformedBlock { .. })));
}

#[test]
fn test_bad_framing_in_chained_page_is_malformed() {
    let mut bytes = Vec::new();
    push_page(&mut bytes, 8, 4, BLOCK_HEADER_SIZE + 4, b"abcd");
    bytes.extend_from_slice(&[b'x'; 64]);

    let result = read_blob_to_vec(&mut Cursor::new(bytes), 0);
    assert!(matches!(
        result,
        Err(V8Error::MalformedBlock { offset, .. }) if offset == u64::from(BLOCK_HEADER_SIZE + 4)
    ));
}

#[test]
fn test_header_past_end_is_malformed() {
    let result = read_block_header(&mut Cursor::new(vec![0u8; 10]), 0);
    assert!(matches!(result, Err(V8Error::MalformedBlock { .. })));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_validate_all_zero_buffer() {
    assert!(!validate(&[0u8; 47]));
}

#[test]
fn test_validate_minimal_container() {
    let mut bytes = FileHeader::default().encode().to_vec();
    bytes.extend_from_slice(&BlockHeader::single_page(0, 512).encode());
    assert!(validate(&bytes));
    assert!(!validate(&bytes[..46]));
}

#[test]
fn test_validate_stream_keeps_position() {
    let mut bytes = FileHeader::default().encode().to_vec();
    bytes.extend_from_slice(&BlockHeader::single_page(0, 512).encode());

    let mut cursor = Cursor::new(bytes);
    cursor.set_position(20);
    assert!(validate_stream(&mut cursor).unwrap());
    assert_eq!(cursor.position(), 20);
}

// =============================================================================
// Directory Tests
// =============================================================================

#[test]
fn test_directory_truncates_at_index_k() {
    for k in 0..4 {
        let mut addresses: Vec<ElementAddress> = (0..4u32).map(|i| ElementAddress::new(i * 100, i * 100 + 50)).collect();
        addresses[k].sentinel = 0x1234;

        let decoded = decode_directory(&encode_directory(&addresses));
        assert_eq!(decoded.len(), k);
        assert_eq!(&decoded[..], &addresses[..k]);
    }
}

#[test]
fn test_directory_entry_layout() {
    let bytes = ElementAddress::new(0x22f, 0x2a0).encode();
    assert_eq!(bytes, [0x2f, 0x02, 0, 0, 0xa0, 0x02, 0, 0, 0xff, 0xff, 0xff, 0x7f]);
}
