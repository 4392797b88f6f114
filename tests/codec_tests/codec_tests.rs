//! Tests for the raw deflate codec
//!
//! These tests verify:
//! - Streams survive deflate then inflate
//! - Output is raw deflate (no zlib or gzip wrapper)
//! - Garbage input fails with InflateFailed rather than an I/O error
//! - The streaming writer reports its compressed size

use std::io::Write;

use v8formats::codec::{deflate, deflate_bytes, inflate, inflate_bytes, DeflateWriter};
use v8formats::V8Error;

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_text() -> Vec<u8> {
    "{1,{\"name\",\"value\"},0}\r\n".repeat(500).into_bytes()
}

// =============================================================================
// Stream Tests
// =============================================================================

#[test]
fn test_deflate_then_inflate() {
    let plain = sample_text();
    let compressed = deflate_bytes(&plain).unwrap();
    assert!(compressed.len() < plain.len());
    assert_eq!(inflate_bytes(&compressed).unwrap(), plain);
}

#[test]
fn test_empty_input() {
    let compressed = deflate_bytes(&[]).unwrap();
    assert!(!compressed.is_empty());
    assert!(inflate_bytes(&compressed).unwrap().is_empty());
}

#[test]
fn test_reported_sizes() {
    let plain = sample_text();
    let mut compressed = Vec::new();
    let deflated = deflate(plain.as_slice(), &mut compressed).unwrap();
    assert_eq!(deflated, compressed.len() as u64);

    let mut out = Vec::new();
    let inflated = inflate(compressed.as_slice(), &mut out).unwrap();
    assert_eq!(inflated, plain.len() as u64);
}

#[test]
fn test_output_has_no_zlib_header() {
    let compressed = deflate_bytes(&sample_text()).unwrap();
    // A zlib stream would start with 0x78
    assert_ne!(compressed[0], 0x78);
    // A gzip stream would start with 1f 8b
    assert_ne!(&compressed[..2], &[0x1f, 0x8b]);
}

#[test]
fn test_invalid_stream_is_inflate_failure() {
    // Block type 3 is reserved in deflate
    let result = inflate_bytes(&[0xff, 0xff, 0xff, 0xff]);
    assert!(matches!(result, Err(V8Error::InflateFailed(_))));
}

// =============================================================================
// DeflateWriter Tests
// =============================================================================

#[test]
fn test_deflate_writer_streams_in_chunks() {
    let plain = sample_text();
    let mut writer = DeflateWriter::new(Vec::new());
    for chunk in plain.chunks(100) {
        writer.write_all(chunk).unwrap();
    }
    let (compressed, written) = writer.finish().unwrap();

    assert_eq!(written, compressed.len() as u64);
    assert_eq!(inflate_bytes(&compressed).unwrap(), plain);
}
