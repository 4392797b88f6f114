//! Container Format Module
//!
//! Bit-exact structures of the paged container layout.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ FileHeader (16 bytes, raw LE u32)                           │
//! │   next_page_addr | page_size | storage_ver | reserved       │
//! ├─────────────────────────────────────────────────────────────┤
//! │ BlockHeader (31 bytes, ASCII)  ── directory page            │
//! │   "\r\n" data_size(8 hex) " " page_size(8 hex) " "          │
//! │   next_page_addr(8 hex) " " "\r\n"                          │
//! │ ElementAddress[] (12 bytes each, raw LE u32)                │
//! │   header_addr | data_addr | 0x7fffffff                      │
//! │ zero padding up to page_size (min 512)                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │ BlockHeader + element header  (page_size = header length)   │
//! │ BlockHeader + element data    (page_size >= 512)            │
//! │   ... repeated for each element ...                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A logical blob may span several pages chained through `next_page_addr`;
//! `0x7fffffff` terminates the chain.

mod address;
mod header;
mod name;
pub mod pager;

pub use address::{decode_directory, encode_directory, ElementAddress};
pub use header::{BlockHeader, FileHeader};
pub use name::{decode_name, encode_element_header, is_invalid_name_char, name_len_from_addresses};
pub use pager::{read_blob, read_blob_to_vec, validate, write_blob, write_blob_bytes};

// =============================================================================
// Shared Constants
// =============================================================================

/// "No next page" / "no data block" / "end of directory"
pub const SENTINEL: u32 = 0x7fff_ffff;

/// FileHeader size: 4 x u32
pub const FILE_HEADER_SIZE: u32 = 16;

/// BlockHeader size: CRLF + 3 x (8 hex + space) + CRLF
pub const BLOCK_HEADER_SIZE: u32 = 31;

/// ElementAddress size: 3 x u32
pub const ELEMENT_ADDRESS_SIZE: u32 = 12;

/// Smallest page the writer emits for the directory and element data
pub const DEFAULT_PAGE_SIZE: u32 = 512;

/// Offset of the name inside an element header (two timestamps + reserved u32)
pub const ELEMENT_HEADER_PREFIX: u32 = 20;

/// Trailing zero bytes after the name inside an element header
pub const ELEMENT_HEADER_SUFFIX: u32 = 4;

/// Directory page offset: right after the FileHeader
pub const DIRECTORY_OFFSET: u32 = FILE_HEADER_SIZE;

/// Bytes needed before a buffer can even be considered a container
pub const MIN_CONTAINER_SIZE: usize = (FILE_HEADER_SIZE + BLOCK_HEADER_SIZE) as usize;

/// Physical length of a page holding `len` bytes with the given minimum page size
///
/// Used by both the layout pass and the writer; they must agree.
pub fn page_len(len: u32, min_page_size: u32) -> u32 {
    len.max(min_page_size)
}
