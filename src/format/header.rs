//! File and block headers

use crate::error::{Result, V8Error};

use super::{BLOCK_HEADER_SIZE, FILE_HEADER_SIZE, SENTINEL};

/// The 16-byte header at the start of every container
///
/// All four fields are opaque to the codec and round-trip verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub next_page_addr: u32,
    pub page_size: u32,
    pub storage_ver: u32,
    pub reserved: u32,
}

impl Default for FileHeader {
    /// The constant header written when building from a folder:
    /// `FF FF FF 7F 00 02 00 00 00 00 00 00 00 00 00 00`
    fn default() -> Self {
        Self {
            next_page_addr: SENTINEL,
            page_size: 0x200,
            storage_ver: 0,
            reserved: 0,
        }
    }
}

impl FileHeader {
    pub fn encode(&self) -> [u8; FILE_HEADER_SIZE as usize] {
        let mut out = [0u8; FILE_HEADER_SIZE as usize];
        out[0..4].copy_from_slice(&self.next_page_addr.to_le_bytes());
        out[4..8].copy_from_slice(&self.page_size.to_le_bytes());
        out[8..12].copy_from_slice(&self.storage_ver.to_le_bytes());
        out[12..16].copy_from_slice(&self.reserved.to_le_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FILE_HEADER_SIZE as usize {
            return Err(V8Error::NotAContainer(format!(
                "file header needs {} bytes, got {}",
                FILE_HEADER_SIZE,
                bytes.len()
            )));
        }

        let field = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

        Ok(Self {
            next_page_addr: field(0),
            page_size: field(4),
            storage_ver: field(8),
            reserved: field(12),
        })
    }
}

/// The 31-byte ASCII frame in front of every physical page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    /// Total size of the logical blob (only meaningful on the first page)
    pub data_size: u32,
    /// Payload capacity of this page
    pub page_size: u32,
    /// Address of the next page, or `SENTINEL`
    pub next_page_addr: u32,
}

// Offsets of the framing bytes and hex fields inside a block header
const DATA_SIZE_AT: usize = 2;
const PAGE_SIZE_AT: usize = 11;
const NEXT_PAGE_AT: usize = 20;
const HEX_LEN: usize = 8;

impl BlockHeader {
    /// Header for a single page holding the whole blob
    pub fn single_page(data_size: u32, page_size: u32) -> Self {
        Self {
            data_size,
            page_size,
            next_page_addr: SENTINEL,
        }
    }

    /// True if the CR/LF/space framing bytes are all where they belong
    pub fn has_valid_framing(bytes: &[u8]) -> bool {
        bytes.len() >= BLOCK_HEADER_SIZE as usize
            && bytes[0] == b'\r'
            && bytes[1] == b'\n'
            && bytes[10] == b' '
            && bytes[19] == b' '
            && bytes[28] == b' '
            && bytes[29] == b'\r'
            && bytes[30] == b'\n'
    }

    pub fn encode(&self) -> [u8; BLOCK_HEADER_SIZE as usize] {
        let mut out = [0u8; BLOCK_HEADER_SIZE as usize];
        out[0] = b'\r';
        out[1] = b'\n';
        write_hex(&mut out[DATA_SIZE_AT..DATA_SIZE_AT + HEX_LEN], self.data_size);
        out[10] = b' ';
        write_hex(&mut out[PAGE_SIZE_AT..PAGE_SIZE_AT + HEX_LEN], self.page_size);
        out[19] = b' ';
        write_hex(&mut out[NEXT_PAGE_AT..NEXT_PAGE_AT + HEX_LEN], self.next_page_addr);
        out[28] = b' ';
        out[29] = b'\r';
        out[30] = b'\n';
        out
    }

    /// Decode a block header that was read from `offset` (used in error messages)
    pub fn decode(bytes: &[u8], offset: u64) -> Result<Self> {
        if !Self::has_valid_framing(bytes) {
            return Err(V8Error::malformed(offset, "block header framing is invalid"));
        }

        Ok(Self {
            data_size: read_hex(&bytes[DATA_SIZE_AT..DATA_SIZE_AT + HEX_LEN], offset, "data_size")?,
            page_size: read_hex(&bytes[PAGE_SIZE_AT..PAGE_SIZE_AT + HEX_LEN], offset, "page_size")?,
            next_page_addr: read_hex(
                &bytes[NEXT_PAGE_AT..NEXT_PAGE_AT + HEX_LEN],
                offset,
                "next_page_addr",
            )?,
        })
    }
}

fn write_hex(dst: &mut [u8], value: u32) {
    dst.copy_from_slice(format!("{:08x}", value).as_bytes());
}

fn read_hex(src: &[u8], offset: u64, field: &str) -> Result<u32> {
    // from_str_radix alone would take a leading '+'
    Some(src)
        .filter(|digits| digits.iter().all(u8::is_ascii_hexdigit))
        .and_then(|digits| std::str::from_utf8(digits).ok())
        .and_then(|s| u32::from_str_radix(s, 16).ok())
        .ok_or_else(|| V8Error::malformed(offset, format!("{} is not an 8-digit hex number: {:?}", field, src)))
}
