//! Element names
//!
//! An element header stores its name as 2-byte units right after a 20-byte
//! prefix. Only the first byte of each unit carries the character; the name
//! length is not stored but follows from the gap between the header and data
//! addresses, so the writer and the reader must agree on the header size.

use crate::error::{Result, V8Error};

use super::{BLOCK_HEADER_SIZE, ELEMENT_HEADER_PREFIX, ELEMENT_HEADER_SUFFIX};

/// Number of name characters implied by an element's addresses
///
/// `(data_addr - 4 - header_addr - BLOCK_HEADER_SIZE - 20) / 2`, clamped at 0.
pub fn name_len_from_addresses(header_addr: u32, data_addr: u32) -> u32 {
    data_addr
        .saturating_sub(ELEMENT_HEADER_SUFFIX)
        .saturating_sub(header_addr)
        .saturating_sub(BLOCK_HEADER_SIZE)
        .saturating_sub(ELEMENT_HEADER_PREFIX)
        / 2
}

/// Decode a name from raw 2-byte units
///
/// Stops at the first character that cannot appear in a file name on this
/// host and keeps the prefix before it. A trailing odd byte is ignored.
pub fn decode_name(units: &[u8]) -> String {
    units
        .chunks_exact(2)
        .map(|unit| unit[0] as char)
        .take_while(|&c| !is_invalid_name_char(c))
        .collect()
}

/// True for characters the host file system rejects in a file name
#[cfg(windows)]
pub fn is_invalid_name_char(c: char) -> bool {
    c.is_ascii_control() || matches!(c, '"' | '<' | '>' | '|' | ':' | '*' | '?' | '\\' | '/')
}

/// True for characters the host file system rejects in a file name
#[cfg(not(windows))]
pub fn is_invalid_name_char(c: char) -> bool {
    c == '\0' || c == '/'
}

/// Build the header blob for a new element
///
/// Layout: 20 zero bytes, the name as (char, 0) pairs, 4 zero bytes.
pub fn encode_element_header(name: &str) -> Result<Vec<u8>> {
    let mut header = vec![0u8; ELEMENT_HEADER_PREFIX as usize];
    for c in name.chars() {
        let byte = u8::try_from(u32::from(c))
            .map_err(|_| V8Error::InvalidElementName(name.to_string()))?;
        header.push(byte);
        header.push(0);
    }
    header.extend_from_slice(&[0u8; ELEMENT_HEADER_SUFFIX as usize]);
    Ok(header)
}
