//! Element directory
//!
//! The directory is a flat array of `[header_addr][data_addr][sentinel]`
//! triples. Its length is never stored; it is implied by the blob size.

use super::{ELEMENT_ADDRESS_SIZE, SENTINEL};

/// Where one element's header and data pages begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementAddress {
    pub header_addr: u32,
    pub data_addr: u32,
    pub sentinel: u32,
}

impl ElementAddress {
    pub fn new(header_addr: u32, data_addr: u32) -> Self {
        Self {
            header_addr,
            data_addr,
            sentinel: SENTINEL,
        }
    }

    pub fn encode(&self) -> [u8; ELEMENT_ADDRESS_SIZE as usize] {
        let mut out = [0u8; ELEMENT_ADDRESS_SIZE as usize];
        out[0..4].copy_from_slice(&self.header_addr.to_le_bytes());
        out[4..8].copy_from_slice(&self.data_addr.to_le_bytes());
        out[8..12].copy_from_slice(&self.sentinel.to_le_bytes());
        out
    }

    /// Decode from exactly 12 bytes
    pub fn decode(bytes: &[u8; ELEMENT_ADDRESS_SIZE as usize]) -> Self {
        Self {
            header_addr: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            data_addr: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            sentinel: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        }
    }

    pub fn has_sentinel(&self) -> bool {
        self.sentinel == SENTINEL
    }

    pub fn has_data(&self) -> bool {
        self.data_addr != SENTINEL
    }
}

/// Parse a directory blob
///
/// Trailing bytes that do not fill a whole triple are ignored. The first
/// entry without the sentinel ends the directory; it and everything after
/// it are dropped.
pub fn decode_directory(blob: &[u8]) -> Vec<ElementAddress> {
    blob.chunks_exact(ELEMENT_ADDRESS_SIZE as usize)
        .filter_map(|chunk| chunk.try_into().ok())
        .map(ElementAddress::decode)
        .take_while(ElementAddress::has_sentinel)
        .collect()
}

/// Serialize addresses into a directory blob
pub fn encode_directory(addresses: &[ElementAddress]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(addresses.len() * ELEMENT_ADDRESS_SIZE as usize);
    for address in addresses {
        blob.extend_from_slice(&address.encode());
    }
    blob
}
