//! Block pager
//!
//! Assembles a chain of physical pages into one logical blob and writes a
//! logical blob back out as a single padded page.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Result, V8Error};

use super::{
    page_len, BlockHeader, BLOCK_HEADER_SIZE, DIRECTORY_OFFSET, MIN_CONTAINER_SIZE, SENTINEL,
};

/// Zero buffer used for page padding
const PADDING: [u8; 4096] = [0u8; 4096];

// =============================================================================
// Reading
// =============================================================================

/// Read and decode the block header at `addr`
pub fn read_block_header<R: Read + Seek>(source: &mut R, addr: u64) -> Result<BlockHeader> {
    let mut raw = [0u8; BLOCK_HEADER_SIZE as usize];
    source.seek(SeekFrom::Start(addr))?;
    source.read_exact(&mut raw).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => V8Error::malformed(addr, "block header runs past end of input"),
        _ => V8Error::Io(e),
    })?;
    BlockHeader::decode(&raw, addr)
}

/// Copy the logical blob starting at `first_page` into `sink`
///
/// Follows `next_page_addr` until the declared size has been copied or the
/// chain ends. Returns the number of bytes copied.
pub fn read_blob<R, W>(source: &mut R, first_page: u32, sink: &mut W) -> Result<u64>
where
    R: Read + Seek,
    W: Write + ?Sized,
{
    let mut page_addr = u64::from(first_page);
    let mut header = read_block_header(source, page_addr)?;

    if header.data_size == 0 {
        return Err(V8Error::malformed(page_addr, "block declares zero data size"));
    }

    let mut remaining = u64::from(header.data_size);
    let mut copied = 0u64;
    let mut pages = 0usize;

    loop {
        if header.page_size == 0 {
            return Err(V8Error::malformed(page_addr, "page size is zero with data remaining"));
        }

        let chunk = u64::from(header.page_size).min(remaining);
        source.seek(SeekFrom::Start(page_addr + u64::from(BLOCK_HEADER_SIZE)))?;
        let got = io::copy(&mut source.by_ref().take(chunk), sink)?;
        if got != chunk {
            return Err(V8Error::malformed(
                page_addr,
                format!("page truncated: expected {} bytes, got {}", chunk, got),
            ));
        }

        copied += got;
        remaining -= got;
        pages += 1;

        if remaining == 0 || header.next_page_addr == SENTINEL {
            break;
        }

        page_addr = u64::from(header.next_page_addr);
        header = read_block_header(source, page_addr)?;
    }

    tracing::trace!(first_page, pages, bytes = copied, "read blob");
    Ok(copied)
}

/// Read a logical blob fully into memory
pub fn read_blob_to_vec<R: Read + Seek>(source: &mut R, first_page: u32) -> Result<Vec<u8>> {
    let mut blob = Vec::new();
    read_blob(source, first_page, &mut blob)?;
    Ok(blob)
}

// =============================================================================
// Writing
// =============================================================================

/// Write `len` bytes from `data` as one page of at least `min_page_size`
///
/// Returns the number of bytes written including header and padding, which
/// always equals `BLOCK_HEADER_SIZE + page_len(len, min_page_size)`.
pub fn write_blob<R, W>(dest: &mut W, data: &mut R, len: u32, min_page_size: u32) -> Result<u64>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let page_size = page_len(len, min_page_size);
    dest.write_all(&BlockHeader::single_page(len, page_size).encode())?;

    let copied = io::copy(&mut data.take(u64::from(len)), dest)?;
    if copied != u64::from(len) {
        return Err(V8Error::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("blob source ended after {} of {} bytes", copied, len),
        )));
    }

    let mut padding = u64::from(page_size - len);
    while padding > 0 {
        let step = padding.min(PADDING.len() as u64) as usize;
        dest.write_all(&PADDING[..step])?;
        padding -= step as u64;
    }

    Ok(u64::from(BLOCK_HEADER_SIZE) + u64::from(page_size))
}

/// Write an in-memory blob as one page
pub fn write_blob_bytes<W: Write + ?Sized>(dest: &mut W, bytes: &[u8], min_page_size: u32) -> Result<u64> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| V8Error::LayoutOverflow(format!("blob of {} bytes", bytes.len())))?;
    let mut data = bytes;
    write_blob(dest, &mut data, len, min_page_size)
}

// =============================================================================
// Validation
// =============================================================================

/// True if `bytes` starts like a container: a file header followed by a
/// correctly framed directory block header
pub fn validate(bytes: &[u8]) -> bool {
    bytes.len() >= MIN_CONTAINER_SIZE
        && BlockHeader::has_valid_framing(&bytes[DIRECTORY_OFFSET as usize..])
}

/// Stream variant of [`validate`]: peeks at the start of `source`
///
/// Leaves the stream position unchanged.
pub fn validate_stream<R: Read + Seek>(source: &mut R) -> Result<bool> {
    let position = source.stream_position()?;
    source.seek(SeekFrom::Start(0))?;

    let mut prefix = Vec::with_capacity(MIN_CONTAINER_SIZE);
    source.by_ref().take(MIN_CONTAINER_SIZE as u64).read_to_end(&mut prefix)?;

    source.seek(SeekFrom::Start(position))?;
    Ok(validate(&prefix))
}
