//! Container parsing
//!
//! Reads a container from any seekable source: file header, directory, then
//! every element's header and data blob. With inflation enabled, payloads
//! are decompressed and those that turn out to be containers themselves are
//! parsed recursively into a child container.

use std::io::{Read, Seek, SeekFrom};

use crate::codec;
use crate::error::{Result, V8Error};
use crate::format::{
    decode_directory, decode_name, name_len_from_addresses, pager, ElementAddress, FileHeader,
    BLOCK_HEADER_SIZE, DIRECTORY_OFFSET, ELEMENT_ADDRESS_SIZE, ELEMENT_HEADER_PREFIX,
    FILE_HEADER_SIZE,
};
use crate::storage::{Blob, BlobKind, BlobWriter};

use super::{Container, Element, ElementData};

/// Populate `container` from `source`
///
/// Any failure aborts the whole load; the partially built container is left
/// untouched.
pub(super) fn load<R: Read + Seek>(container: &mut Container, source: &mut R, inflate: bool) -> Result<()> {
    let source_len = source.seek(SeekFrom::End(0))?;
    if !pager::validate_stream(source)? {
        return Err(V8Error::NotAContainer(format!(
            "{} bytes, no block header at offset {}",
            source_len, DIRECTORY_OFFSET
        )));
    }
    container.apply_size_ceiling(source_len);

    let mut raw_header = [0u8; FILE_HEADER_SIZE as usize];
    source.seek(SeekFrom::Start(0))?;
    source.read_exact(&mut raw_header)?;
    let header = FileHeader::decode(&raw_header)?;

    let addresses = read_directory(source)?;

    let mut elements = Vec::with_capacity(addresses.len());
    for (index, address) in addresses.iter().enumerate() {
        elements.push(load_element(container, source, index, address, inflate)?);
    }

    tracing::debug!(
        elements = elements.len(),
        bytes = source_len,
        inflate,
        "parsed container"
    );

    container.header = header;
    container.addresses = addresses;
    container.elements = elements;
    Ok(())
}

fn read_directory<R: Read + Seek>(source: &mut R) -> Result<Vec<ElementAddress>> {
    let block = pager::read_block_header(source, u64::from(DIRECTORY_OFFSET))?;
    if block.data_size == 0 {
        return Ok(Vec::new());
    }

    let directory = pager::read_blob_to_vec(source, DIRECTORY_OFFSET)?;
    let addresses = decode_directory(&directory);

    let declared = directory.len() / ELEMENT_ADDRESS_SIZE as usize;
    if addresses.len() < declared {
        tracing::debug!(
            declared,
            kept = addresses.len(),
            "directory entry without sentinel, ignoring the rest"
        );
    }
    Ok(addresses)
}

fn load_element<R: Read + Seek>(
    container: &mut Container,
    source: &mut R,
    index: usize,
    address: &ElementAddress,
    inflate: bool,
) -> Result<Element> {
    let policy = container.policy();

    let mut header = BlobWriter::new(BlobKind::Header, policy, &container.scope);
    pager::read_blob(source, address.header_addr, &mut header)?;
    let header = header.finish()?;

    if !address.has_data() {
        let entry = u64::from(DIRECTORY_OFFSET + BLOCK_HEADER_SIZE) + (index as u64) * u64::from(ELEMENT_ADDRESS_SIZE);
        return Err(V8Error::MissingDataBlock { index, offset: entry });
    }

    let mut raw = BlobWriter::new(BlobKind::Data, policy, &container.scope);
    pager::read_blob(source, address.data_addr, &mut raw)?;
    let raw = raw.finish()?;

    let name = read_name(source, address)?;

    let data = if inflate && container.data_packed {
        decode_payload(container, raw, &name)?
    } else {
        ElementData::Leaf(raw)
    };

    Ok(Element { name, header, data })
}

/// Read the name straight from the source, at its fixed offset in the header
fn read_name<R: Read + Seek>(source: &mut R, address: &ElementAddress) -> Result<String> {
    let len = name_len_from_addresses(address.header_addr, address.data_addr);
    let start = u64::from(address.header_addr) + u64::from(BLOCK_HEADER_SIZE + ELEMENT_HEADER_PREFIX);

    source.seek(SeekFrom::Start(start))?;
    let mut units = Vec::with_capacity(len as usize * 2);
    source.by_ref().take(u64::from(len) * 2).read_to_end(&mut units)?;
    Ok(decode_name(&units))
}

/// Inflate a payload and decode it as a nested container when it is one
///
/// A payload that does not inflate is kept raw, and the container stops
/// trying to inflate its remaining elements.
fn decode_payload(container: &mut Container, raw: Blob, name: &str) -> Result<ElementData> {
    let mut inflated = BlobWriter::new(BlobKind::Data, container.policy(), &container.scope);

    let outcome = codec::inflate(raw.reader()?, &mut inflated);
    match outcome {
        Ok(_) => {}
        Err(V8Error::InflateFailed(reason)) => {
            drop(inflated);
            tracing::warn!(element = name, %reason, "payload is not deflated, keeping raw bytes");
            container.data_packed = false;
            return Ok(ElementData::Leaf(raw));
        }
        Err(e) => return Err(e),
    }
    let inflated = inflated.finish()?;
    drop(raw);

    let mut reader = inflated.reader()?;
    if !pager::validate_stream(&mut reader)? {
        drop(reader);
        return Ok(ElementData::Leaf(inflated));
    }

    let mut nested = container.new_child();
    load(&mut nested, &mut reader, true)?;
    tracing::trace!(element = name, elements = nested.len(), "decoded nested container");
    Ok(ElementData::Nested(Box::new(nested)))
}
