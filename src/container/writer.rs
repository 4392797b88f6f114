//! Container serialization
//!
//! Addresses are computed in a layout pass before anything is written, so
//! the directory can be emitted first. Both passes size pages with
//! [`page_len`]; the writer checks its running offset against the layout.

use std::io::Write;

use crate::error::{Result, V8Error};
use crate::format::{
    encode_directory, page_len, write_blob, write_blob_bytes, ElementAddress, BLOCK_HEADER_SIZE,
    DEFAULT_PAGE_SIZE, ELEMENT_ADDRESS_SIZE, FILE_HEADER_SIZE,
};
use crate::storage::Blob;

use super::{Container, Element, ElementData};

/// Element headers are written with a page exactly their own size
const HEADER_MIN_PAGE: u32 = 0;

fn leaf_data(element: &Element) -> Result<&Blob> {
    match &element.data {
        ElementData::Leaf(blob) => Ok(blob),
        ElementData::Nested(_) => Err(V8Error::NestedNotPacked(element.name.clone())),
    }
}

fn blob_len(blob: &Blob, what: &str, name: &str) -> Result<u32> {
    u32::try_from(blob.len())
        .map_err(|_| V8Error::LayoutOverflow(format!("{} of element {:?} is {} bytes", what, name, blob.len())))
}

fn to_addr(offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| V8Error::LayoutOverflow(format!("offset {:#x}", offset)))
}

/// Compute the directory the writer will emit for `elements`
pub(super) fn layout(elements: &[Element]) -> Result<Vec<ElementAddress>> {
    let directory_len = u32::try_from(elements.len())
        .ok()
        .and_then(|n| n.checked_mul(ELEMENT_ADDRESS_SIZE))
        .ok_or_else(|| V8Error::LayoutOverflow(format!("{} elements", elements.len())))?;

    let mut cursor = u64::from(FILE_HEADER_SIZE)
        + u64::from(BLOCK_HEADER_SIZE)
        + u64::from(page_len(directory_len, DEFAULT_PAGE_SIZE));

    let mut addresses = Vec::with_capacity(elements.len());
    for element in elements {
        let header_len = blob_len(&element.header, "header", &element.name)?;
        let data_len = blob_len(leaf_data(element)?, "data", &element.name)?;

        let header_addr = to_addr(cursor)?;
        cursor += u64::from(BLOCK_HEADER_SIZE) + u64::from(page_len(header_len, HEADER_MIN_PAGE));

        let data_addr = to_addr(cursor)?;
        cursor += u64::from(BLOCK_HEADER_SIZE) + u64::from(page_len(data_len, DEFAULT_PAGE_SIZE));

        addresses.push(ElementAddress::new(header_addr, data_addr));
    }
    Ok(addresses)
}

/// Write `container` to `dest`, returning the number of bytes written
pub(super) fn write<W: Write + ?Sized>(container: &Container, dest: &mut W) -> Result<u64> {
    let addresses = layout(&container.elements)?;

    dest.write_all(&container.header.encode())?;
    let mut written = u64::from(FILE_HEADER_SIZE);
    written += write_blob_bytes(dest, &encode_directory(&addresses), DEFAULT_PAGE_SIZE)?;

    for (element, address) in container.elements.iter().zip(&addresses) {
        debug_assert_eq!(written, u64::from(address.header_addr));
        let header_len = blob_len(&element.header, "header", &element.name)?;
        written += write_blob(dest, &mut element.header.reader()?, header_len, HEADER_MIN_PAGE)?;

        debug_assert_eq!(written, u64::from(address.data_addr));
        let data = leaf_data(element)?;
        let data_len = blob_len(data, "data", &element.name)?;
        written += write_blob(dest, &mut data.reader()?, data_len, DEFAULT_PAGE_SIZE)?;
    }

    tracing::trace!(elements = addresses.len(), bytes = written, "wrote container");
    Ok(written)
}
