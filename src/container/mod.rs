//! Container Module
//!
//! The recursive aggregate: a file header, a directory and an ordered list of
//! elements, where an element's payload may itself be a container.
//!
//! ## Lifecycle
//! ```text
//!   Container::new ──► parse / open / from_folder / from_unpacked_folder
//!                              │
//!                              ▼
//!                  inspect, pack(), save_to_folder()
//!                              │
//!                              ▼
//!                  write_to / save ──► close (or drop)
//! ```
//!
//! Temp files created while the container is open live in its `TempScope`
//! and disappear when the container is closed or dropped.

mod folder;
mod reader;
mod writer;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use std::rc::Rc;

use crate::codec::DeflateWriter;
use crate::config::{Config, OperationMode};
use crate::error::{Result, V8Error};
use crate::format::{encode_element_header, ElementAddress, FileHeader};
use crate::storage::{Blob, BlobKind, BlobWriter, StoragePolicy, TempScope};

// =============================================================================
// Element
// =============================================================================

/// One named entry of a container
#[derive(Debug)]
pub struct Element {
    name: String,
    header: Blob,
    data: ElementData,
}

/// Payload of an element
#[derive(Debug)]
pub enum ElementData {
    /// Opaque bytes (compressed or not, depending on how it was loaded)
    Leaf(Blob),
    /// A container decoded from the (inflated) payload
    Nested(Box<Container>),
}

impl Element {
    /// Name decoded from the header
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw header blob
    pub fn header(&self) -> &Blob {
        &self.header
    }

    pub fn data(&self) -> &ElementData {
        &self.data
    }

    pub fn is_container(&self) -> bool {
        matches!(self.data, ElementData::Nested(_))
    }

    /// Leaf payload, or None for a nested container
    pub fn leaf(&self) -> Option<&Blob> {
        match &self.data {
            ElementData::Leaf(blob) => Some(blob),
            ElementData::Nested(_) => None,
        }
    }

    /// Nested container, or None for a leaf
    pub fn nested(&self) -> Option<&Container> {
        match &self.data {
            ElementData::Leaf(_) => None,
            ElementData::Nested(container) => Some(container),
        }
    }
}

// =============================================================================
// Container
// =============================================================================

/// Size limits carried from the config into every nested container
#[derive(Debug, Clone, Copy)]
struct Limits {
    spill_threshold: u64,
    file_size_ceiling: u64,
}

/// A parsed or built container
///
/// Not `Send`: a container tree belongs to the call stack that built it.
#[derive(Debug)]
pub struct Container {
    header: FileHeader,
    addresses: Vec<ElementAddress>,
    // Declared before `scope` so spilled blobs are dropped before their directory
    elements: Vec<Element>,
    mode: OperationMode,
    limits: Limits,
    /// Still assuming element payloads are deflated (cleared on first failure)
    data_packed: bool,
    scope: Rc<TempScope>,
}

impl Container {
    /// Create an empty top-level container
    pub fn new(config: &Config) -> Self {
        Self {
            header: FileHeader::default(),
            addresses: Vec::new(),
            elements: Vec::new(),
            mode: config.mode,
            limits: Limits {
                spill_threshold: config.spill_threshold,
                file_size_ceiling: config.file_size_ceiling,
            },
            data_packed: true,
            scope: TempScope::root(config.scratch_dir()),
        }
    }

    /// Create an empty container meant to be nested inside this one
    ///
    /// Shares this container's mode and limits; its scratch directory lives
    /// inside this container's.
    pub fn new_child(&self) -> Self {
        Self {
            header: FileHeader::default(),
            addresses: Vec::new(),
            elements: Vec::new(),
            mode: self.mode,
            limits: self.limits,
            data_packed: true,
            scope: TempScope::nested(&self.scope),
        }
    }

    /// Parse a container from a seekable stream
    ///
    /// With `inflate`, element payloads are decompressed and nested
    /// containers are decoded recursively. Without it every payload is kept
    /// exactly as stored.
    pub fn parse<R: Read + Seek>(source: &mut R, config: &Config, inflate: bool) -> Result<Self> {
        let mut container = Self::new(config);
        reader::load(&mut container, source, inflate)?;
        Ok(container)
    }

    /// Parse a container file
    pub fn open(path: &Path, config: &Config, inflate: bool) -> Result<Self> {
        let file = File::open(path).map_err(|e| V8Error::io_at("open container", path, e))?;
        let mut source = BufReader::new(file);
        Self::parse(&mut source, config, inflate)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Directory as last parsed, or as laid out by the last `pack()`
    pub fn addresses(&self) -> &[ElementAddress] {
        &self.addresses
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn mode(&self) -> OperationMode {
        self.mode
    }

    /// False once an element payload failed to inflate during parsing
    pub fn is_data_packed(&self) -> bool {
        self.data_packed
    }

    /// Scratch directory, if this container has created one
    pub fn temp_dir(&self) -> Option<&Path> {
        self.scope.existing_path()
    }

    fn policy(&self) -> StoragePolicy {
        StoragePolicy::new(self.mode, self.limits.spill_threshold)
    }

    /// Switch `Optimal` to `FileSystem` when the input is larger than the ceiling
    fn apply_size_ceiling(&mut self, input_size: u64) {
        if self.mode == OperationMode::Optimal && input_size > self.limits.file_size_ceiling {
            tracing::debug!(
                input_size,
                ceiling = self.limits.file_size_ceiling,
                "input exceeds size ceiling, switching to file system mode"
            );
            self.mode = OperationMode::FileSystem;
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Append a leaf element with the given (uncompressed) payload
    pub fn push_leaf(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let header = self.new_header(name)?;
        let data = Blob::from_bytes(data, BlobKind::Data, self.policy(), &self.scope)?;
        self.elements.push(Element {
            name: name.to_string(),
            header,
            data: ElementData::Leaf(data),
        });
        Ok(())
    }

    /// Append a nested container element
    pub fn push_nested(&mut self, name: &str, nested: Container) -> Result<()> {
        let header = self.new_header(name)?;
        self.elements.push(Element {
            name: name.to_string(),
            header,
            data: ElementData::Nested(Box::new(nested)),
        });
        Ok(())
    }

    /// Append an element whose header and payload are taken verbatim
    pub fn push_raw(&mut self, name: &str, header: Blob, data: Blob) {
        self.elements.push(Element {
            name: name.to_string(),
            header,
            data: ElementData::Leaf(data),
        });
    }

    fn new_header(&self, name: &str) -> Result<Blob> {
        let header = encode_element_header(name)?;
        Blob::from_bytes(header, BlobKind::Header, self.policy(), &self.scope)
    }

    /// Compress every payload, depth first
    ///
    /// Leaves are deflated in place. A nested container is packed, written
    /// out and deflated as a single unit, after which it is an ordinary leaf.
    pub fn pack(&mut self) -> Result<()> {
        let policy = self.policy();
        let scope = &self.scope;

        for element in self.elements.iter_mut() {
            let packed = match &mut element.data {
                ElementData::Leaf(blob) => {
                    let mut out = BlobWriter::new(BlobKind::Data, policy, scope);
                    let mut encoder = DeflateWriter::new(&mut out);
                    blob.copy_to(&mut encoder)
                        .map_err(|e| deflate_error(&element.name, e))?;
                    let (_, compressed) = encoder.finish()?;
                    tracing::trace!(element = %element.name, plain = blob.len(), compressed, "deflated leaf");
                    out.finish()?
                }
                ElementData::Nested(nested) => {
                    nested.pack()?;
                    let mut out = BlobWriter::new(BlobKind::Data, policy, scope);
                    let mut encoder = DeflateWriter::new(&mut out);
                    let plain = nested
                        .write_to(&mut encoder)
                        .map_err(|e| deflate_error(&element.name, e))?;
                    let (_, compressed) = encoder.finish()?;
                    tracing::trace!(element = %element.name, plain, compressed, "deflated nested container");
                    out.finish()?
                }
            };
            element.data = ElementData::Leaf(packed);
        }

        self.data_packed = true;
        self.addresses = writer::layout(&self.elements)?;
        tracing::debug!(elements = self.elements.len(), "packed container");
        Ok(())
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Serialize into `dest`; every element must be a leaf
    pub fn write_to<W: Write + ?Sized>(&self, dest: &mut W) -> Result<u64> {
        writer::write(self, dest)
    }

    /// Serialize into memory
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Serialize into a file, replacing it
    pub fn save(&self, path: &Path) -> Result<u64> {
        let file = File::create(path).map_err(|e| V8Error::io_at("create container", path, e))?;
        let mut out = BufWriter::new(file);
        let written = self.write_to(&mut out)?;
        out.flush().map_err(|e| V8Error::io_at("write container", path, e))?;
        Ok(written)
    }

    /// Addresses the next `write_to` would produce
    pub fn layout(&self) -> Result<Vec<ElementAddress>> {
        writer::layout(&self.elements)
    }

    /// Release the container and its temp files now
    pub fn close(mut self) {
        // Elements first: nested scopes and spilled blobs live inside ours
        self.elements.clear();
        if let Some(path) = self.scope.existing_path() {
            tracing::trace!(path = %path.display(), "closing container scratch directory");
        }
    }
}

fn deflate_error(name: &str, error: V8Error) -> V8Error {
    match error {
        V8Error::Io(e) => V8Error::DeflateFailed(format!("element {:?}: {}", name, e)),
        other => other,
    }
}
