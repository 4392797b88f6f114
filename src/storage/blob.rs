//! Blob storage
//!
//! A `Blob` is one header or data payload, held in memory or in a temp file.
//! `BlobWriter` decides which while the bytes are being produced: it buffers
//! in memory and only creates the backing file once the policy says so.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};

use tempfile::NamedTempFile;

use crate::config::OperationMode;
use crate::error::{Result, V8Error};

use super::TempScope;

// =============================================================================
// Policy
// =============================================================================

/// Per-container decision of when a blob goes to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoragePolicy {
    pub mode: OperationMode,
    pub spill_threshold: u64,
}

impl StoragePolicy {
    pub fn new(mode: OperationMode, spill_threshold: u64) -> Self {
        Self { mode, spill_threshold }
    }

    /// Should a blob that has grown to `len` bytes live on disk?
    pub fn spills(&self, len: u64) -> bool {
        match self.mode {
            OperationMode::MemoryUsage => false,
            OperationMode::FileSystem => true,
            OperationMode::Optimal => len > self.spill_threshold,
        }
    }
}

/// What a blob holds, used to name its temp file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobKind {
    Header,
    Data,
}

impl BlobKind {
    fn suffix(self) -> &'static str {
        match self {
            BlobKind::Header => ".header",
            BlobKind::Data => ".data",
        }
    }
}

// =============================================================================
// Blob
// =============================================================================

/// One stored payload
#[derive(Debug)]
pub enum Blob {
    Memory(Vec<u8>),
    Spilled { file: NamedTempFile, len: u64 },
}

impl Blob {
    /// Store `bytes`, spilling according to `policy`
    pub fn from_bytes(bytes: Vec<u8>, kind: BlobKind, policy: StoragePolicy, scope: &TempScope) -> Result<Self> {
        if !policy.spills(bytes.len() as u64) {
            return Ok(Blob::Memory(bytes));
        }
        let mut writer = BlobWriter::new(kind, policy, scope);
        writer.write_all(&bytes)?;
        writer.finish()
    }

    pub fn len(&self) -> u64 {
        match self {
            Blob::Memory(bytes) => bytes.len() as u64,
            Blob::Spilled { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the payload lives in a temp file
    pub fn is_spilled(&self) -> bool {
        matches!(self, Blob::Spilled { .. })
    }

    /// Path of the backing temp file, if any
    pub fn spill_path(&self) -> Option<&std::path::Path> {
        match self {
            Blob::Memory(_) => None,
            Blob::Spilled { file, .. } => Some(file.path()),
        }
    }

    /// A fresh reader positioned at the start of the payload
    pub fn reader(&self) -> Result<BlobReader<'_>> {
        match self {
            Blob::Memory(bytes) => Ok(BlobReader::Memory(Cursor::new(bytes.as_slice()))),
            Blob::Spilled { file, .. } => {
                let handle = file
                    .reopen()
                    .map_err(|e| V8Error::io_at("reopen spilled blob", file.path(), e))?;
                Ok(BlobReader::File(BufReader::new(handle)))
            }
        }
    }

    /// Copy the whole payload into memory
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        match self {
            Blob::Memory(bytes) => Ok(bytes.clone()),
            Blob::Spilled { len, .. } => {
                let mut out = Vec::with_capacity(*len as usize);
                self.reader()?.read_to_end(&mut out)?;
                Ok(out)
            }
        }
    }

    /// Stream the payload into `dest`
    pub fn copy_to<W: Write + ?Sized>(&self, dest: &mut W) -> Result<u64> {
        match self {
            Blob::Memory(bytes) => {
                dest.write_all(bytes)?;
                Ok(bytes.len() as u64)
            }
            Blob::Spilled { .. } => Ok(io::copy(&mut self.reader()?, dest)?),
        }
    }
}

/// Reader over a blob, whichever backend holds it
pub enum BlobReader<'a> {
    Memory(Cursor<&'a [u8]>),
    File(BufReader<File>),
}

impl Read for BlobReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            BlobReader::Memory(cursor) => cursor.read(buf),
            BlobReader::File(file) => file.read(buf),
        }
    }
}

impl Seek for BlobReader<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            BlobReader::Memory(cursor) => cursor.seek(pos),
            BlobReader::File(file) => file.seek(pos),
        }
    }
}

// =============================================================================
// BlobWriter
// =============================================================================

/// Builds a blob incrementally, spilling to disk once the policy requires it
pub struct BlobWriter<'a> {
    kind: BlobKind,
    policy: StoragePolicy,
    scope: &'a TempScope,
    sink: Sink,
    len: u64,
}

enum Sink {
    Memory(Vec<u8>),
    File(BufWriter<NamedTempFile>),
}

impl<'a> BlobWriter<'a> {
    pub fn new(kind: BlobKind, policy: StoragePolicy, scope: &'a TempScope) -> Self {
        Self {
            kind,
            policy,
            scope,
            sink: Sink::Memory(Vec::new()),
            len: 0,
        }
    }

    /// Bytes written so far
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(self) -> Result<Blob> {
        match self.sink {
            Sink::Memory(bytes) => Ok(Blob::Memory(bytes)),
            Sink::File(writer) => {
                let file = writer
                    .into_inner()
                    .map_err(|e| V8Error::Io(e.into_error()))?;
                Ok(Blob::Spilled { file, len: self.len })
            }
        }
    }

    /// Move buffered bytes into a new temp file in the scope directory
    fn spill(&mut self) -> io::Result<()> {
        let dir = self
            .scope
            .path()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        let file = tempfile::Builder::new()
            .prefix("blob-")
            .suffix(self.kind.suffix())
            .tempfile_in(dir)?;

        let mut writer = BufWriter::new(file);
        if let Sink::Memory(buffer) = &self.sink {
            writer.write_all(buffer)?;
        }

        tracing::trace!(path = %writer.get_ref().path().display(), bytes = self.len, "spilled blob to disk");
        self.sink = Sink::File(writer);
        Ok(())
    }
}

impl Write for BlobWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        if matches!(self.sink, Sink::Memory(_)) && self.policy.spills(self.len + buf.len() as u64) {
            self.spill()?;
        }

        let n = match &mut self.sink {
            Sink::Memory(bytes) => {
                bytes.extend_from_slice(buf);
                buf.len()
            }
            Sink::File(writer) => writer.write(buf)?,
        };
        self.len += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.sink {
            Sink::Memory(_) => Ok(()),
            Sink::File(writer) => writer.flush(),
        }
    }
}
