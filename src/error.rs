//! Error types for v8formats
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using V8Error
pub type Result<T> = std::result::Result<T, V8Error>;

/// Unified error type for v8formats operations
#[derive(Debug, Error)]
pub enum V8Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{op} failed for {}: {source}", path.display())]
    IoFailure {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    #[error("Not a container: {0}")]
    NotAContainer(String),

    #[error("Malformed block at offset {offset:#x}: {reason}")]
    MalformedBlock { offset: u64, reason: String },

    #[error("Element #{index} has no data block (directory entry at offset {offset:#x})")]
    MissingDataBlock { index: usize, offset: u64 },

    #[error("Container layout exceeds 32-bit addressing: {0}")]
    LayoutOverflow(String),

    // -------------------------------------------------------------------------
    // Compression Errors
    // -------------------------------------------------------------------------
    #[error("Inflate failed: {0}")]
    InflateFailed(String),

    #[error("Deflate failed: {0}")]
    DeflateFailed(String),

    // -------------------------------------------------------------------------
    // Element Errors
    // -------------------------------------------------------------------------
    #[error("Invalid element name {0:?}")]
    InvalidElementName(String),

    #[error("Element {0:?} still holds a nested container; pack it before serializing")]
    NestedNotPacked(String),
}

impl V8Error {
    /// Wrap an I/O error with the operation and path it happened on
    pub fn io_at(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        V8Error::IoFailure {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(offset: u64, reason: impl Into<String>) -> Self {
        V8Error::MalformedBlock {
            offset,
            reason: reason.into(),
        }
    }
}
