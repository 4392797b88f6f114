//! Storage Module
//!
//! Memory-or-disk backing for element payloads.
//!
//! ## Responsibilities
//! - Keep small blobs in memory, spill large ones to temp files
//! - Scope temp files to the container that created them
//! - Remove temp files deterministically when the container goes away
//! - Sweep scratch directories left behind by crashed runs
//!
//! ## Scratch Layout
//! ```text
//! {temp_root}/v8formats/
//!   └── c-XXXXXX/                 (top-level container)
//!         ├── blob-XXXXXX.header
//!         ├── blob-XXXXXX.data
//!         └── c-XXXXXX/           (nested container)
//!               └── blob-XXXXXX.data
//! ```

mod blob;
mod scratch;

pub use blob::{Blob, BlobKind, BlobReader, BlobWriter, StoragePolicy};
pub use scratch::{sweep_orphans, TempScope, SCOPE_PREFIX};
