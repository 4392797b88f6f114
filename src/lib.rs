//! # v8formats
//!
//! Reader and writer for the paged, recursively nested binary container
//! format used by 1C:Enterprise 8 configuration files, with:
//! - Bit-exact parsing and serialization of the paged block layout
//! - Recursive inflate/deflate of nested containers
//! - Memory or temp-file backing for element payloads
//! - Folder conversions for unpacking, packing, parsing and building
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 CLI (unpack/pack/parse/build/...)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Pipeline                             │
//! │              (file verbs, orphan sweep)                     │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Container                             │
//! │         (parse / pack / serialize / folders)                │
//! └──────┬──────────────────────┬───────────────────────┬───────┘
//!        │                      │                       │
//!        ▼                      ▼                       ▼
//!  ┌───────────┐         ┌─────────────┐         ┌─────────────┐
//!  │  Format   │         │    Codec    │         │   Storage   │
//!  │  (pager)  │         │  (deflate)  │         │ (blob/temp) │
//!  └───────────┘         └─────────────┘         └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod format;
pub mod codec;
pub mod storage;
pub mod container;
pub mod pipeline;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{V8Error, Result};
pub use config::{Config, OperationMode, TEMP_DIR_NAME};
pub use container::{Container, Element, ElementData};
pub use pipeline::Pipeline;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of v8formats
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
