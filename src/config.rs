//! Configuration for v8formats
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Name of the directory under `temp_root` that holds scratch data
pub const TEMP_DIR_NAME: &str = "v8formats";

/// Main configuration for container processing
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Where element blobs live while a container is open
    pub mode: OperationMode,

    /// Blobs larger than this (in bytes) are spilled to disk in `Optimal` mode
    pub spill_threshold: u64,

    /// Inputs larger than this (in bytes) switch `Optimal` to `FileSystem`
    pub file_size_ceiling: u64,

    // -------------------------------------------------------------------------
    // Scratch Configuration
    // -------------------------------------------------------------------------
    /// Parent of the scratch directory (never swept itself)
    /// Internal structure:
    ///   {temp_root}/
    ///     └── v8formats/
    ///           └── c-XXXXXX/          (one per top-level container)
    ///                 ├── {blob}.header / {blob}.data
    ///                 └── c-XXXXXX/ ... (nested containers)
    pub temp_root: PathBuf,

    /// Scratch directories older than this are treated as orphans and swept
    pub orphan_max_age: Duration,
}

/// Blob storage strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationMode {
    /// Spill only blobs above the threshold (and whole inputs above the ceiling)
    #[default]
    Optimal,

    /// Always keep blobs in memory
    MemoryUsage,

    /// Always spill blobs to temporary files
    FileSystem,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: OperationMode::Optimal,
            spill_threshold: 1024 * 1024,           // 1 MB
            file_size_ceiling: 200 * 1024 * 1024,   // 200 MB
            temp_root: std::env::temp_dir(),
            orphan_max_age: Duration::from_secs(60 * 60),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Directory owned by this tool under `temp_root`; only its `c-*`
    /// entries are ever created or swept
    pub fn scratch_dir(&self) -> PathBuf {
        self.temp_root.join(TEMP_DIR_NAME)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the operation mode
    pub fn mode(mut self, mode: OperationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the spill threshold (in bytes)
    pub fn spill_threshold(mut self, bytes: u64) -> Self {
        self.config.spill_threshold = bytes;
        self
    }

    /// Set the input size ceiling (in bytes)
    pub fn file_size_ceiling(mut self, bytes: u64) -> Self {
        self.config.file_size_ceiling = bytes;
        self
    }

    /// Set the scratch root directory
    pub fn temp_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.temp_root = path.into();
        self
    }

    /// Set the age after which scratch directories count as orphans
    pub fn orphan_max_age(mut self, age: Duration) -> Self {
        self.config.orphan_max_age = age;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
