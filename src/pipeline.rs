//! Pipeline Module
//!
//! File-level verbs over containers, one call per CLI command.
//!
//! ## Verbs
//! - `unpack` / `pack`: container file ⇄ raw `FileHeader` + `.header`/`.data` files
//! - `parse` / `build`: container file ⇄ source tree, inflating/deflating recursively
//! - `inflate` / `deflate`: raw deflate stream ⇄ plain file
//!
//! Every verb first sweeps scratch directories orphaned by earlier runs.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::codec;
use crate::config::Config;
use crate::container::Container;
use crate::error::{Result, V8Error};
use crate::storage::sweep_orphans;

/// Entry point for all file-level operations
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Split a container file into its raw parts
    ///
    /// Returns the number of elements written.
    pub fn unpack(&self, in_file: &Path, out_dir: &Path) -> Result<usize> {
        self.unpack_filtered(in_file, out_dir, None)
    }

    /// Like [`Pipeline::unpack`], but only writes the element called `name`
    pub fn unpack_element(&self, in_file: &Path, out_dir: &Path, name: &str) -> Result<usize> {
        self.unpack_filtered(in_file, out_dir, Some(name))
    }

    fn unpack_filtered(&self, in_file: &Path, out_dir: &Path, only: Option<&str>) -> Result<usize> {
        self.sweep();
        tracing::info!(input = %in_file.display(), output = %out_dir.display(), "unpacking");

        let container = Container::open(in_file, &self.config, false)?;
        let written = container.unpack_to_folder(out_dir, only)?;
        container.close();

        tracing::info!(elements = written, "unpack finished");
        Ok(written)
    }

    /// Reassemble a container file from an unpacked directory, uncompressed
    ///
    /// Returns the size of the written file.
    pub fn pack(&self, in_dir: &Path, out_file: &Path) -> Result<u64> {
        self.sweep();
        tracing::info!(input = %in_dir.display(), output = %out_file.display(), "packing");

        let container = Container::from_unpacked_folder(in_dir, &self.config)?;
        let written = container.save(out_file)?;
        container.close();

        tracing::info!(bytes = written, "pack finished");
        Ok(written)
    }

    /// Decode a container file recursively into a source tree
    ///
    /// Returns the number of files written.
    pub fn parse(&self, in_file: &Path, out_dir: &Path) -> Result<usize> {
        self.sweep();
        tracing::info!(input = %in_file.display(), output = %out_dir.display(), "parsing");

        let container = Container::open(in_file, &self.config, true)?;
        let files = container.save_to_folder(out_dir)?;
        container.close();

        tracing::info!(files, "parse finished");
        Ok(files)
    }

    /// Build a compressed container file from a source tree
    ///
    /// Returns the size of the written file.
    pub fn build(&self, in_dir: &Path, out_file: &Path) -> Result<u64> {
        self.sweep();
        tracing::info!(input = %in_dir.display(), output = %out_file.display(), "building");

        let mut container = Container::from_folder(in_dir, &self.config)?;
        container.pack()?;
        let written = container.save(out_file)?;
        container.close();

        tracing::info!(bytes = written, "build finished");
        Ok(written)
    }

    /// Decompress a raw deflate file; returns the inflated size
    pub fn inflate(&self, in_file: &Path, out_file: &Path) -> Result<u64> {
        self.sweep();
        tracing::info!(input = %in_file.display(), output = %out_file.display(), "inflating");

        let input = open_input(in_file)?;
        let mut output = create_output(out_file)?;
        let written = codec::inflate(input, &mut output)?;
        output.flush().map_err(|e| V8Error::io_at("write output", out_file, e))?;

        tracing::info!(bytes = written, "inflate finished");
        Ok(written)
    }

    /// Compress a file as raw deflate; returns the deflated size
    pub fn deflate(&self, in_file: &Path, out_file: &Path) -> Result<u64> {
        self.sweep();
        tracing::info!(input = %in_file.display(), output = %out_file.display(), "deflating");

        let input = open_input(in_file)?;
        let mut output = create_output(out_file)?;
        let written = codec::deflate(input, &mut output)?;
        output.flush().map_err(|e| V8Error::io_at("write output", out_file, e))?;

        tracing::info!(bytes = written, "deflate finished");
        Ok(written)
    }

    fn sweep(&self) {
        sweep_orphans(&self.config.scratch_dir(), self.config.orphan_max_age);
    }
}

fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| V8Error::io_at("open input", path, e))?;
    Ok(BufReader::new(file))
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| V8Error::io_at("create output", path, e))?;
    Ok(BufWriter::new(file))
}
