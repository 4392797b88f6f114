//! Folder conversions
//!
//! Two directory representations of a container:
//!
//! - A *source tree*: one file per leaf element, one subdirectory per nested
//!   container (`from_folder` / `save_to_folder`).
//! - An *unpacked* directory: the raw `FileHeader` plus a
//!   `<name>.header` / `<name>.data` pair per element, bytes exactly as
//!   stored (`unpack_to_folder` / `from_unpacked_folder`).

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, V8Error};
use crate::format::FileHeader;
use crate::storage::{Blob, BlobKind, BlobWriter};

use super::{Container, Element, ElementData};

/// File holding the raw file header in an unpacked directory
pub const FILE_HEADER_NAME: &str = "FileHeader";

const HEADER_EXT: &str = "header";
const DATA_EXT: &str = "data";

impl Container {
    // =========================================================================
    // Source trees
    // =========================================================================

    /// Build an unpacked container from a directory tree
    ///
    /// Entries whose name starts with `.` are skipped. Files come first, then
    /// subdirectories, each group sorted by name. Payloads are stored as-is;
    /// call [`Container::pack`] before writing.
    pub fn from_folder(dir: &Path, config: &Config) -> Result<Self> {
        let mut container = Self::new(config);
        container.apply_size_ceiling(folder_size(dir)?);
        container.load_folder(dir)?;
        tracing::debug!(path = %dir.display(), elements = container.len(), "loaded folder");
        Ok(container)
    }

    fn load_folder(&mut self, dir: &Path) -> Result<()> {
        let (files, dirs) = list_entries(dir)?;

        for (name, path) in files {
            let header = self.new_header(&name)?;
            let mut data = BlobWriter::new(BlobKind::Data, self.policy(), &self.scope);
            let mut file = File::open(&path).map_err(|e| V8Error::io_at("open element file", &path, e))?;
            io::copy(&mut file, &mut data).map_err(|e| V8Error::io_at("read element file", &path, e))?;
            let data = data.finish()?;
            self.elements.push(Element {
                name,
                header,
                data: ElementData::Leaf(data),
            });
        }

        for (name, path) in dirs {
            let header = self.new_header(&name)?;
            let mut nested = self.new_child();
            nested.load_folder(&path)?;
            self.elements.push(Element {
                name,
                header,
                data: ElementData::Nested(Box::new(nested)),
            });
        }
        Ok(())
    }

    /// Write the tree of this container into `dir`
    ///
    /// Leaves become files, nested containers become subdirectories.
    /// Returns the number of files written.
    pub fn save_to_folder(&self, dir: &Path) -> Result<usize> {
        fs::create_dir_all(dir).map_err(|e| V8Error::io_at("create directory", dir, e))?;

        let mut files = 0;
        for element in &self.elements {
            let path = dir.join(safe_file_name(&element.name)?);
            match &element.data {
                ElementData::Leaf(blob) => {
                    write_blob_file(&path, blob)?;
                    files += 1;
                }
                ElementData::Nested(nested) => files += nested.save_to_folder(&path)?,
            }
        }
        Ok(files)
    }

    // =========================================================================
    // Unpacked directories
    // =========================================================================

    /// Dump the raw file header and every element's header and data blob
    ///
    /// With `only`, just the element of that name is written. Returns the
    /// number of elements written.
    pub fn unpack_to_folder(&self, dir: &Path, only: Option<&str>) -> Result<usize> {
        fs::create_dir_all(dir).map_err(|e| V8Error::io_at("create directory", dir, e))?;

        let header_path = dir.join(FILE_HEADER_NAME);
        fs::write(&header_path, self.header.encode())
            .map_err(|e| V8Error::io_at("write file header", &header_path, e))?;

        let mut written = 0;
        for element in &self.elements {
            if only.is_some_and(|name| name != element.name) {
                continue;
            }
            let stem = safe_file_name(&element.name)?;
            let data = match &element.data {
                ElementData::Leaf(blob) => blob,
                ElementData::Nested(_) => return Err(V8Error::NestedNotPacked(element.name.clone())),
            };

            write_blob_file(&dir.join(format!("{}.{}", stem, HEADER_EXT)), &element.header)?;
            write_blob_file(&dir.join(format!("{}.{}", stem, DATA_EXT)), data)?;
            written += 1;
        }
        Ok(written)
    }

    /// Reassemble a container from an unpacked directory
    ///
    /// Every `<name>.header` (sorted by name) is paired with its sibling
    /// `<name>.data`; both are taken verbatim.
    pub fn from_unpacked_folder(dir: &Path, config: &Config) -> Result<Self> {
        let mut container = Self::new(config);
        container.apply_size_ceiling(folder_size(dir)?);

        let header_path = dir.join(FILE_HEADER_NAME);
        let raw = fs::read(&header_path).map_err(|e| V8Error::io_at("read file header", &header_path, e))?;
        container.header = FileHeader::decode(&raw)?;

        let mut headers: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(|e| V8Error::io_at("read directory", dir, e))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == HEADER_EXT))
            .collect();
        headers.sort();

        for header_path in headers {
            let Some(name) = header_path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            let data_path = header_path.with_extension(DATA_EXT);

            let header = read_blob_file(&container, &header_path, BlobKind::Header)?;
            let data = read_blob_file(&container, &data_path, BlobKind::Data)?;
            container.push_raw(&name, header, data);
        }
        container.addresses = container.layout()?;

        tracing::debug!(path = %dir.display(), elements = container.len(), "loaded unpacked folder");
        Ok(container)
    }
}

// =============================================================================
// Helpers
// =============================================================================

type Entries = Vec<(String, PathBuf)>;

/// Visible files and subdirectories of `dir`, each sorted by name
fn list_entries(dir: &Path) -> Result<(Entries, Entries)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| V8Error::io_at("read directory", dir, e))? {
        let entry = entry.map_err(|e| V8Error::io_at("read directory", dir, e))?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|raw| V8Error::InvalidElementName(raw.to_string_lossy().into_owned()))?;
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if path.is_dir() {
            dirs.push((name, path));
        } else {
            files.push((name, path));
        }
    }

    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

/// Total size of the visible files under `dir`
fn folder_size(dir: &Path) -> Result<u64> {
    let (files, dirs) = list_entries(dir)?;
    let mut total = 0u64;
    for (_, path) in files {
        total += fs::metadata(&path)
            .map_err(|e| V8Error::io_at("stat element file", &path, e))?
            .len();
    }
    for (_, path) in dirs {
        total += folder_size(&path)?;
    }
    Ok(total)
}

/// Reject names that would escape or alias the target directory
fn safe_file_name(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(V8Error::InvalidElementName(name.to_string()));
    }
    Ok(name)
}

fn write_blob_file(path: &Path, blob: &Blob) -> Result<()> {
    let file = File::create(path).map_err(|e| V8Error::io_at("create file", path, e))?;
    let mut out = BufWriter::new(file);
    blob.copy_to(&mut out)?;
    out.flush().map_err(|e| V8Error::io_at("write file", path, e))?;
    Ok(())
}

fn read_blob_file(container: &Container, path: &Path, kind: BlobKind) -> Result<Blob> {
    let mut file = File::open(path).map_err(|e| V8Error::io_at("open blob file", path, e))?;
    let mut blob = BlobWriter::new(kind, container.policy(), &container.scope);
    io::copy(&mut file, &mut blob).map_err(|e| V8Error::io_at("read blob file", path, e))?;
    blob.finish()
}
