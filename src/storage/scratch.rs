//! Scratch directories
//!
//! Every container owns one `TempScope`. The directory behind it is created
//! on first use, nested inside the parent container's directory when there
//! is one, and removed recursively when the scope is dropped.

use std::cell::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use crate::error::{Result, V8Error};

/// Name prefix of every scope directory; the sweep touches nothing else
pub const SCOPE_PREFIX: &str = "c-";

/// Lazily created, uniquely named scratch directory
pub struct TempScope {
    base: ScopeBase,
    dir: OnceCell<TempDir>,
}

enum ScopeBase {
    /// Top-level container: lives directly under the configured temp root
    Root(PathBuf),
    /// Nested container: lives inside the parent's directory (non-owning link)
    Nested { parent: Weak<TempScope>, root: PathBuf },
}

impl TempScope {
    /// Scope for a top-level container
    pub fn root(temp_root: impl Into<PathBuf>) -> Rc<Self> {
        Rc::new(Self {
            base: ScopeBase::Root(temp_root.into()),
            dir: OnceCell::new(),
        })
    }

    /// Scope for a container nested inside the owner of `parent`
    pub fn nested(parent: &Rc<TempScope>) -> Rc<Self> {
        Rc::new(Self {
            base: ScopeBase::Nested {
                parent: Rc::downgrade(parent),
                root: parent.temp_root().to_path_buf(),
            },
            dir: OnceCell::new(),
        })
    }

    /// The configured temp root this scope ultimately lives under
    pub fn temp_root(&self) -> &Path {
        match &self.base {
            ScopeBase::Root(root) => root,
            ScopeBase::Nested { root, .. } => root,
        }
    }

    /// Path of the scratch directory, creating it (and its parents) on first call
    pub fn path(&self) -> Result<&Path> {
        if let Some(dir) = self.dir.get() {
            return Ok(dir.path());
        }

        let base = match &self.base {
            ScopeBase::Root(root) => root.clone(),
            // Falls back to the root if the parent is already gone
            ScopeBase::Nested { parent, root } => match parent.upgrade() {
                Some(parent) => parent.path()?.to_path_buf(),
                None => root.clone(),
            },
        };

        fs::create_dir_all(&base).map_err(|e| V8Error::io_at("create temp root", &base, e))?;
        let dir = tempfile::Builder::new()
            .prefix(SCOPE_PREFIX)
            .tempdir_in(&base)
            .map_err(|e| V8Error::io_at("create temp dir", &base, e))?;

        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(self.dir.get_or_init(|| dir).path())
    }

    /// Path of the scratch directory if it has been created
    pub fn existing_path(&self) -> Option<&Path> {
        self.dir.get().map(TempDir::path)
    }
}

impl std::fmt::Debug for TempScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempScope")
            .field("root", &self.temp_root())
            .field("path", &self.existing_path())
            .finish()
    }
}

impl Drop for TempScope {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove scratch directory");
            }
        }
    }
}

/// Remove scope directories under `scratch_dir` older than `max_age`
///
/// Only entries named `c-*` are considered. Best effort: anything that
/// cannot be inspected or removed is skipped.
/// Returns the number of directories removed.
pub fn sweep_orphans(scratch_dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(scratch_dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(SCOPE_PREFIX) {
            continue;
        }
        let path = entry.path();
        let Ok(metadata) = entry.metadata() else { continue };
        if !metadata.is_dir() {
            continue;
        }

        let stamp = metadata.created().or_else(|_| metadata.modified());
        let age = match stamp.ok().and_then(|t| now.duration_since(t).ok()) {
            Some(age) => age,
            None => continue,
        };

        if age >= max_age {
            match fs::remove_dir_all(&path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to sweep orphaned scratch directory"),
            }
        }
    }

    if removed > 0 {
        tracing::debug!(removed, root = %scratch_dir.display(), "swept orphaned scratch directories");
    }
    removed
}
