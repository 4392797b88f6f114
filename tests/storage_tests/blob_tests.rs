//! Tests for blob storage and scratch directories
//!
//! These tests verify:
//! - The spill threshold in each operation mode
//! - Spilled blobs read back identically
//! - Scratch directories are created lazily and removed on drop
//! - Nested scopes live inside their parent's directory
//! - Orphan sweeping only touches old scope directories

use std::fs;
use std::io::{Read, Write};
use std::time::Duration;

use tempfile::TempDir;
use v8formats::storage::{sweep_orphans, Blob, BlobKind, BlobWriter, StoragePolicy, TempScope};
use v8formats::OperationMode;

// =============================================================================
// Helper Functions
// =============================================================================

const THRESHOLD: u64 = 1024;

fn optimal() -> StoragePolicy {
    StoragePolicy::new(OperationMode::Optimal, THRESHOLD)
}

fn write_blob(scope: &TempScope, policy: StoragePolicy, len: usize) -> Blob {
    let mut writer = BlobWriter::new(BlobKind::Data, policy, scope);
    let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    for chunk in bytes.chunks(100) {
        writer.write_all(chunk).unwrap();
    }
    writer.finish().unwrap()
}

// =============================================================================
// Policy Tests
// =============================================================================

#[test]
fn test_policy_modes() {
    assert!(!optimal().spills(THRESHOLD));
    assert!(optimal().spills(THRESHOLD + 1));
    assert!(StoragePolicy::new(OperationMode::FileSystem, THRESHOLD).spills(1));
    assert!(!StoragePolicy::new(OperationMode::MemoryUsage, THRESHOLD).spills(u64::MAX));
}

// =============================================================================
// BlobWriter Tests
// =============================================================================

#[test]
fn test_below_threshold_stays_in_memory() {
    let root = TempDir::new().unwrap();
    let scope = TempScope::root(root.path());

    let blob = write_blob(&scope, optimal(), THRESHOLD as usize - 1);
    assert!(!blob.is_spilled());
    assert_eq!(blob.len(), THRESHOLD - 1);
    assert!(scope.existing_path().is_none());
}

#[test]
fn test_above_threshold_spills() {
    let root = TempDir::new().unwrap();
    let scope = TempScope::root(root.path());

    let blob = write_blob(&scope, optimal(), THRESHOLD as usize + 1);
    assert!(blob.is_spilled());
    assert_eq!(blob.len(), THRESHOLD + 1);

    let path = blob.spill_path().unwrap();
    assert!(path.starts_with(scope.existing_path().unwrap()));
    assert_eq!(fs::metadata(path).unwrap().len(), THRESHOLD + 1);
}

#[test]
fn test_spilled_blob_reads_back() {
    let root = TempDir::new().unwrap();
    let scope = TempScope::root(root.path());
    let expected: Vec<u8> = (0..5000).map(|i| (i % 251) as u8).collect();

    let blob = write_blob(&scope, optimal(), expected.len());
    assert_eq!(blob.to_vec().unwrap(), expected);

    let mut via_reader = Vec::new();
    blob.reader().unwrap().read_to_end(&mut via_reader).unwrap();
    assert_eq!(via_reader, expected);

    let mut copied = Vec::new();
    assert_eq!(blob.copy_to(&mut copied).unwrap(), expected.len() as u64);
    assert_eq!(copied, expected);
}

#[test]
fn test_filesystem_mode_always_spills() {
    let root = TempDir::new().unwrap();
    let scope = TempScope::root(root.path());
    let policy = StoragePolicy::new(OperationMode::FileSystem, THRESHOLD);

    let blob = Blob::from_bytes(b"tiny".to_vec(), BlobKind::Header, policy, &scope).unwrap();
    assert!(blob.is_spilled());
    assert!(blob.spill_path().unwrap().to_string_lossy().ends_with(".header"));
}

#[test]
fn test_memory_mode_never_spills() {
    let root = TempDir::new().unwrap();
    let scope = TempScope::root(root.path());
    let policy = StoragePolicy::new(OperationMode::MemoryUsage, THRESHOLD);

    let blob = write_blob(&scope, policy, THRESHOLD as usize * 4);
    assert!(!blob.is_spilled());
}

// =============================================================================
// TempScope Tests
// =============================================================================

#[test]
fn test_scope_removed_on_drop() {
    let root = TempDir::new().unwrap();
    let scope = TempScope::root(root.path().join("scratch"));
    let dir = scope.path().unwrap().to_path_buf();

    let blob = write_blob(&scope, optimal(), THRESHOLD as usize * 2);
    assert!(dir.exists());

    drop(blob);
    drop(scope);
    assert!(!dir.exists());
}

#[test]
fn test_nested_scope_lives_in_parent() {
    let root = TempDir::new().unwrap();
    let parent = TempScope::root(root.path());
    let child = TempScope::nested(&parent);

    let child_dir = child.path().unwrap().to_path_buf();
    assert_eq!(child_dir.parent(), parent.existing_path());
    assert_eq!(child.temp_root(), root.path());

    drop(child);
    assert!(!child_dir.exists());
    assert!(parent.existing_path().unwrap().exists());
}

#[test]
fn test_scopes_have_distinct_dirs() {
    let root = TempDir::new().unwrap();
    let a = TempScope::root(root.path());
    let b = TempScope::root(root.path());
    assert_ne!(a.path().unwrap(), b.path().unwrap());
}

// =============================================================================
// Orphan Sweep Tests
// =============================================================================

#[test]
fn test_sweep_removes_old_dirs() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("c-orphan")).unwrap();
    fs::write(root.path().join("c-orphan").join("blob.data"), b"x").unwrap();
    fs::write(root.path().join("not-a-dir"), b"x").unwrap();

    let removed = sweep_orphans(root.path(), Duration::ZERO);
    assert_eq!(removed, 1);
    assert!(!root.path().join("c-orphan").exists());
    assert!(root.path().join("not-a-dir").exists());
}

#[test]
fn test_sweep_keeps_recent_dirs() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("c-live")).unwrap();

    assert_eq!(sweep_orphans(root.path(), Duration::from_secs(3600)), 0);
    assert!(root.path().join("c-live").exists());
}

#[test]
fn test_sweep_ignores_foreign_dirs() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("important")).unwrap();
    fs::write(root.path().join("important").join("notes.txt"), b"x").unwrap();
    fs::create_dir(root.path().join("c-orphan")).unwrap();

    assert_eq!(sweep_orphans(root.path(), Duration::ZERO), 1);
    assert!(root.path().join("important").join("notes.txt").exists());
    assert!(!root.path().join("c-orphan").exists());
}

#[test]
fn test_sweep_missing_root() {
    let root = TempDir::new().unwrap();
    assert_eq!(sweep_orphans(&root.path().join("missing"), Duration::ZERO), 0);
}
