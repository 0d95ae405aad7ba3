//! # Storage Adapter
//!
//! Explicit storage capability injected into the harvester.
//!
//! The orchestrator never touches the filesystem directly; it goes through
//! this trait, so tests can point it at a tempdir and alternative backends
//! stay possible. Parent directories are created on first write.

use quip_core::QuipError;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

// =============================================================================
// ADAPTER TRAIT
// =============================================================================

/// Read/write/append capability over durable state.
pub trait StorageAdapter {
    /// Read a whole file. `Ok(None)` if it does not exist.
    fn read(&self, path: &Path) -> Result<Option<String>, QuipError>;

    /// Write a whole file, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &str) -> Result<(), QuipError>;

    /// Append one line (a trailing newline is added), creating the file and
    /// parent directories as needed.
    fn append_line(&self, path: &Path, line: &str) -> Result<(), QuipError>;

    /// Read a file as lines. Empty if the file does not exist.
    fn read_lines(&self, path: &Path) -> Result<Vec<String>, QuipError>;

    /// Size of a file in bytes. 0 if the file does not exist.
    fn file_size(&self, path: &Path) -> Result<u64, QuipError>;
}

// =============================================================================
// FILESYSTEM IMPLEMENTATION
// =============================================================================

/// Production adapter backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    fn ensure_parent(path: &Path) -> Result<(), QuipError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    QuipError::IoError(format!(
                        "Cannot create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        Ok(())
    }
}

impl StorageAdapter for FsStorage {
    fn read(&self, path: &Path) -> Result<Option<String>, QuipError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QuipError::IoError(format!(
                "Cannot read '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), QuipError> {
        Self::ensure_parent(path)?;
        fs::write(path, contents).map_err(|e| {
            QuipError::IoError(format!("Cannot write '{}': {}", path.display(), e))
        })
    }

    fn append_line(&self, path: &Path, line: &str) -> Result<(), QuipError> {
        Self::ensure_parent(path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                QuipError::IoError(format!("Cannot open '{}': {}", path.display(), e))
            })?;
        writeln!(file, "{line}").map_err(|e| {
            QuipError::IoError(format!("Cannot append to '{}': {}", path.display(), e))
        })
    }

    fn read_lines(&self, path: &Path) -> Result<Vec<String>, QuipError> {
        Ok(self
            .read(path)?
            .map(|contents| contents.lines().map(str::to_owned).collect())
            .unwrap_or_default())
    }

    fn file_size(&self, path: &Path) -> Result<u64, QuipError> {
        match fs::metadata(path) {
            Ok(metadata) => Ok(metadata.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(0),
            Err(e) => Err(QuipError::IoError(format!(
                "Cannot stat '{}': {}",
                path.display(),
                e
            ))),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
