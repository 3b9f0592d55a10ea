#![deny(missing_docs)]

//! # File Sources
//!
//! The filesystem seam used by the include resolver. Reads are synchronous
//! and block the caller.

use indexmap::IndexMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Synchronous read-to-string access to included files.
pub trait FileSource {
    /// Reads the whole file at `path`.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFiles;

impl FileSource for LocalFiles {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// An in-memory bundle of files, keyed by path.
///
/// Useful for compiling documents shipped inside a binary or assembled by a host.
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: IndexMap<PathBuf, String>,
}

impl MemoryFiles {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.insert(normalize(&path.into()), contents.into());
    }

    /// Builder-style variant of [`MemoryFiles::insert`].
    pub fn with(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }
}

impl FileSource for MemoryFiles {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(&normalize(path)).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )
        })
    }
}

/// Lexically normalizes a path: drops `.` and folds `x/..` into nothing.
///
/// A leading `..` on a relative path is kept; one directly under the root
/// or a prefix is dropped.
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(Component::ParentDir),
            },
            other => normalized.push(other),
        }
    }
    normalized
}
