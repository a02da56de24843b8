//! Text-source loading for shader compilation and reload
//!
//! The shader lifecycle re-reads stage sources on every reload, so the
//! read path is a seam: [`FsLoader`] for production, [`MemoryLoader`] for
//! embedded sources and tests.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Narrow file-I/O collaborator: read a whole text file.
///
/// A failed read is a reportable per-stage condition for the caller, never
/// fatal to a whole program object.
pub trait SourceLoader {
    /// Read the full text content at `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the path is unreadable.
    fn read_text(&self, path: &Path) -> io::Result<String>;
}

/// Loads sources from the filesystem, optionally under a root directory.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    root: Option<PathBuf>,
}

impl FsLoader {
    /// Loader resolving paths relative to the process working directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader resolving relative paths under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl SourceLoader for FsLoader {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        match (&self.root, path.is_relative()) {
            (Some(root), true) => std::fs::read_to_string(root.join(path)),
            _ => std::fs::read_to_string(path),
        }
    }
}

/// In-memory source store keyed by path.
///
/// Mutating a stored source between compiles is how tests (and tooling)
/// exercise hot-reload without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the source stored under `path`.
    pub fn insert(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) {
        self.files.insert(path.into(), source.into());
    }

    /// Remove the source stored under `path`.
    pub fn remove(&mut self, path: impl AsRef<Path>) -> Option<String> {
        self.files.remove(path.as_ref())
    }
}

impl SourceLoader for MemoryLoader {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no in-memory source at {}", path.display()),
            )
        })
    }
}
