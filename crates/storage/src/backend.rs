//! Storage backend abstraction and the local disk implementation.
//!
//! Paths given to a backend are relative to its root and use `/` as the
//! separator.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File operations the chunk storage needs from a disk driver.
pub trait StorageBackend: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// Files directly inside `directory`, in listing order. A missing
    /// directory has no files.
    fn files(&self, directory: &str) -> io::Result<Vec<String>>;

    fn exists(&self, path: &str) -> bool;

    fn size(&self, path: &str) -> io::Result<u64>;

    fn last_modified(&self, path: &str) -> io::Result<SystemTime>;

    fn delete(&self, path: &str) -> io::Result<()>;

    fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    fn create_dir_all(&self, directory: &str) -> io::Result<()>;

    /// Absolute root on the host filesystem. Only local backends have one.
    fn local_root(&self) -> Option<&Path> {
        None
    }
}

/// A backend rooted at a directory of the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    /// Creates a backend rooted at `root`. Relative roots are resolved
    /// against the current directory.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }
}

impl StorageBackend for LocalDisk {
    fn name(&self) -> &str {
        "local"
    }

    fn files(&self, directory: &str) -> io::Result<Vec<String>> {
        let dir = self.resolve(directory);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let prefix = directory.trim_matches('/');
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            files.push(if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            });
        }
        Ok(files)
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }

    fn size(&self, path: &str) -> io::Result<u64> {
        Ok(fs::metadata(self.resolve(path))?.len())
    }

    fn last_modified(&self, path: &str) -> io::Result<SystemTime> {
        fs::metadata(self.resolve(path))?.modified()
    }

    fn delete(&self, path: &str) -> io::Result<()> {
        fs::remove_file(self.resolve(path))
    }

    fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        let to = self.resolve(to);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(self.resolve(from), to)
    }

    fn create_dir_all(&self, directory: &str) -> io::Result<()> {
        fs::create_dir_all(self.resolve(directory))
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}
