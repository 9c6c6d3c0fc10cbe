//! The chunk directory on a storage backend.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::backend::{LocalDisk, StorageBackend};
use crate::retention::RetentionWindow;
use crate::StorageError;

/// Extension that marks a file as an incomplete fragment.
pub const CHUNK_EXTENSION: &str = "part";

/// Returns `true` when `path` names a fragment file.
pub fn is_fragment(path: &str) -> bool {
    path.strip_suffix(CHUNK_EXTENSION)
        .is_some_and(|stem| stem.ends_with('.'))
}

/// Binds a storage backend, the chunk sub-directory and a retention window.
///
/// Cloning is cheap; clones share the backend.
#[derive(Debug, Clone)]
pub struct ChunkStorage {
    backend: Arc<dyn StorageBackend>,
    directory: String,
    retention: RetentionWindow,
}

impl ChunkStorage {
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        directory: impl Into<String>,
        retention: RetentionWindow,
    ) -> Self {
        Self {
            backend,
            directory: directory.into().trim_matches('/').to_owned(),
            retention,
        }
    }

    /// Chunk storage on a local disk rooted at `root`.
    pub fn local(
        root: impl Into<PathBuf>,
        directory: impl Into<String>,
        retention: RetentionWindow,
    ) -> Result<Self, StorageError> {
        let disk = LocalDisk::new(root)?;
        Ok(Self::new(Arc::new(disk), directory, retention))
    }

    pub fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    /// Chunk sub-directory, relative to the backend root.
    pub fn directory(&self) -> &str {
        &self.directory
    }

    pub fn retention(&self) -> RetentionWindow {
        self.retention
    }

    /// Absolute host path of the backend root.
    ///
    /// Fails with [`StorageError::UnsupportedBackend`] for backends without a
    /// local filesystem.
    pub fn absolute_path_prefix(&self) -> Result<PathBuf, StorageError> {
        self.backend
            .local_root()
            .map(|root| root.to_path_buf())
            .ok_or_else(|| StorageError::UnsupportedBackend(self.backend.name().to_owned()))
    }

    /// Absolute path of the chunk directory.
    pub fn chunk_directory(&self) -> Result<PathBuf, StorageError> {
        Ok(self.absolute_path_prefix()?.join(&self.directory))
    }

    /// Path of a file in the chunk directory, relative to the backend root.
    pub fn relative_path(&self, name: &str) -> String {
        if self.directory.is_empty() {
            name.to_owned()
        } else {
            format!("{}/{name}", self.directory)
        }
    }

    /// Absolute path of a file in the chunk directory.
    pub fn fragment_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        Ok(self.chunk_directory()?.join(name))
    }

    /// Absolute path of a backend-relative path.
    pub fn absolute_path(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let prefix = self.absolute_path_prefix()?;
        Ok(relative
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(prefix, |acc, part| acc.join(part)))
    }

    pub fn ensure_directory(&self) -> Result<(), StorageError> {
        self.backend.create_dir_all(&self.directory)?;
        Ok(())
    }

    /// Fragment paths (relative to the backend root) in backend listing
    /// order, optionally narrowed by `filter`.
    pub fn list_fragments(
        &self,
        filter: Option<&dyn Fn(&str) -> bool>,
    ) -> Result<Vec<String>, StorageError> {
        let files = self.backend.files(&self.directory)?;
        Ok(files
            .into_iter()
            .filter(|path| is_fragment(path))
            .filter(|path| filter.is_none_or(|keep| keep(path.as_str())))
            .collect())
    }

    /// Fragments with their metadata. Files removed between listing and
    /// inspection are skipped.
    pub fn stored_fragments(
        &self,
        filter: Option<&dyn Fn(&str) -> bool>,
    ) -> Result<Vec<StoredChunkFile>, StorageError> {
        let mut stored = Vec::new();
        for path in self.list_fragments(filter)? {
            match self.backend.last_modified(&path) {
                Ok(modified) => stored.push(StoredChunkFile::new(path, modified, self.clone())),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(stored)
    }

    /// Fragments last modified before `now - window`.
    pub fn stale_fragments(&self, window: RetentionWindow) -> Result<Vec<StoredChunkFile>, StorageError> {
        self.stale_fragments_at(window, SystemTime::now())
    }

    pub fn stale_fragments_at(
        &self,
        window: RetentionWindow,
        now: SystemTime,
    ) -> Result<Vec<StoredChunkFile>, StorageError> {
        Ok(self
            .stored_fragments(None)?
            .into_iter()
            .filter(|file| window.is_stale(file.modified(), now))
            .collect())
    }

    /// Fragments older than the configured retention window.
    pub fn old_fragments(&self) -> Result<Vec<StoredChunkFile>, StorageError> {
        self.stale_fragments(self.retention)
    }
}

/// A fragment currently on disk.
#[derive(Debug, Clone)]
pub struct StoredChunkFile {
    path: String,
    modified: SystemTime,
    storage: ChunkStorage,
}

impl StoredChunkFile {
    pub fn new(path: String, modified: SystemTime, storage: ChunkStorage) -> Self {
        Self {
            path,
            modified,
            storage,
        }
    }

    /// Path relative to the backend root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name without the directory.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    pub fn absolute_path(&self) -> Result<PathBuf, StorageError> {
        self.storage.absolute_path(&self.path)
    }

    pub fn size(&self) -> Result<u64, StorageError> {
        Ok(self.storage.backend().size(&self.path)?)
    }

    /// Moves the fragment to another backend-relative path.
    pub fn move_to(&mut self, to: &str) -> Result<(), StorageError> {
        self.storage.backend().rename(&self.path, to)?;
        self.path = to.to_owned();
        Ok(())
    }

    pub fn delete(&self) -> Result<(), StorageError> {
        self.storage.backend().delete(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(self.path.clone())
            } else {
                StorageError::Io(e)
            }
        })
    }
}

impl fmt::Display for StoredChunkFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modified: DateTime<Local> = self.modified.into();
        write!(
            f,
            "ChunkFile {} uploaded at {}",
            self.path,
            modified.format("%Y-%m-%d %H:%M:%S")
        )
    }
}
