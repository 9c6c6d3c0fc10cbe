//! Storage of chunk fragments.
//!
//! [`ChunkStorage`] binds a [`StorageBackend`] to the chunk sub-directory and
//! a [`RetentionWindow`]; [`RetentionSweeper`] removes abandoned fragments.

pub mod backend;
pub mod chunk_storage;
pub mod retention;
pub mod sweeper;

pub use backend::{LocalDisk, StorageBackend};
pub use chunk_storage::{CHUNK_EXTENSION, ChunkStorage, StoredChunkFile};
pub use retention::RetentionWindow;
pub use sweeper::{RetentionSweeper, SweepReport};

/// Errors that can occur in chunk storage.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend does not expose a local path: {0}")]
    UnsupportedBackend(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("invalid retention window: {0}")]
    InvalidRetention(String),

    #[error("background task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
