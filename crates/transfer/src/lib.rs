//! Turning chunk uploads into complete files.
//!
//! Two strategies are provided: [`SequentialAssembler`] appends every chunk
//! to one growing fragment, [`ParallelAssembler`] stores one fragment per
//! chunk and merges them once all have arrived. Both serialise work per
//! upload through [`UploadLocks`].

mod assembled;
mod check;
mod locks;
mod merger;
mod naming;
mod natural;
mod parallel;
mod sequential;
mod validation;

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use chunk_upload_protocol::{ChunkUpload, ProtocolError, UploadedFile};
use chunk_upload_storage::StorageError;

pub use assembled::AssembledFile;
pub use check::{CheckOutcome, ChunkChecker};
pub use locks::UploadLocks;
pub use merger::FileMerger;
pub use naming::{IdentityPart, NamingPolicy, fingerprint, fragment_base, fragment_index};
pub use natural::natural_cmp;
pub use parallel::ParallelAssembler;
pub use sequential::{CompletionState, SequentialAssembler};
pub use validation::validate_file_name;

/// Errors produced while storing or assembling chunks.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("failed to open stream {path}: {source}")]
    StreamOpenFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no chunk files found to merge for {0}")]
    MissingFragmentsAtMerge(String),

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("upload failed: {0}")]
    InvalidUpload(String),

    #[error("chunk out of order: fragment holds {expected} bytes, chunk starts at {received}")]
    OutOfOrderChunk { expected: u64, received: u64 },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("background task failed: {0}")]
    TaskFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Returns `true` when the client should fix or restart its upload.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidFileName(_)
            | Self::InvalidUpload(_)
            | Self::OutOfOrderChunk { .. }
            | Self::MissingFragmentsAtMerge(_) => true,
            Self::Protocol(e) => e.is_client_error(),
            _ => false,
        }
    }
}

/// State reported after consuming one chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssemblyOutcome {
    /// Progress of the whole upload, 0 to 100.
    pub percentage: u8,
    /// The complete file, present only on the request that finished it.
    pub file: Option<AssembledFile>,
}

impl AssemblyOutcome {
    pub fn pending(percentage: u8) -> Self {
        Self {
            percentage,
            file: None,
        }
    }

    pub fn complete(file: AssembledFile) -> Self {
        Self {
            percentage: 100,
            file: Some(file),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.file.is_some()
    }
}

/// Consumes bound chunk uploads.
pub trait Assembler: Send + Sync {
    /// Stores the chunk carried by `file` and reports whether the upload is
    /// complete.
    fn consume(
        &self,
        file: &mut dyn UploadedFile,
        upload: &ChunkUpload,
    ) -> Result<AssemblyOutcome, TransferError>;
}

/// Runs [`Assembler::consume`] on the blocking thread pool.
pub async fn consume_blocking<A>(
    assembler: Arc<A>,
    mut file: Box<dyn UploadedFile>,
    upload: ChunkUpload,
) -> Result<AssemblyOutcome, TransferError>
where
    A: Assembler + 'static,
{
    tokio::task::spawn_blocking(move || assembler.consume(file.as_mut(), &upload))
        .await
        .map_err(|e| TransferError::TaskFailed(e.to_string()))?
}

/// A request that was not chunked is already the whole file.
fn pass_through(
    file: &dyn UploadedFile,
    upload: &ChunkUpload,
) -> Result<AssemblyOutcome, TransferError> {
    ensure_valid(file)?;
    let assembled = AssembledFile::new(
        file.path().to_path_buf(),
        upload.original_filename(),
        upload.mime_type().map(str::to_owned),
    )?;
    Ok(AssemblyOutcome::complete(assembled))
}

fn ensure_valid(file: &dyn UploadedFile) -> Result<(), TransferError> {
    if file.is_valid() {
        Ok(())
    } else {
        Err(TransferError::InvalidUpload(format!(
            "uploaded file {} is not valid",
            file.original_name()
        )))
    }
}

/// File name part of a backend-relative path.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors() {
        assert!(TransferError::OutOfOrderChunk { expected: 1, received: 2 }.is_client_error());
        assert!(TransferError::Protocol(ProtocolError::ProtocolMismatch).is_client_error());
        assert!(!TransferError::Storage(StorageError::UnsupportedBackend("s3".into())).is_client_error());
        assert!(!TransferError::Io(std::io::Error::other("disk")).is_client_error());
    }

    #[test]
    fn file_name_of_relative_path() {
        assert_eq!(file_name("chunks/a.part"), "a.part");
        assert_eq!(file_name("a.part"), "a.part");
    }
}
