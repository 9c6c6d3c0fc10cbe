//! Append-on-write assembly.

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;

use chunk_upload_protocol::{ChunkUpload, UploadedFile};
use chunk_upload_storage::ChunkStorage;

use crate::assembled::AssembledFile;
use crate::locks::UploadLocks;
use crate::merger::FileMerger;
use crate::naming::{NamingPolicy, fragment_base};
use crate::validation::validate_file_name;
use crate::{Assembler, AssemblyOutcome, TransferError, ensure_valid, file_name, pass_through};

/// Facts the completion test looks at after a chunk was appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionState {
    /// Fragments on disk sharing the upload's base name.
    pub fragments: u64,
    /// Fragments the strategy expects once everything arrived.
    pub expected_fragments: u64,
    /// Whether this request already produced the final file. Only a strategy
    /// that removes its fragments when finishing can observe zero fragments.
    pub already_assembled: bool,
    /// Declared size of the whole file, 0 when unknown.
    pub declared_size: u64,
    /// Summed size of the fragments.
    pub size_on_disk: u64,
    /// The protocol's own last-chunk flag.
    pub last_chunk: bool,
}

impl CompletionState {
    /// Re-derives completion from what is on disk. Rules apply in order.
    pub fn is_complete(&self) -> bool {
        if self.fragments == 0 {
            return self.already_assembled;
        }
        if self.fragments < self.expected_fragments {
            return false;
        }
        if self.declared_size == 0 {
            return self.last_chunk;
        }
        if self.size_on_disk == self.declared_size {
            return true;
        }
        self.last_chunk
    }
}

/// Appends every chunk of an upload onto one fragment file.
///
/// Chunks must arrive in order. Protocols that carry a byte offset are
/// checked against the fragment length; index-only protocols cannot be.
#[derive(Debug, Clone)]
pub struct SequentialAssembler {
    storage: ChunkStorage,
    naming: NamingPolicy,
    locks: Arc<UploadLocks>,
}

impl SequentialAssembler {
    pub fn new(storage: ChunkStorage, naming: NamingPolicy) -> Self {
        Self {
            storage,
            naming,
            locks: Arc::new(UploadLocks::new()),
        }
    }

    /// Shares a lock table with other assemblers.
    pub fn with_locks(mut self, locks: Arc<UploadLocks>) -> Self {
        self.locks = locks;
        self
    }

    pub fn storage(&self) -> &ChunkStorage {
        &self.storage
    }

    fn append(
        &self,
        file: &dyn UploadedFile,
        upload: &ChunkUpload,
        base: &str,
        fragment: &Path,
    ) -> Result<AssemblyOutcome, TransferError> {
        if upload.is_first_chunk() && fragment.exists() {
            tracing::debug!(fragment = %fragment.display(), "removing fragment of restarted upload");
            fs::remove_file(fragment)?;
        }

        if let Some(offset) = upload.byte_offset() {
            let current = match fs::metadata(fragment) {
                Ok(meta) => meta.len(),
                Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
                Err(e) => return Err(e.into()),
            };
            if current != offset {
                return Err(TransferError::OutOfOrderChunk {
                    expected: current,
                    received: offset,
                });
            }
        }

        FileMerger::open(fragment)?
            .append_file(file.path())?
            .close()?;
        tracing::debug!(
            upload = %base,
            protocol = %upload.kind(),
            percentage = upload.percentage_done(),
            "chunk appended"
        );

        if !self.completion_state(upload, base)?.is_complete() {
            return Ok(AssemblyOutcome::pending(upload.percentage_done()));
        }

        let assembled = AssembledFile::new(
            fragment.to_path_buf(),
            upload.original_filename(),
            upload.mime_type().map(str::to_owned),
        )?;
        tracing::info!(
            upload = %base,
            path = %fragment.display(),
            size = assembled.size(),
            "sequential upload complete"
        );
        Ok(AssemblyOutcome::complete(assembled))
    }

    fn completion_state(&self, upload: &ChunkUpload, base: &str) -> Result<CompletionState, TransferError> {
        let same_upload: &dyn Fn(&str) -> bool = &|path| fragment_base(file_name(path)) == base;
        let fragments = self.storage.list_fragments(Some(same_upload))?;

        let mut size_on_disk = 0u64;
        for fragment in &fragments {
            size_on_disk += self.storage.backend().size(fragment)?;
        }

        Ok(CompletionState {
            fragments: fragments.len() as u64,
            expected_fragments: 1,
            // The fragment itself is the output and is only moved by the
            // caller after completion, so it is always on disk here.
            already_assembled: false,
            declared_size: upload.declared_size(),
            size_on_disk,
            last_chunk: upload.is_last_chunk(),
        })
    }
}

impl Assembler for SequentialAssembler {
    fn consume(
        &self,
        file: &mut dyn UploadedFile,
        upload: &ChunkUpload,
    ) -> Result<AssemblyOutcome, TransferError> {
        if !upload.is_chunked_upload() {
            return pass_through(file, upload);
        }
        ensure_valid(file)?;
        validate_file_name(upload.original_filename())?;

        let name = self.naming.upload_fragment_name(upload, false)?;
        let base = fragment_base(&name).to_owned();
        self.storage.ensure_directory()?;
        let fragment = self.storage.fragment_path(&name)?;

        self.locks
            .with_lock(&base, || self.append(file, upload, &base, &fragment))
    }
}
