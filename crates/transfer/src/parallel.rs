//! Fragment-then-merge assembly.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chunk_upload_protocol::{ChunkUpload, UploadedFile};
use chunk_upload_storage::ChunkStorage;

use crate::assembled::AssembledFile;
use crate::locks::UploadLocks;
use crate::merger::FileMerger;
use crate::naming::{NamingPolicy, fragment_base};
use crate::natural::natural_cmp;
use crate::validation::validate_file_name;
use crate::{Assembler, AssemblyOutcome, TransferError, ensure_valid, file_name, pass_through};

/// Stores every chunk as its own indexed fragment and merges them in
/// natural order once all of them are present. Arrival order does not
/// matter.
#[derive(Debug, Clone)]
pub struct ParallelAssembler {
    storage: ChunkStorage,
    naming: NamingPolicy,
    locks: Arc<UploadLocks>,
}

impl ParallelAssembler {
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

    /// Fragments (backend-relative paths) belonging to the upload `base`.
    pub fn fragments_of(&self, base: &str) -> Result<Vec<String>, TransferError> {
        let same_upload: &dyn Fn(&str) -> bool = &|path| fragment_base(file_name(path)) == base;
        Ok(self.storage.list_fragments(Some(same_upload))?)
    }

    /// Whether the fragments cover the upload, and the progress so far.
    ///
    /// The declared chunk count decides when the protocol sends one; byte
    /// protocols compare summed sizes with the declared file size instead.
    fn progress(&self, upload: &ChunkUpload, fragments: &[String]) -> Result<(bool, u8), TransferError> {
        let total = upload.total_chunks();
        if total > 0 {
            let count = fragments.len() as u64;
            let pct = (u128::from(count) * 100 / u128::from(total)).min(100) as u8;
            return Ok((count >= total, pct));
        }

        let declared = upload.declared_size();
        if declared > 0 {
            let mut size = 0u64;
            for fragment in fragments {
                size += self.storage.backend().size(fragment)?;
            }
            let pct = (u128::from(size) * 100 / u128::from(declared)).min(100) as u8;
            return Ok((size >= declared, pct));
        }

        Ok((upload.is_last_chunk(), upload.percentage_done()))
    }

    /// Concatenates `fragments` in natural order into `output_name` inside
    /// the chunk directory, deleting each fragment once appended.
    pub fn merge(&self, mut fragments: Vec<String>, output_name: &str) -> Result<PathBuf, TransferError> {
        if fragments.is_empty() {
            return Err(TransferError::MissingFragmentsAtMerge(output_name.to_owned()));
        }
        fragments.sort_by(|a, b| natural_cmp(a, b));

        let output = self.storage.chunk_directory()?.join(output_name);
        if output.exists() {
            fs::remove_file(&output)?;
        }

        let mut merger = FileMerger::open(&output)?;
        for fragment in &fragments {
            merger = merger.append_file(&self.storage.absolute_path(fragment)?)?;
            self.storage.backend().delete(fragment)?;
        }
        let size = merger.close()?;

        tracing::info!(
            fragments = fragments.len(),
            size,
            path = %output.display(),
            "merged chunk fragments"
        );
        Ok(output)
    }
}

impl Assembler for ParallelAssembler {
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

        let name = self.naming.upload_fragment_name(upload, true)?;
        let base = fragment_base(&name).to_owned();
        let directory = self.storage.chunk_directory()?;

        self.locks.with_lock(&base, || -> Result<AssemblyOutcome, TransferError> {
            file.move_to(&directory, &name)?;
            tracing::debug!(
                upload = %base,
                protocol = %upload.kind(),
                chunk = upload.chunk_ordinal(),
                "chunk stored"
            );

            let fragments = self.fragments_of(&base)?;
            let (complete, percentage) = self.progress(upload, &fragments)?;
            if !complete {
                return Ok(AssemblyOutcome::pending(percentage));
            }

            let output = self.merge(fragments, &base)?;
            let assembled = AssembledFile::new(
                output,
                upload.original_filename(),
                upload.mime_type().map(str::to_owned),
            )?;
            Ok(AssemblyOutcome::complete(assembled))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunk_upload_protocol::{ProtocolKind, RequestParts, TempUpload};
    use chunk_upload_storage::RetentionWindow;
    use tempfile::TempDir;

    fn assembler(dir: &TempDir) -> ParallelAssembler {
        let storage =
            ChunkStorage::local(dir.path(), "chunks", RetentionWindow::default()).unwrap();
        ParallelAssembler::new(storage, NamingPolicy::default())
    }

    fn dropzone_chunk(dir: &TempDir, index: u64, total: u64, body: &[u8]) -> (TempUpload, ChunkUpload) {
        let req = RequestParts::new("10.0.0.1")
            .with_session("sess")
            .with_param("dzuuid", "uuid-1")
            .with_param("dzchunkindex", index.to_string())
            .with_param("dztotalchunkcount", total.to_string());
        let file = TempUpload::from_body_in(&dir.path().join("tmp"), body, "photo.jpg").unwrap();
        let upload = ProtocolKind::DropZone.bind(&req, &file).unwrap();
        (file, upload)
    }

    #[test]
    fn merges_in_numeric_order_regardless_of_arrival() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir);
        let arrival = [3u64, 9, 0, 7, 1, 8, 2, 6, 4, 5];

        let mut last = None;
        for (n, index) in arrival.into_iter().enumerate() {
            let body = format!("[{index}]");
            let (mut f, u) = dropzone_chunk(&dir, index, 10, body.as_bytes());
            let outcome = assembler.consume(&mut f, &u).unwrap();
            assert_eq!(outcome.percentage as usize, (n + 1) * 10);
            assert_eq!(outcome.is_complete(), n == 9);
            last = Some(outcome);
        }

        let file = last.unwrap().file.unwrap();
        let expected: String = (0..10).map(|i| format!("[{i}]")).collect();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), expected);
        assert_eq!(file.path(), dir.path().join("chunks/photo.jpg-sess-uuid-1"));
        assert!(assembler.fragments_of("photo.jpg-sess-uuid-1").unwrap().is_empty());
    }

    #[test]
    fn uploads_do_not_mix() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir);

        let (mut f, u) = dropzone_chunk(&dir, 0, 2, b"mine");
        assembler.consume(&mut f, &u).unwrap();

        let req = RequestParts::new("10.0.0.1")
            .with_session("other")
            .with_param("dzuuid", "uuid-1")
            .with_param("dzchunkindex", "1")
            .with_param("dztotalchunkcount", "2");
        let mut file = TempUpload::from_body_in(&dir.path().join("tmp"), b"theirs", "photo.jpg").unwrap();
        let upload = ProtocolKind::DropZone.bind(&req, &file).unwrap();
        let outcome = assembler.consume(&mut file, &upload).unwrap();

        assert!(!outcome.is_complete());
        assert_eq!(assembler.fragments_of("photo.jpg-sess-uuid-1").unwrap().len(), 1);
    }

    #[test]
    fn merge_without_fragments_fails() {
        let dir = TempDir::new().unwrap();
        let err = assembler(&dir).merge(Vec::new(), "photo.jpg-x").unwrap_err();
        assert!(matches!(err, TransferError::MissingFragmentsAtMerge(_)));
        assert!(!dir.path().join("chunks/photo.jpg-x").exists());
    }

    #[test]
    fn byte_range_chunks_complete_on_size() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir);
        let chunk = |start: u64, body: &[u8]| {
            let end = start + body.len() as u64 - 1;
            let req = RequestParts::new("10.0.0.1")
                .with_header("Content-Range", format!("bytes {start}-{end}/12"));
            let file = TempUpload::from_body_in(&dir.path().join("tmp"), body, "a.bin").unwrap();
            let upload = ProtocolKind::ContentRange.bind(&req, &file).unwrap();
            (file, upload)
        };

        let (mut f, u) = chunk(8, b"CCCC");
        assert_eq!(assembler.consume(&mut f, &u).unwrap().percentage, 33);
        let (mut f, u) = chunk(0, b"AAAA");
        assert!(!assembler.consume(&mut f, &u).unwrap().is_complete());
        let (mut f, u) = chunk(4, b"BBBB");
        let file = assembler.consume(&mut f, &u).unwrap().file.unwrap();

        assert_eq!(fs::read(file.path()).unwrap(), b"AAAABBBBCCCC");
    }

    #[test]
    fn upload_id_cannot_leave_chunk_directory() {
        let dir = TempDir::new().unwrap();
        let assembler = assembler(&dir);
        let req = RequestParts::new("10.0.0.1")
            .with_session("sess")
            .with_param("dzuuid", "x/../../escaped")
            .with_param("dzchunkindex", "0")
            .with_param("dztotalchunkcount", "2");
        let mut file = TempUpload::from_body_in(&dir.path().join("tmp"), b"data", "photo.jpg").unwrap();
        let upload = ProtocolKind::DropZone.bind(&req, &file).unwrap();

        let err = assembler.consume(&mut file, &upload).unwrap_err();
        assert!(matches!(err, TransferError::InvalidFileName(_)));
        assert!(err.is_client_error());
        assert!(!dir.path().join("escaped.1.part").exists());
        assert!(!dir.path().join("escaped.0.part").exists());
    }
}

