//! Answers to "what do you already have?" requests sent by resuming
//! clients.

use serde::Serialize;

use chunk_upload_protocol::{ChunkCheckRequest, ProtocolKind};
use chunk_upload_storage::ChunkStorage;

use crate::TransferError;
use crate::naming::NamingPolicy;
use crate::validation::validate_file_name;

/// Result of a completeness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CheckOutcome {
    /// Whether one chunk is already stored.
    Chunk { exists: bool },
    /// Bytes already appended for a sequential upload.
    File { name: String, size: u64 },
}

/// Looks up fragments named the way the assemblers name them.
#[derive(Debug, Clone)]
pub struct ChunkChecker {
    storage: ChunkStorage,
    naming: NamingPolicy,
}

impl ChunkChecker {
    pub fn new(storage: ChunkStorage, naming: NamingPolicy) -> Self {
        Self { storage, naming }
    }

    pub fn check(&self, request: &ChunkCheckRequest) -> Result<CheckOutcome, TransferError> {
        validate_file_name(&request.original_filename)?;

        let name = self.naming.fragment_name(
            &request.original_filename,
            &request.identity,
            request.token.as_deref(),
            request.chunk_index,
        )?;
        let path = self.storage.relative_path(&name);

        let outcome = match request.kind {
            ProtocolKind::FileCheck => {
                let size = if self.storage.backend().exists(&path) {
                    self.storage.backend().size(&path)?
                } else {
                    0
                };
                CheckOutcome::File {
                    name: request.original_filename.clone(),
                    size,
                }
            }
            _ => CheckOutcome::Chunk {
                exists: self.storage.backend().exists(&path),
            },
        };

        tracing::debug!(fragment = %path, ?outcome, "chunk check");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chunk_upload_protocol::{HandlerRegistry, RequestParts};
    use chunk_upload_storage::RetentionWindow;
    use std::fs;

    fn checker(root: &std::path::Path) -> ChunkChecker {
        let storage = ChunkStorage::local(root, "chunks", RetentionWindow::default()).unwrap();
        ChunkChecker::new(storage, NamingPolicy::default())
    }

    #[test]
    fn resumable_chunk_presence() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("chunks")).unwrap();
        fs::write(dir.path().join("chunks/big.zip-s1-abc.2.part"), b"x").unwrap();

        let request = |number: &str| {
            RequestParts::new("1.2.3.4")
                .with_session("s1")
                .with_param("resumableIdentifier", "abc")
                .with_param("resumableChunkNumber", number)
                .with_param("resumableFilename", "big.zip")
        };
        let registry = HandlerRegistry::checks();
        let checker = checker(dir.path());

        let present = checker.check(&registry.check_for(&request("2")).unwrap()).unwrap();
        assert_eq!(present, CheckOutcome::Chunk { exists: true });

        let missing = checker.check(&registry.check_for(&request("3")).unwrap()).unwrap();
        assert_eq!(missing, CheckOutcome::Chunk { exists: false });
    }

    #[test]
    fn file_check_reports_stored_size() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("chunks")).unwrap();
        fs::write(dir.path().join("chunks/video.mp4-s1-1000.part"), [0u8; 300]).unwrap();

        let req = RequestParts::new("1.2.3.4")
            .with_session("s1")
            .with_param("name", "video.mp4")
            .with_param("size", "1000");
        let check = HandlerRegistry::checks().check_for(&req).unwrap();
        let outcome = checker(dir.path()).check(&check).unwrap();

        assert_eq!(
            outcome,
            CheckOutcome::File {
                name: "video.mp4".into(),
                size: 300
            }
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, serde_json::json!({"name": "video.mp4", "size": 300}));
    }

    #[test]
    fn file_check_without_fragment_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let req = RequestParts::new("1.2.3.4")
            .with_param("name", "video.mp4")
            .with_param("size", "1000");
        let check = HandlerRegistry::checks().check_for(&req).unwrap();
        let outcome = checker(dir.path()).check(&check).unwrap();
        assert_eq!(outcome, CheckOutcome::File { name: "video.mp4".into(), size: 0 });
    }

    #[test]
    fn traversal_in_check_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let req = RequestParts::new("1.2.3.4")
            .with_param("name", "../secret")
            .with_param("size", "1");
        let check = HandlerRegistry::checks().check_for(&req).unwrap();
        assert!(matches!(
            checker(dir.path()).check(&check).unwrap_err(),
            TransferError::InvalidFileName(_)
        ));
    }

    #[test]
    fn identifier_with_separator_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let req = RequestParts::new("1.2.3.4")
            .with_session("s1")
            .with_param("identifier", "../../etc")
            .with_param("chunkNumber", "0")
            .with_param("filename", "big.zip");
        let check = HandlerRegistry::checks().check_for(&req).unwrap();
        let err = checker(dir.path()).check(&check).unwrap_err();
        assert!(matches!(err, TransferError::InvalidFileName(_)));
        assert!(err.is_client_error());
    }
}

