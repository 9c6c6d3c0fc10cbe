//! Requests bound to a protocol.

use serde::Serialize;

use crate::constants::*;
use crate::descriptor::ChunkDescriptor;
use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::kind::ProtocolKind;
use crate::request::{ClientIdentity, UploadRequest};
use crate::variants::{self, Extracted, ceil_percent, floor_percent, param_u64};

/// An upload request bound to the protocol that claimed it.
///
/// Everything here is derived from the descriptor, so the value is immutable
/// once built.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkUpload {
    kind: ProtocolKind,
    descriptor: ChunkDescriptor,
    chunked: bool,
    #[serde(skip)]
    identity: ClientIdentity,
    mime_type: Option<String>,
}

impl ChunkUpload {
    pub(crate) fn new(
        kind: ProtocolKind,
        descriptor: ChunkDescriptor,
        chunked: bool,
        identity: ClientIdentity,
        mime_type: Option<String>,
    ) -> Self {
        Self {
            kind,
            descriptor,
            chunked,
            identity,
            mime_type,
        }
    }

    pub fn kind(&self) -> ProtocolKind {
        self.kind
    }

    pub fn descriptor(&self) -> &ChunkDescriptor {
        &self.descriptor
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn original_filename(&self) -> &str {
        &self.descriptor.original_filename
    }

    /// Protocol token placed in fragment names (upload UUID, total count...).
    pub fn fragment_token(&self) -> Option<&str> {
        self.descriptor.upload_id.as_deref()
    }

    pub fn is_chunked_upload(&self) -> bool {
        self.chunked
    }

    pub fn is_first_chunk(&self) -> bool {
        let d = &self.descriptor;
        match self.kind {
            ProtocolKind::Single => true,
            kind if kind.is_byte_range() => d.byte_start == 0,
            _ => d.current_index <= 1,
        }
    }

    pub fn is_last_chunk(&self) -> bool {
        let d = &self.descriptor;
        match self.kind {
            ProtocolKind::Single => true,
            // inclusive zero-based range
            ProtocolKind::ContentRange => d.byte_end >= d.byte_total.saturating_sub(1),
            ProtocolKind::FilePond => d.byte_start.saturating_add(d.chunk_size) == d.byte_total,
            _ => d.current_index >= d.total_count,
        }
    }

    pub fn percentage_done(&self) -> u8 {
        let d = &self.descriptor;
        match self.kind {
            ProtocolKind::Single => 100,
            ProtocolKind::ContentRange => ceil_percent(d.byte_end, d.byte_total),
            ProtocolKind::FilePond => {
                floor_percent(d.byte_start.saturating_add(d.chunk_size), d.byte_total)
            }
            _ => ceil_percent(d.current_index, d.total_count),
        }
    }

    /// Position of this chunk used to name and order per-chunk fragments:
    /// the byte offset for byte-range protocols, the 1-based index otherwise.
    pub fn chunk_ordinal(&self) -> u64 {
        if self.kind.is_byte_range() {
            self.descriptor.byte_start
        } else {
            self.descriptor.current_index
        }
    }

    /// Byte offset of this chunk, for protocols that carry one.
    pub fn byte_offset(&self) -> Option<u64> {
        (self.kind.is_byte_range() && self.chunked).then_some(self.descriptor.byte_start)
    }

    /// Declared number of chunks, 0 when the protocol does not send one.
    pub fn total_chunks(&self) -> u64 {
        self.descriptor.total_count
    }

    /// Declared size of the whole file, 0 when unknown.
    pub fn declared_size(&self) -> u64 {
        self.descriptor.file_size
    }
}

pub(crate) fn extract_single(
    _req: &dyn UploadRequest,
    file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    Ok(Extracted {
        descriptor: ChunkDescriptor::indexed(1, 1).with_file_size(file.size()),
        chunked: false,
    })
}

// ---------------------------------------------------------------------------
// Completeness checks
// ---------------------------------------------------------------------------

/// A request asking what the server already holds for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkCheckRequest {
    pub kind: ProtocolKind,
    pub original_filename: String,
    /// Fragment token, matching the token the upload protocol uses.
    pub token: Option<String>,
    /// 1-based chunk index for per-chunk checks; `None` for whole-file checks.
    pub chunk_index: Option<u64>,
    pub identity: ClientIdentity,
}

impl ChunkCheckRequest {
    pub(crate) fn from_request(
        kind: ProtocolKind,
        req: &dyn UploadRequest,
    ) -> Result<Self, ProtocolError> {
        let required = |key: &'static str| req.param(key).ok_or(ProtocolError::MissingParameter(key));

        let (original_filename, token, chunk_index) = match kind {
            ProtocolKind::ChunkCheck => (
                required(PARAM_CHECK_FILENAME)?.to_owned(),
                Some(required(PARAM_CHECK_IDENTIFIER)?.to_owned()),
                // simple-uploader counts from 0 like its upload requests
                Some(param_u64(req, PARAM_SIMPLE_CHUNK_NUMBER).unwrap_or(0).saturating_add(1)),
            ),
            ProtocolKind::ResumableJsCheck => (
                required(PARAM_RESUMABLE_FILENAME)?.to_owned(),
                Some(variants::indexed::truncate_identifier(required(
                    PARAM_RESUMABLE_IDENTIFIER,
                )?)),
                Some(param_u64(req, PARAM_RESUMABLE_CHUNK_NUMBER).unwrap_or(0)),
            ),
            ProtocolKind::FileCheck => (
                required(PARAM_FILE_CHECK_NAME)?.to_owned(),
                Some(required(PARAM_FILE_CHECK_SIZE)?.trim().to_owned()),
                None,
            ),
            kind => {
                return Err(ProtocolError::RoleMismatch {
                    kind,
                    action: "answer completeness checks",
                });
            }
        };

        Ok(Self {
            kind,
            original_filename,
            token,
            chunk_index,
            identity: ClientIdentity::from_request(req),
        })
    }
}

pub(crate) fn detect_chunk_check(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(req.has_param(PARAM_CHECK_IDENTIFIER)
        && req.has_param(PARAM_SIMPLE_CHUNK_NUMBER)
        && req.has_param(PARAM_CHECK_FILENAME))
}

pub(crate) fn detect_resumable_check(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(req.has_param(PARAM_RESUMABLE_IDENTIFIER)
        && req.has_param(PARAM_RESUMABLE_CHUNK_NUMBER)
        && req.has_param(PARAM_RESUMABLE_FILENAME))
}

pub(crate) fn detect_file_check(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(req.has_param(PARAM_FILE_CHECK_NAME) && req.has_param(PARAM_FILE_CHECK_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::TempUpload;
    use crate::request::RequestParts;

    fn bind(kind: ProtocolKind, req: &RequestParts) -> ChunkUpload {
        let dir = tempfile::tempdir().unwrap();
        let file = TempUpload::from_body_in(dir.path(), &[0u8; 100], "test.bin").unwrap();
        kind.bind(req, &file).unwrap()
    }

    fn content_range(value: &str) -> ChunkUpload {
        let req = RequestParts::new("1.1.1.1").with_header("Content-Range", value);
        bind(ProtocolKind::ContentRange, &req)
    }

    #[test]
    fn content_range_first_chunk() {
        let upload = content_range("bytes 0-100/1200");
        assert!(upload.is_chunked_upload());
        assert!(upload.is_first_chunk());
        assert!(!upload.is_last_chunk());
        assert_eq!(upload.percentage_done(), 9);
        assert_eq!(upload.fragment_token(), Some("1200"));
        assert_eq!(upload.declared_size(), 1200);
    }

    #[test]
    fn content_range_middle_chunk() {
        let upload = content_range("bytes 100-100/1200");
        assert!(!upload.is_first_chunk());
        assert!(!upload.is_last_chunk());
        assert_eq!(upload.percentage_done(), 9);
        assert_eq!(upload.byte_offset(), Some(100));
    }

    #[test]
    fn content_range_last_chunk() {
        let upload = content_range("bytes 1100-1199/1200");
        assert!(upload.is_last_chunk());
        assert_eq!(upload.percentage_done(), 100);
    }

    #[test]
    fn content_range_without_header_is_not_chunked() {
        let upload = bind(ProtocolKind::ContentRange, &RequestParts::new("1.1.1.1"));
        assert!(!upload.is_chunked_upload());
        assert_eq!(upload.percentage_done(), 0);
        assert!(upload.byte_offset().is_none());
    }

    #[test]
    fn chunks_in_request_single_chunk() {
        let req = RequestParts::new("1.1.1.1")
            .with_param("chunk", "0")
            .with_param("chunks", "1");
        let upload = bind(ProtocolKind::ChunksInRequest, &req);
        assert_eq!(upload.descriptor().current_index, 1);
        assert_eq!(upload.total_chunks(), 1);
        assert!(upload.is_first_chunk());
        assert!(upload.is_last_chunk());
        assert!(!upload.is_chunked_upload());
        assert_eq!(upload.percentage_done(), 100);
    }

    #[test]
    fn index_past_total_counts_as_last() {
        let req = RequestParts::new("1.1.1.1")
            .with_param("chunk", "5")
            .with_param("chunks", "3");
        let upload = bind(ProtocolKind::ChunksInRequest, &req);
        assert!(upload.is_last_chunk());
        assert_eq!(upload.percentage_done(), 100);
    }

    #[test]
    fn ng_file_upload_progress() {
        let req = |chunk: &str| {
            RequestParts::new("1.1.1.1")
                .with_param(PARAM_NG_CHUNK_NUMBER, chunk)
                .with_param(PARAM_NG_TOTAL_SIZE, "5000")
                .with_param(PARAM_NG_CHUNK_SIZE, "500")
                .with_param(PARAM_NG_CURRENT_CHUNK_SIZE, "500")
        };

        let first = bind(ProtocolKind::NgFileUpload, &req("0"));
        assert_eq!(first.descriptor().current_index, 1);
        assert_eq!(first.total_chunks(), 10);
        assert_eq!(first.percentage_done(), 10);
        assert!(first.is_first_chunk());
        assert!(!first.is_last_chunk());

        let last = bind(ProtocolKind::NgFileUpload, &req("9"));
        assert!(last.is_last_chunk());
        assert_eq!(last.percentage_done(), 100);
    }

    #[test]
    fn ng_file_upload_without_parameters_is_not_chunked() {
        let upload = bind(ProtocolKind::NgFileUpload, &RequestParts::new("1.1.1.1"));
        assert!(!upload.is_chunked_upload());
        assert_eq!(upload.percentage_done(), 0);
    }

    #[test]
    fn filepond_offsets() {
        let req = |offset: &str| {
            RequestParts::new("1.1.1.1")
                .with_header("Upload-Offset", offset)
                .with_header("Upload-Length", "200")
                .with_header("Upload-Name", "movie.mp4")
                .with_param("patch", "pond-1")
        };

        let first = bind(ProtocolKind::FilePond, &req("0"));
        assert!(first.is_chunked_upload());
        assert!(first.is_first_chunk());
        assert!(!first.is_last_chunk());
        assert_eq!(first.percentage_done(), 50);
        assert_eq!(first.original_filename(), "movie.mp4");
        assert_eq!(first.fragment_token(), Some("pond-1"));

        let last = bind(ProtocolKind::FilePond, &req("100"));
        assert!(last.is_last_chunk());
        assert_eq!(last.percentage_done(), 100);
    }

    #[test]
    fn single_upload_is_complete() {
        let upload = bind(ProtocolKind::Single, &RequestParts::new("1.1.1.1"));
        assert!(upload.is_first_chunk());
        assert!(upload.is_last_chunk());
        assert!(!upload.is_chunked_upload());
        assert_eq!(upload.percentage_done(), 100);
        assert_eq!(upload.original_filename(), "test.bin");
    }

    #[test]
    fn check_kinds_cannot_bind_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let file = TempUpload::from_body_in(dir.path(), b"x", "x").unwrap();
        let err = ProtocolKind::FileCheck
            .bind(&RequestParts::new("1.1.1.1"), &file)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::RoleMismatch { .. }));
    }

    #[test]
    fn resumable_check_request() {
        let req = RequestParts::new("1.1.1.1")
            .with_param(PARAM_RESUMABLE_IDENTIFIER, "123-file")
            .with_param(PARAM_RESUMABLE_CHUNK_NUMBER, "3")
            .with_param(PARAM_RESUMABLE_FILENAME, "file.zip");
        assert!(ProtocolKind::ResumableJsCheck.can_handle(&req));

        let check = ProtocolKind::ResumableJsCheck.bind_check(&req).unwrap();
        assert_eq!(check.original_filename, "file.zip");
        assert_eq!(check.token.as_deref(), Some("123-file"));
        assert_eq!(check.chunk_index, Some(3));
    }

    #[test]
    fn file_check_request() {
        let req = RequestParts::new("1.1.1.1")
            .with_param("name", "big.iso")
            .with_param("size", "4096");
        let check = ProtocolKind::FileCheck.bind_check(&req).unwrap();
        assert_eq!(check.token.as_deref(), Some("4096"));
        assert!(check.chunk_index.is_none());
    }

    #[test]
    fn upload_kinds_cannot_bind_checks() {
        let err = ProtocolKind::DropZone
            .bind_check(&RequestParts::new("1.1.1.1"))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::RoleMismatch { .. }));
    }
}
