//! Protocols that send the chunk index and chunk count as form fields.

use super::{Extracted, param_u64};
use crate::constants::*;
use crate::descriptor::ChunkDescriptor;
use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::request::UploadRequest;

fn has_all(req: &dyn UploadRequest, keys: &[&str]) -> bool {
    keys.iter().all(|key| req.has_param(key))
}

// ---------------------------------------------------------------------------
// plupload: chunk / chunks
// ---------------------------------------------------------------------------

pub(crate) fn detect_chunks_in_request(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(has_all(req, &[PARAM_CHUNK, PARAM_CHUNKS]))
}

pub(crate) fn extract_chunks_in_request(
    req: &dyn UploadRequest,
    _file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    Ok(zero_based(req, PARAM_CHUNK, PARAM_CHUNKS, None))
}

// ---------------------------------------------------------------------------
// simple-uploader: chunkNumber / totalChunks
// ---------------------------------------------------------------------------

pub(crate) fn detect_simple_uploader(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(has_all(
        req,
        &[PARAM_SIMPLE_CHUNK_NUMBER, PARAM_SIMPLE_TOTAL_CHUNKS],
    ))
}

pub(crate) fn extract_simple_uploader(
    req: &dyn UploadRequest,
    _file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    Ok(zero_based(
        req,
        PARAM_SIMPLE_CHUNK_NUMBER,
        PARAM_SIMPLE_TOTAL_CHUNKS,
        Some(PARAM_SIMPLE_TOTAL_SIZE),
    ))
}

/// Shared shape of the 0-based index families. The total chunk count is the
/// fragment token.
fn zero_based(
    req: &dyn UploadRequest,
    index_key: &str,
    total_key: &str,
    size_key: Option<&str>,
) -> Extracted {
    let current = param_u64(req, index_key).unwrap_or(0).saturating_add(1);
    let total = param_u64(req, total_key).unwrap_or(0);
    let file_size = size_key.and_then(|key| param_u64(req, key)).unwrap_or(0);

    Extracted {
        descriptor: ChunkDescriptor::indexed(current, total)
            .with_upload_id(total.to_string())
            .with_file_size(file_size),
        chunked: total > 1,
    }
}

// ---------------------------------------------------------------------------
// resumable.js
// ---------------------------------------------------------------------------

pub(crate) fn detect_resumable(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(has_all(
        req,
        &[
            PARAM_RESUMABLE_CHUNK_NUMBER,
            PARAM_RESUMABLE_TOTAL_CHUNKS,
            PARAM_RESUMABLE_IDENTIFIER,
        ],
    ))
}

pub(crate) fn extract_resumable(
    req: &dyn UploadRequest,
    _file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    // resumable.js counts from 1 already
    let current = param_u64(req, PARAM_RESUMABLE_CHUNK_NUMBER).unwrap_or(0);
    let total = param_u64(req, PARAM_RESUMABLE_TOTAL_CHUNKS).unwrap_or(0);
    let identifier = req
        .param(PARAM_RESUMABLE_IDENTIFIER)
        .ok_or(ProtocolError::MissingParameter(PARAM_RESUMABLE_IDENTIFIER))?;

    Ok(Extracted {
        descriptor: ChunkDescriptor::indexed(current, total)
            .with_upload_id(truncate_identifier(identifier))
            .with_file_size(param_u64(req, PARAM_RESUMABLE_TOTAL_SIZE).unwrap_or(0)),
        chunked: total > 1,
    })
}

/// Cuts a resumable identifier to its first 40 characters.
pub(crate) fn truncate_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .take(RESUMABLE_IDENTIFIER_MAX_LEN)
        .collect()
}

// ---------------------------------------------------------------------------
// Dropzone
// ---------------------------------------------------------------------------

pub(crate) fn detect_dropzone(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(has_all(
        req,
        &[PARAM_DZ_UUID, PARAM_DZ_TOTAL_CHUNK_COUNT, PARAM_DZ_CHUNK_INDEX],
    ))
}

pub(crate) fn extract_dropzone(
    req: &dyn UploadRequest,
    _file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    let current = param_u64(req, PARAM_DZ_CHUNK_INDEX)
        .unwrap_or(0)
        .saturating_add(1);
    let total = param_u64(req, PARAM_DZ_TOTAL_CHUNK_COUNT).unwrap_or(1);
    let uuid = req
        .param(PARAM_DZ_UUID)
        .ok_or(ProtocolError::MissingParameter(PARAM_DZ_UUID))?;

    Ok(Extracted {
        descriptor: ChunkDescriptor::indexed(current, total)
            .with_upload_id(uuid)
            .with_file_size(param_u64(req, PARAM_DZ_TOTAL_FILE_SIZE).unwrap_or(0)),
        chunked: total > 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::TempUpload;
    use crate::request::RequestParts;

    fn file() -> (tempfile::TempDir, TempUpload) {
        let dir = tempfile::tempdir().unwrap();
        let upload = TempUpload::from_body_in(dir.path(), b"abc", "a.bin").unwrap();
        (dir, upload)
    }

    #[test]
    fn chunks_in_request_is_zero_based() {
        let (_dir, f) = file();
        let req = RequestParts::new("1.1.1.1")
            .with_param("chunk", "0")
            .with_param("chunks", "1");
        let out = extract_chunks_in_request(&req, &f).unwrap();
        assert_eq!(out.descriptor.current_index, 1);
        assert_eq!(out.descriptor.total_count, 1);
        assert_eq!(out.descriptor.upload_id.as_deref(), Some("1"));
        assert!(!out.chunked);
    }

    #[test]
    fn resumable_identifier_is_truncated() {
        let (_dir, f) = file();
        let id = "x".repeat(64);
        let req = RequestParts::new("1.1.1.1")
            .with_param(PARAM_RESUMABLE_CHUNK_NUMBER, "2")
            .with_param(PARAM_RESUMABLE_TOTAL_CHUNKS, "3")
            .with_param(PARAM_RESUMABLE_IDENTIFIER, id.clone());
        let out = extract_resumable(&req, &f).unwrap();
        assert_eq!(out.descriptor.current_index, 2);
        assert_eq!(out.descriptor.upload_id.unwrap().len(), 40);
        assert!(out.chunked);
    }

    #[test]
    fn dropzone_requires_all_fields() {
        let req = RequestParts::new("1.1.1.1").with_param(PARAM_DZ_UUID, "u");
        assert!(!detect_dropzone(&req).unwrap());

        let req = req
            .with_param(PARAM_DZ_CHUNK_INDEX, "0")
            .with_param(PARAM_DZ_TOTAL_CHUNK_COUNT, "2");
        assert!(detect_dropzone(&req).unwrap());
    }

    #[test]
    fn dropzone_reads_declared_size() {
        let (_dir, f) = file();
        let req = RequestParts::new("1.1.1.1")
            .with_param(PARAM_DZ_UUID, "uuid-1")
            .with_param(PARAM_DZ_CHUNK_INDEX, "1")
            .with_param(PARAM_DZ_TOTAL_CHUNK_COUNT, "2")
            .with_param(PARAM_DZ_TOTAL_FILE_SIZE, "2048");
        let out = extract_dropzone(&req, &f).unwrap();
        assert_eq!(out.descriptor.current_index, 2);
        assert_eq!(out.descriptor.file_size, 2048);
        assert_eq!(out.descriptor.upload_id.as_deref(), Some("uuid-1"));
    }
}
