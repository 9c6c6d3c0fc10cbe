//! ng-file-upload: `_chunkNumber`, `_totalSize`, `_chunkSize`,
//! `_currentChunkSize`.
//!
//! The only family with a numeric guard: once any of its parameters is
//! present, all of them must be non-negative integers.

use super::{Extracted, strict_u64};
use crate::constants::*;
use crate::descriptor::ChunkDescriptor;
use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::request::UploadRequest;

const KEYS: [&str; 4] = [
    PARAM_NG_CHUNK_NUMBER,
    PARAM_NG_TOTAL_SIZE,
    PARAM_NG_CHUNK_SIZE,
    PARAM_NG_CURRENT_CHUNK_SIZE,
];

#[derive(Debug, Clone, Copy)]
struct NgParams {
    chunk_number: u64,
    total_size: u64,
    chunk_size: u64,
}

fn validated(req: &dyn UploadRequest) -> Result<NgParams, ProtocolError> {
    let mut values = [0u64; 4];
    for (slot, key) in values.iter_mut().zip(KEYS) {
        let raw = req.param(key).ok_or(ProtocolError::MissingParameter(key))?;
        *slot = strict_u64(raw).ok_or_else(|| {
            ProtocolError::InvalidChunkParameters(format!("{key} must be a non-negative integer"))
        })?;
    }
    let [chunk_number, total_size, chunk_size, current_chunk_size] = values;

    if chunk_size == 0 {
        return Err(ProtocolError::InvalidChunkParameters(format!(
            "{PARAM_NG_CHUNK_SIZE} must be greater than zero"
        )));
    }
    if current_chunk_size > chunk_size {
        return Err(ProtocolError::InvalidChunkParameters(format!(
            "{PARAM_NG_CURRENT_CHUNK_SIZE} exceeds {PARAM_NG_CHUNK_SIZE}"
        )));
    }

    Ok(NgParams {
        chunk_number,
        total_size,
        chunk_size,
    })
}

/// Claims the request when every parameter is present. Invalid values are
/// reported as an error so the registry can reject the request instead of
/// falling back to a single upload.
pub(crate) fn detect(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    if !KEYS.iter().all(|key| req.has_param(key)) {
        return Ok(false);
    }
    validated(req).map(|_| true)
}

pub(crate) fn extract(
    req: &dyn UploadRequest,
    _file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    if !KEYS.iter().any(|key| req.has_param(key)) {
        return Ok(Extracted {
            descriptor: ChunkDescriptor::default(),
            chunked: false,
        });
    }

    let params = validated(req)?;
    let total = params.total_size.div_ceil(params.chunk_size);
    let current = params.chunk_number.saturating_add(1);

    Ok(Extracted {
        descriptor: ChunkDescriptor::indexed(current, total)
            .with_upload_id(total.to_string())
            .with_file_size(params.total_size),
        chunked: total > 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RequestParts;

    fn request(chunk: &str, total: &str, size: &str, current: &str) -> RequestParts {
        RequestParts::new("1.1.1.1")
            .with_param(PARAM_NG_CHUNK_NUMBER, chunk)
            .with_param(PARAM_NG_TOTAL_SIZE, total)
            .with_param(PARAM_NG_CHUNK_SIZE, size)
            .with_param(PARAM_NG_CURRENT_CHUNK_SIZE, current)
    }

    #[test]
    fn valid_parameters_are_detected() {
        assert!(detect(&request("0", "5000", "500", "500")).unwrap());
    }

    #[test]
    fn absent_parameters_are_not_detected() {
        assert!(!detect(&RequestParts::new("1.1.1.1")).unwrap());
    }

    #[test]
    fn negative_chunk_number_is_invalid() {
        let err = detect(&request("-1", "5000", "500", "500")).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidChunkParameters(_)));
    }

    #[test]
    fn non_numeric_values_are_invalid() {
        let err = detect(&request("xx", "xx", "xx", "xx")).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidChunkParameters(_)));
    }

    #[test]
    fn current_chunk_larger_than_chunk_size_is_invalid() {
        let err = detect(&request("0", "5000", "500", "501")).unwrap_err();
        assert!(err.to_string().contains("_currentChunkSize"));
    }

    #[test]
    fn zero_chunk_size_is_invalid() {
        assert!(detect(&request("0", "5000", "0", "0")).is_err());
    }
}
