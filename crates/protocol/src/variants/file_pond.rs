//! FilePond streaming PATCH: the body is the raw chunk and the position is
//! carried by `Upload-Offset` / `Upload-Length` headers.

use super::{Extracted, lenient_u64};
use crate::constants::*;
use crate::descriptor::ChunkDescriptor;
use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::request::UploadRequest;

pub(crate) fn detect(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    Ok(req.has_header(HEADER_UPLOAD_OFFSET))
}

pub(crate) fn extract(
    req: &dyn UploadRequest,
    file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    let offset = req
        .header(HEADER_UPLOAD_OFFSET)
        .map(lenient_u64)
        .ok_or(ProtocolError::MissingParameter(HEADER_UPLOAD_OFFSET))?;
    let length = req.header(HEADER_UPLOAD_LENGTH).map(lenient_u64).unwrap_or(0);
    let end = offset.saturating_add(file.size());

    let mut descriptor = ChunkDescriptor::byte_range(offset, end.saturating_sub(1), length)
        .with_file_size(length);
    if let Some(uuid) = req.param(PARAM_FILEPOND_PATCH) {
        descriptor = descriptor.with_upload_id(uuid);
    }
    if let Some(name) = req.header(HEADER_UPLOAD_NAME) {
        descriptor.original_filename = name.to_owned();
    }

    Ok(Extracted {
        descriptor,
        chunked: true,
    })
}
