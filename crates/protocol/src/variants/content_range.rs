//! blueimp jQuery-File-Upload: `Content-Range: bytes <start>-<end>/<total>`.

use super::Extracted;
use crate::constants::HEADER_CONTENT_RANGE;
use crate::descriptor::ChunkDescriptor;
use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::request::UploadRequest;

/// Parsed byte range, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ByteRange {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

/// Finds the first `bytes <digits>-<digits>/<digits>` in the header value.
///
/// Returns `Ok(None)` when the value does not have that shape and
/// `RangeValueTooLarge` when one of the numbers does not fit in a `u64`.
pub(crate) fn parse(value: &str) -> Result<Option<ByteRange>, ProtocolError> {
    for (pos, _) in value.match_indices("bytes ") {
        let Some([start, end, total]) = split_range(&value[pos + "bytes ".len()..]) else {
            continue;
        };
        let number = |digits: &str| {
            digits
                .parse::<u64>()
                .map_err(|_| ProtocolError::RangeValueTooLarge(value.to_owned()))
        };
        return Ok(Some(ByteRange {
            start: number(start)?,
            end: number(end)?,
            total: number(total)?,
        }));
    }
    Ok(None)
}

fn split_range(rest: &str) -> Option<[&str; 3]> {
    let (start, rest) = take_digits(rest)?;
    let (end, rest) = take_digits(rest.strip_prefix('-')?)?;
    let (total, _) = take_digits(rest.strip_prefix('/')?)?;
    Some([start, end, total])
}

fn take_digits(s: &str) -> Option<(&str, &str)> {
    let n = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    (n > 0).then(|| s.split_at(n))
}

pub(crate) fn detect(req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
    match req.header(HEADER_CONTENT_RANGE) {
        Some(value) => Ok(parse(value)?.is_some()),
        None => Ok(false),
    }
}

pub(crate) fn extract(
    req: &dyn UploadRequest,
    _file: &dyn UploadedFile,
) -> Result<Extracted, ProtocolError> {
    let range = match req.header(HEADER_CONTENT_RANGE) {
        Some(value) => parse(value)?,
        None => None,
    };

    Ok(match range {
        Some(range) => Extracted {
            descriptor: ChunkDescriptor::byte_range(range.start, range.end, range.total)
                .with_upload_id(range.total.to_string())
                .with_file_size(range.total),
            chunked: true,
        },
        None => Extracted {
            descriptor: ChunkDescriptor::default(),
            chunked: false,
        },
    })
}
