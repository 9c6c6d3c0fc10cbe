//! Per-protocol detection predicates and descriptor extractors.
//!
//! Every variant exposes `detect` (looks only at parameter and header
//! presence and shape) and `extract` (builds the [`ChunkDescriptor`]).

pub(crate) mod content_range;
pub(crate) mod file_pond;
pub(crate) mod indexed;
pub(crate) mod ng_file;

use crate::descriptor::ChunkDescriptor;
use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::request::UploadRequest;

pub(crate) type Detector = fn(&dyn UploadRequest) -> Result<bool, ProtocolError>;
pub(crate) type Extractor = fn(&dyn UploadRequest, &dyn UploadedFile) -> Result<Extracted, ProtocolError>;

/// Result of descriptor extraction.
#[derive(Debug)]
pub(crate) struct Extracted {
    pub descriptor: ChunkDescriptor,
    pub chunked: bool,
}

/// Integer value of a parameter the way form decoders coerce it: the leading
/// digits are used and anything else counts as 0. Saturates on overflow.
pub(crate) fn lenient_u64(value: &str) -> u64 {
    let value = value.trim();
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let digits = &value[..end];
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}

/// Parses a non-negative integer string, rejecting anything else.
pub(crate) fn strict_u64(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

pub(crate) fn param_u64(req: &dyn UploadRequest, key: &str) -> Option<u64> {
    req.param(key).map(lenient_u64)
}

pub(crate) fn ceil_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u128::from(done) * 100).div_ceil(u128::from(total));
    pct.min(100) as u8
}

pub(crate) fn floor_percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = u128::from(done) * 100 / u128::from(total);
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_takes_leading_digits() {
        assert_eq!(lenient_u64("12"), 12);
        assert_eq!(lenient_u64(" 7abc"), 7);
        assert_eq!(lenient_u64("abc"), 0);
        assert_eq!(lenient_u64("-3"), 0);
        assert_eq!(lenient_u64("99999999999999999999999"), u64::MAX);
    }

    #[test]
    fn strict_rejects_signs_and_garbage() {
        assert_eq!(strict_u64("0"), Some(0));
        assert_eq!(strict_u64("500"), Some(500));
        assert_eq!(strict_u64("-1"), None);
        assert_eq!(strict_u64("+1"), None);
        assert_eq!(strict_u64("1.5"), None);
        assert_eq!(strict_u64(""), None);
    }

    #[test]
    fn percentages_round_and_clamp() {
        assert_eq!(ceil_percent(100, 1200), 9);
        assert_eq!(ceil_percent(1199, 1200), 100);
        assert_eq!(ceil_percent(3, 2), 100);
        assert_eq!(ceil_percent(1, 0), 0);
        assert_eq!(floor_percent(2, 3), 66);
        assert_eq!(floor_percent(5, 0), 0);
    }
}
