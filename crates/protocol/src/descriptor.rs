//! Canonical, protocol-independent description of one chunk.

use serde::Serialize;

/// What the server knows about the chunk in the current request.
///
/// Index variants fill `current_index` / `total_count`, byte variants fill
/// `byte_start` / `byte_end` / `byte_total`. `current_index` is always
/// 1-based regardless of what the client sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDescriptor {
    /// Per-upload token placed in the fragment name (client UUID, resumable
    /// identifier, total chunk count or total byte count).
    pub upload_id: Option<String>,
    pub current_index: u64,
    pub total_count: u64,
    pub byte_start: u64,
    pub byte_end: u64,
    pub byte_total: u64,
    /// Declared size of the whole file, 0 when the client did not send one.
    pub file_size: u64,
    /// Size of the bytes received with this request.
    pub chunk_size: u64,
    pub original_filename: String,
}

impl ChunkDescriptor {
    pub fn indexed(current_index: u64, total_count: u64) -> Self {
        Self {
            current_index,
            total_count,
            ..Self::default()
        }
    }

    pub fn byte_range(start: u64, end: u64, total: u64) -> Self {
        Self {
            byte_start: start,
            byte_end: end,
            byte_total: total,
            ..Self::default()
        }
    }

    pub fn with_upload_id(mut self, upload_id: impl Into<String>) -> Self {
        self.upload_id = Some(upload_id.into());
        self
    }

    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }
}
