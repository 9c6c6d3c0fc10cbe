//! The closed set of supported protocols.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::handler::{ChunkCheckRequest, ChunkUpload};
use crate::request::{ClientIdentity, UploadRequest};
use crate::variants::{self, Detector, Extractor};

/// A client-side chunked upload convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolKind {
    #[serde(rename = "content-range")]
    ContentRange,
    #[serde(rename = "chunks-in-request")]
    ChunksInRequest,
    #[serde(rename = "resumable")]
    ResumableJs,
    #[serde(rename = "dropzone")]
    DropZone,
    #[serde(rename = "simple-uploader")]
    SimpleUploader,
    #[serde(rename = "ng-file-upload")]
    NgFileUpload,
    #[serde(rename = "filepond")]
    FilePond,
    /// Whole file in one request. Never claims a request itself.
    #[serde(rename = "single")]
    Single,
    #[serde(rename = "chunk-check")]
    ChunkCheck,
    #[serde(rename = "resumable-check")]
    ResumableJsCheck,
    #[serde(rename = "file-check")]
    FileCheck,
}

/// Whether a protocol carries chunk data or asks about stored chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerRole {
    Upload,
    Check,
}

/// The assembly strategy a protocol's clients expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyStrategy {
    /// Chunks arrive in order and are appended to one fragment.
    Sequential,
    /// Chunks may arrive in any order and are stored one file per chunk.
    Parallel,
    /// No assembly; the uploaded file is already complete.
    Single,
}

impl ProtocolKind {
    pub const ALL: [ProtocolKind; 11] = [
        Self::ContentRange,
        Self::ChunksInRequest,
        Self::ResumableJs,
        Self::DropZone,
        Self::SimpleUploader,
        Self::NgFileUpload,
        Self::FilePond,
        Self::Single,
        Self::ChunkCheck,
        Self::ResumableJsCheck,
        Self::FileCheck,
    ];

    /// Default detection order for uploads. Order is significant: the first
    /// protocol whose predicate matches wins.
    pub const DEFAULT_UPLOADS: [ProtocolKind; 7] = [
        Self::ContentRange,
        Self::ChunksInRequest,
        Self::ResumableJs,
        Self::DropZone,
        Self::SimpleUploader,
        Self::NgFileUpload,
        Self::FilePond,
    ];

    /// Default detection order for completeness checks.
    pub const DEFAULT_CHECKS: [ProtocolKind; 3] =
        [Self::ResumableJsCheck, Self::ChunkCheck, Self::FileCheck];

    pub fn name(self) -> &'static str {
        match self {
            Self::ContentRange => "content-range",
            Self::ChunksInRequest => "chunks-in-request",
            Self::ResumableJs => "resumable",
            Self::DropZone => "dropzone",
            Self::SimpleUploader => "simple-uploader",
            Self::NgFileUpload => "ng-file-upload",
            Self::FilePond => "filepond",
            Self::Single => "single",
            Self::ChunkCheck => "chunk-check",
            Self::ResumableJsCheck => "resumable-check",
            Self::FileCheck => "file-check",
        }
    }

    pub fn role(self) -> HandlerRole {
        match self {
            Self::ChunkCheck | Self::ResumableJsCheck | Self::FileCheck => HandlerRole::Check,
            _ => HandlerRole::Upload,
        }
    }

    pub fn strategy(self) -> AssemblyStrategy {
        match self {
            Self::ResumableJs | Self::DropZone => AssemblyStrategy::Parallel,
            Self::Single | Self::ChunkCheck | Self::ResumableJsCheck | Self::FileCheck => {
                AssemblyStrategy::Single
            }
            _ => AssemblyStrategy::Sequential,
        }
    }

    /// Whether fragment progress is measured in bytes rather than chunk indexes.
    pub fn is_byte_range(self) -> bool {
        matches!(self, Self::ContentRange | Self::FilePond)
    }

    fn detector(self) -> Option<Detector> {
        Some(match self {
            Self::ContentRange => variants::content_range::detect,
            Self::ChunksInRequest => variants::indexed::detect_chunks_in_request,
            Self::ResumableJs => variants::indexed::detect_resumable,
            Self::DropZone => variants::indexed::detect_dropzone,
            Self::SimpleUploader => variants::indexed::detect_simple_uploader,
            Self::NgFileUpload => variants::ng_file::detect,
            Self::FilePond => variants::file_pond::detect,
            Self::ChunkCheck => crate::handler::detect_chunk_check,
            Self::ResumableJsCheck => crate::handler::detect_resumable_check,
            Self::FileCheck => crate::handler::detect_file_check,
            Self::Single => return None,
        })
    }

    fn extractor(self) -> Option<Extractor> {
        Some(match self {
            Self::ContentRange => variants::content_range::extract,
            Self::ChunksInRequest => variants::indexed::extract_chunks_in_request,
            Self::ResumableJs => variants::indexed::extract_resumable,
            Self::DropZone => variants::indexed::extract_dropzone,
            Self::SimpleUploader => variants::indexed::extract_simple_uploader,
            Self::NgFileUpload => variants::ng_file::extract,
            Self::FilePond => variants::file_pond::extract,
            Self::Single => crate::handler::extract_single,
            Self::ChunkCheck | Self::ResumableJsCheck | Self::FileCheck => return None,
        })
    }

    /// Evaluates the protocol's predicate.
    ///
    /// Returns an error when the request is recognisably meant for this
    /// protocol but its values are unusable (overflowing byte range, failed
    /// numeric guard).
    pub fn detect(self, req: &dyn UploadRequest) -> Result<bool, ProtocolError> {
        match self.detector() {
            Some(detect) => detect(req),
            None => Ok(false),
        }
    }

    /// Boolean form of [`ProtocolKind::detect`]: errors count as "no".
    pub fn can_handle(self, req: &dyn UploadRequest) -> bool {
        matches!(self.detect(req), Ok(true))
    }

    /// Binds the request and its uploaded file to this protocol.
    pub fn bind(
        self,
        req: &dyn UploadRequest,
        file: &dyn UploadedFile,
    ) -> Result<ChunkUpload, ProtocolError> {
        let extract = self.extractor().ok_or(ProtocolError::RoleMismatch {
            kind: self,
            action: "receive chunks",
        })?;
        let mut extracted = extract(req, file)?;

        let descriptor = &mut extracted.descriptor;
        if descriptor.original_filename.is_empty() {
            descriptor.original_filename = file.original_name().to_owned();
        }
        descriptor.chunk_size = file.size();

        Ok(ChunkUpload::new(
            self,
            extracted.descriptor,
            extracted.chunked,
            ClientIdentity::from_request(req),
            file.mime_type().map(str::to_owned),
        ))
    }

    /// Binds a completeness-check request.
    pub fn bind_check(self, req: &dyn UploadRequest) -> Result<ChunkCheckRequest, ProtocolError> {
        ChunkCheckRequest::from_request(self, req)
    }
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProtocolKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ProtocolError::UnknownProtocol(s.to_owned()))
    }
}
