//! Parameter and header names used by the supported client uploaders.
//!
//! Header names are matched case-insensitively; parameter names are exact.

/// blueimp jQuery-File-Upload: `Content-Range: bytes <start>-<end>/<total>`.
pub const HEADER_CONTENT_RANGE: &str = "content-range";

/// plupload: 0-based index of the current chunk.
pub const PARAM_CHUNK: &str = "chunk";
/// plupload: number of chunks.
pub const PARAM_CHUNKS: &str = "chunks";

/// simple-uploader: index of the current chunk.
pub const PARAM_SIMPLE_CHUNK_NUMBER: &str = "chunkNumber";
/// simple-uploader: number of chunks.
pub const PARAM_SIMPLE_TOTAL_CHUNKS: &str = "totalChunks";
/// simple-uploader: declared size of the whole file.
pub const PARAM_SIMPLE_TOTAL_SIZE: &str = "totalSize";

/// resumable.js: 1-based index of the current chunk.
pub const PARAM_RESUMABLE_CHUNK_NUMBER: &str = "resumableChunkNumber";
/// resumable.js: number of chunks.
pub const PARAM_RESUMABLE_TOTAL_CHUNKS: &str = "resumableTotalChunks";
/// resumable.js: client generated file identifier.
pub const PARAM_RESUMABLE_IDENTIFIER: &str = "resumableIdentifier";
/// resumable.js: declared size of the whole file.
pub const PARAM_RESUMABLE_TOTAL_SIZE: &str = "resumableTotalSize";
/// resumable.js: original file name (check requests).
pub const PARAM_RESUMABLE_FILENAME: &str = "resumableFilename";

/// Resumable identifiers are cut to this many characters in fragment names.
pub const RESUMABLE_IDENTIFIER_MAX_LEN: usize = 40;

/// Dropzone: client generated file UUID.
pub const PARAM_DZ_UUID: &str = "dzuuid";
/// Dropzone: 0-based index of the current chunk.
pub const PARAM_DZ_CHUNK_INDEX: &str = "dzchunkindex";
/// Dropzone: number of chunks.
pub const PARAM_DZ_TOTAL_CHUNK_COUNT: &str = "dztotalchunkcount";
/// Dropzone: declared size of the whole file.
pub const PARAM_DZ_TOTAL_FILE_SIZE: &str = "dztotalfilesize";

/// ng-file-upload: 0-based index of the current chunk.
pub const PARAM_NG_CHUNK_NUMBER: &str = "_chunkNumber";
/// ng-file-upload: declared size of the whole file.
pub const PARAM_NG_TOTAL_SIZE: &str = "_totalSize";
/// ng-file-upload: nominal size of every chunk.
pub const PARAM_NG_CHUNK_SIZE: &str = "_chunkSize";
/// ng-file-upload: size of the current chunk.
pub const PARAM_NG_CURRENT_CHUNK_SIZE: &str = "_currentChunkSize";

/// FilePond: byte offset of the PATCH body within the file.
pub const HEADER_UPLOAD_OFFSET: &str = "upload-offset";
/// FilePond: declared size of the whole file.
pub const HEADER_UPLOAD_LENGTH: &str = "upload-length";
/// FilePond: original file name.
pub const HEADER_UPLOAD_NAME: &str = "upload-name";
/// FilePond: server id returned for the initial request, sent back on PATCH.
pub const PARAM_FILEPOND_PATCH: &str = "patch";

/// Chunk check (simple-uploader `testChunks`): file identifier.
pub const PARAM_CHECK_IDENTIFIER: &str = "identifier";
/// Chunk check: original file name.
pub const PARAM_CHECK_FILENAME: &str = "filename";

/// File check (blueimp / ng-file-upload resume): original file name.
pub const PARAM_FILE_CHECK_NAME: &str = "name";
/// File check: declared size of the whole file.
pub const PARAM_FILE_CHECK_SIZE: &str = "size";

/// User agent header used for the browser fingerprint.
pub const HEADER_USER_AGENT: &str = "user-agent";

/// Fingerprint placeholder when the client sends no user agent.
pub const NO_BROWSER: &str = "no-browser";
