//! The uploaded file handle a chunk arrives in.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A file delivered with the request, already spooled to disk by the web
/// layer.
pub trait UploadedFile: Send {
    /// File name as reported by the client.
    fn original_name(&self) -> &str;

    fn mime_type(&self) -> Option<&str>;

    /// Size in bytes of the bytes received with this request.
    fn size(&self) -> u64;

    /// Whether the web layer accepted the upload.
    fn is_valid(&self) -> bool;

    /// Current location on disk.
    fn path(&self) -> &Path;

    /// Moves the file to `directory/name` and returns the new path.
    fn move_to(&mut self, directory: &Path, name: &str) -> io::Result<PathBuf>;
}

/// Moves `from` to `directory/name`, creating the directory. Falls back to
/// copy and remove when a rename is not possible (different filesystems).
pub fn move_file(from: &Path, directory: &Path, name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(directory)?;
    let target = directory.join(name);
    if fs::rename(from, &target).is_err() {
        fs::copy(from, &target)?;
        fs::remove_file(from)?;
    }
    Ok(target)
}

/// A request file stored in a temporary location.
#[derive(Debug, Clone)]
pub struct TempUpload {
    path: PathBuf,
    original_name: String,
    mime_type: Option<String>,
    size: u64,
    always_valid: bool,
}

impl TempUpload {
    /// Wraps a file the web layer spooled to `path`.
    pub fn new(
        path: impl Into<PathBuf>,
        original_name: impl Into<String>,
        mime_type: Option<String>,
    ) -> io::Result<Self> {
        let path = path.into();
        let size = fs::metadata(&path)?.len();
        Ok(Self {
            path,
            original_name: original_name.into(),
            mime_type,
            size,
            always_valid: false,
        })
    }

    /// Materialises a raw request body (a streaming PATCH) into a uniquely
    /// named file under `dir`. The result is always considered valid.
    pub fn from_body_in(dir: &Path, body: &[u8], original_name: impl Into<String>) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("chunk-upload-{}", uuid::Uuid::new_v4()));
        let mut file = fs::File::create(&path)?;
        file.write_all(body)?;
        file.sync_all()?;
        tracing::debug!(path = %path.display(), size = body.len(), "materialised request body");

        Ok(Self {
            path,
            original_name: original_name.into(),
            mime_type: None,
            size: body.len() as u64,
            always_valid: true,
        })
    }

    /// [`TempUpload::from_body_in`] using the system temp directory.
    pub fn from_body(body: &[u8], original_name: impl Into<String>) -> io::Result<Self> {
        Self::from_body_in(&std::env::temp_dir(), body, original_name)
    }
}

impl UploadedFile for TempUpload {
    fn original_name(&self) -> &str {
        &self.original_name
    }

    fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn is_valid(&self) -> bool {
        self.always_valid || self.path.is_file()
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn move_to(&mut self, directory: &Path, name: &str) -> io::Result<PathBuf> {
        let target = move_file(&self.path, directory, name)?;
        self.path = target.clone();
        Ok(target)
    }
}
