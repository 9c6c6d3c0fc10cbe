use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use chunk_upload_protocol::{UploadedFile, move_file};

/// A complete upload, produced once per logical upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledFile {
    path: PathBuf,
    original_name: String,
    mime_type: Option<String>,
    size: u64,
}

impl AssembledFile {
    /// Describes the file at `path`, reading its size from disk.
    pub fn new(
        path: PathBuf,
        original_name: impl Into<String>,
        mime_type: Option<String>,
    ) -> io::Result<Self> {
        let size = fs::metadata(&path)?.len();
        Ok(Self {
            path,
            original_name: original_name.into(),
            mime_type,
            size,
        })
    }
}

impl UploadedFile for AssembledFile {
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
        true
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
