//! Appending files onto a destination file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::TransferError;

/// Appends source files onto one destination, in call order.
///
/// Each `append_file` consumes the merger; on error the destination handle
/// is dropped, and so closed, before the error reaches the caller.
#[derive(Debug)]
pub struct FileMerger {
    destination: BufWriter<File>,
    path: PathBuf,
    appended: u64,
}

impl FileMerger {
    /// Opens `path` for appending, creating it when missing.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| TransferError::StreamOpenFailure {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            destination: BufWriter::new(file),
            path: path.to_path_buf(),
            appended: 0,
        })
    }

    /// Copies the whole of `source` onto the end of the destination.
    pub fn append_file(mut self, source: &Path) -> Result<Self, TransferError> {
        let mut input = File::open(source).map_err(|e| TransferError::StreamOpenFailure {
            path: source.to_path_buf(),
            source: e,
        })?;

        let mut buf = [0u8; 8192];
        loop {
            let n = input.read(&mut buf)?;
            if n == 0 {
                break;
            }
            self.destination.write_all(&buf[..n])?;
            self.appended += n as u64;
        }
        Ok(self)
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended by this merger so far.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Flushes and closes the destination. Returns the bytes appended.
    pub fn close(self) -> Result<u64, TransferError> {
        let file = self
            .destination
            .into_inner()
            .map_err(|e| TransferError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(self.appended)
    }
}
