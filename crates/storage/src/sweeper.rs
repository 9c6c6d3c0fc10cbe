//! Removal of abandoned fragments.

use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::chunk_storage::ChunkStorage;
use crate::retention::RetentionWindow;
use crate::StorageError;

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Stale fragments found.
    pub found: usize,
    /// Fragments removed.
    pub deleted: usize,
    /// Paths that could not be removed.
    pub failures: Vec<String>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Deletes fragments older than the storage's retention window.
#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    storage: ChunkStorage,
    window: RetentionWindow,
}

impl RetentionSweeper {
    pub fn new(storage: ChunkStorage) -> Self {
        let window = storage.retention();
        Self { storage, window }
    }

    /// Overrides the retention window of the storage.
    pub fn with_window(mut self, window: RetentionWindow) -> Self {
        self.window = window;
        self
    }

    pub fn run(&self) -> Result<SweepReport, StorageError> {
        self.run_at(SystemTime::now())
    }

    /// Sweeps as if the current time were `now`.
    ///
    /// Deletion is best effort: a file that cannot be removed is recorded in
    /// the report and the sweep continues.
    pub fn run_at(&self, now: SystemTime) -> Result<SweepReport, StorageError> {
        let stale = self.storage.stale_fragments_at(self.window, now)?;
        let mut report = SweepReport {
            found: stale.len(),
            ..SweepReport::default()
        };

        if stale.is_empty() {
            tracing::info!(directory = %self.storage.directory(), "no stale chunk files");
            return Ok(report);
        }

        for file in stale {
            match file.delete() {
                Ok(()) => {
                    tracing::debug!(file = %file, "deleted stale chunk");
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::warn!(path = %file.path(), error = %e, "failed to delete stale chunk");
                    report.failures.push(file.path().to_owned());
                }
            }
        }

        tracing::info!(
            deleted = report.deleted,
            failed = report.failures.len(),
            window = %self.window,
            "cleared stale chunk files"
        );
        Ok(report)
    }

    /// Runs the sweep on the blocking thread pool.
    pub async fn run_blocking(self: Arc<Self>) -> Result<SweepReport, StorageError> {
        tokio::task::spawn_blocking(move || self.run())
            .await
            .map_err(|e| StorageError::TaskFailed(e.to_string()))?
    }
}
