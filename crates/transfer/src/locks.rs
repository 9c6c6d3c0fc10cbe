//! Per-upload serialisation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// One mutex per fragment base name, created on demand and dropped when no
/// request holds or waits for it.
#[derive(Debug, Default)]
pub struct UploadLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UploadLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `key`.
    pub fn with_lock<T>(&self, key: &str, f: impl FnOnce() -> T) -> T {
        let entry = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(key.to_owned()).or_default())
        };

        let result = {
            let _guard = entry.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // map + this call: nobody else is waiting
        if Arc::strong_count(&entry) == 2 {
            map.remove(key);
        }
        result
    }

    /// Number of keys currently locked or waited on.
    pub fn active(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
