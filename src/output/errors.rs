//! Per-page error collection
//!
//! Failures are appended as they happen, from any worker, and read back once
//! at close.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// One failed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    /// The URL that failed, as requested
    pub url: String,

    /// Human-readable failure description
    pub message: String,
}

/// Append-only, thread-safe list of [`ErrorRecord`]s
#[derive(Debug, Default)]
pub struct ErrorCollector {
    records: Mutex<Vec<ErrorRecord>>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure for `url`
    ///
    /// Never panics; a lock poisoned by a panicking worker is recovered.
    pub fn record(&self, url: impl Into<String>, error: &dyn fmt::Display) {
        let record = ErrorRecord {
            url: url.into(),
            message: error.to_string(),
        };
        tracing::warn!("Error on {}: {}", record.url, record.message);
        self.lock().push(record);
    }

    /// Returns a copy of all records in the order they were recorded
    pub fn snapshot(&self) -> Vec<ErrorRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ErrorRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
