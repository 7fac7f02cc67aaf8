//! Output handler traits and types
//!
//! This module defines the reporter interface the engine calls once when a
//! crawl closes, and the errors a reporter can produce.

use crate::output::errors::ErrorRecord;
use crate::output::stats::RunStats;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for run reporters
///
/// A reporter receives the finalized statistics and the ordered error records
/// exactly once per crawl. Implementations must be thread-safe.
pub trait RunReporter: Send + Sync {
    /// Writes the run summary
    ///
    /// # Arguments
    ///
    /// * `stats` - Finalized run statistics, in insertion order
    /// * `errors` - Per-page failures, in the order they occurred
    fn emit(&self, stats: &RunStats, errors: &[ErrorRecord]) -> OutputResult<()>;
}
