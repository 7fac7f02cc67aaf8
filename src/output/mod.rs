//! Output module for run reports
//!
//! This module handles:
//! - Collecting per-page errors while the crawl runs
//! - Counting followed and skipped links
//! - Writing the stats and error CSVs when the crawl closes

mod csv_report;
mod errors;
pub mod stats;
mod traits;

pub use csv_report::CsvReporter;
pub use errors::{ErrorCollector, ErrorRecord};
pub use stats::{print_statistics, RunStats, StatValue, StatsCollector};
pub use traits::{OutputError, OutputResult, RunReporter};
