//! CSV run reports
//!
//! Two flat files: a `Stat,Value` table and, only when something failed, a
//! `URL,Error` log.

use crate::output::errors::ErrorRecord;
use crate::output::stats::RunStats;
use crate::output::traits::{OutputResult, RunReporter};
use std::path::{Path, PathBuf};

/// Writes the stats and error CSVs
#[derive(Debug, Clone)]
pub struct CsvReporter {
    stats_path: PathBuf,
    errors_path: PathBuf,
}

impl CsvReporter {
    pub fn new(stats_path: impl Into<PathBuf>, errors_path: impl Into<PathBuf>) -> Self {
        Self {
            stats_path: stats_path.into(),
            errors_path: errors_path.into(),
        }
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }

    pub fn errors_path(&self) -> &Path {
        &self.errors_path
    }

    /// Writes `Stat,Value` rows in insertion order
    pub fn write_stats(&self, stats: &RunStats) -> OutputResult<()> {
        let mut writer = open_writer(&self.stats_path)?;
        writer.write_record(["Stat", "Value"])?;
        for (key, value) in stats.iter() {
            writer.write_record([key, value.to_string().as_str()])?;
        }
        writer.flush()?;
        tracing::info!("Stats written to {}", self.stats_path.display());
        Ok(())
    }

    /// Writes `URL,Error` rows in record order; does nothing when there are none
    pub fn write_errors(&self, errors: &[ErrorRecord]) -> OutputResult<()> {
        if errors.is_empty() {
            return Ok(());
        }

        let mut writer = open_writer(&self.errors_path)?;
        writer.write_record(["URL", "Error"])?;
        for record in errors {
            writer.write_record([record.url.as_str(), record.message.as_str()])?;
        }
        writer.flush()?;
        tracing::info!(
            "{} errors written to {}",
            errors.len(),
            self.errors_path.display()
        );
        Ok(())
    }
}

impl RunReporter for CsvReporter {
    /// Writes both reports; a failure in one does not prevent the other
    fn emit(&self, stats: &RunStats, errors: &[ErrorRecord]) -> OutputResult<()> {
        let stats_result = self.write_stats(stats);
        if let Err(e) = &stats_result {
            tracing::error!("Failed to write {}: {}", self.stats_path.display(), e);
        }

        let errors_result = self.write_errors(errors);
        if let Err(e) = &errors_result {
            tracing::error!("Failed to write {}: {}", self.errors_path.display(), e);
        }

        stats_result.and(errors_result)
    }
}

fn open_writer(path: &Path) -> OutputResult<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(csv::Writer::from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::stats::StatValue;
    use tempfile::TempDir;

    fn create_test_stats() -> RunStats {
        let mut stats = RunStats::new();
        stats.insert("pages_visited", StatValue::Count(2));
        stats.insert("finish_reason", StatValue::Text("finished".to_string()));
        stats
    }

    #[test]
    fn test_write_stats() {
        let dir = TempDir::new().unwrap();
        let reporter = CsvReporter::new(dir.path().join("stats.csv"), dir.path().join("errors.csv"));

        reporter.emit(&create_test_stats(), &[]).unwrap();

        let content = std::fs::read_to_string(dir.path().join("stats.csv")).unwrap();
        assert_eq!(content, "Stat,Value\npages_visited,2\nfinish_reason,finished\n");
    }

    #[test]
    fn test_no_error_file_without_errors() {
        let dir = TempDir::new().unwrap();
        let reporter = CsvReporter::new(dir.path().join("stats.csv"), dir.path().join("errors.csv"));

        reporter.emit(&create_test_stats(), &[]).unwrap();

        assert!(!dir.path().join("errors.csv").exists());
    }

    #[test]
    fn test_write_errors_quotes_fields() {
        let dir = TempDir::new().unwrap();
        let reporter = CsvReporter::new(dir.path().join("stats.csv"), dir.path().join("errors.csv"));
        let errors = vec![ErrorRecord {
            url: "http://gov.example/a,b".to_string(),
            message: "HTTP status 404".to_string(),
        }];

        reporter.emit(&create_test_stats(), &errors).unwrap();

        let content = std::fs::read_to_string(dir.path().join("errors.csv")).unwrap();
        assert_eq!(content, "URL,Error\n\"http://gov.example/a,b\",HTTP status 404\n");
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let stats_path = dir.path().join("nested/out/stats.csv");
        let reporter = CsvReporter::new(&stats_path, dir.path().join("errors.csv"));

        reporter.write_stats(&create_test_stats()).unwrap();
        assert!(stats_path.exists());
    }

    #[test]
    fn test_stats_failure_does_not_block_errors() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the stats file makes that write fail.
        let blocked = dir.path().join("stats.csv");
        std::fs::create_dir(&blocked).unwrap();
        let reporter = CsvReporter::new(&blocked, dir.path().join("errors.csv"));
        let errors = vec![ErrorRecord {
            url: "http://gov.example/".to_string(),
            message: "boom".to_string(),
        }];

        let result = reporter.emit(&create_test_stats(), &errors);

        assert!(result.is_err());
        assert!(dir.path().join("errors.csv").exists());
    }
}
