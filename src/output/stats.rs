//! Run statistics
//!
//! This module provides the live counters updated while crawling and the
//! ordered stats table produced once at close.

use crate::crawler::SkipReason;
use crate::state::FinishReason;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

/// A single stat value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatValue {
    Count(u64),
    Text(String),
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Insertion-ordered stat table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    entries: Vec<(String, StatValue)>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a stat, keeping its original position if it already exists
    pub fn insert(&mut self, key: impl Into<String>, value: StatValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&StatValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Returns a counter stat, or `None` if it is missing or not a count
    pub fn count(&self, key: &str) -> Option<u64> {
        match self.get(key) {
            Some(StatValue::Count(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Live counters shared by all workers
#[derive(Debug)]
pub struct StatsCollector {
    start_time: DateTime<Utc>,
    started: Instant,
    links_followed: AtomicU64,
    skipped_offsite: AtomicU64,
    skipped_duplicate: AtomicU64,
    skipped_depth: AtomicU64,
    max_depth_reached: AtomicU32,
}

impl StatsCollector {
    /// Starts the clock
    pub fn new() -> Self {
        Self {
            start_time: Utc::now(),
            started: Instant::now(),
            links_followed: AtomicU64::new(0),
            skipped_offsite: AtomicU64::new(0),
            skipped_duplicate: AtomicU64::new(0),
            skipped_depth: AtomicU64::new(0),
            max_depth_reached: AtomicU32::new(0),
        }
    }

    pub fn record_followed(&self) {
        self.links_followed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::OffDomain => &self.skipped_offsite,
            SkipReason::Duplicate => &self.skipped_duplicate,
            SkipReason::DepthLimit => &self.skipped_depth,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Notes the depth of a page that was visited
    pub fn record_visit_depth(&self, depth: u32) {
        self.max_depth_reached.fetch_max(depth, Ordering::Relaxed);
    }

    pub fn links_followed(&self) -> u64 {
        self.links_followed.load(Ordering::Relaxed)
    }

    pub fn links_skipped(&self) -> u64 {
        self.skipped_offsite.load(Ordering::Relaxed)
            + self.skipped_duplicate.load(Ordering::Relaxed)
            + self.skipped_depth.load(Ordering::Relaxed)
    }

    /// Produces the final stat table
    ///
    /// # Stat Order
    ///
    /// `start_time`, `pages_visited`, `links_followed`, `links_skipped`,
    /// `links_skipped_offsite`, `links_skipped_duplicate`, `links_skipped_depth`,
    /// `max_depth_reached`, `error_count`, `finish_time`, `elapsed_time_seconds`,
    /// `finish_reason`
    pub fn finalize(&self, pages_visited: u64, error_count: u64, reason: FinishReason) -> RunStats {
        let mut stats = RunStats::new();
        stats.insert("start_time", StatValue::Text(self.start_time.to_rfc3339()));
        stats.insert("pages_visited", StatValue::Count(pages_visited));
        stats.insert("links_followed", StatValue::Count(self.links_followed()));
        stats.insert("links_skipped", StatValue::Count(self.links_skipped()));
        stats.insert(
            "links_skipped_offsite",
            StatValue::Count(self.skipped_offsite.load(Ordering::Relaxed)),
        );
        stats.insert(
            "links_skipped_duplicate",
            StatValue::Count(self.skipped_duplicate.load(Ordering::Relaxed)),
        );
        stats.insert(
            "links_skipped_depth",
            StatValue::Count(self.skipped_depth.load(Ordering::Relaxed)),
        );
        stats.insert(
            "max_depth_reached",
            StatValue::Count(u64::from(self.max_depth_reached.load(Ordering::Relaxed))),
        );
        stats.insert("error_count", StatValue::Count(error_count));
        stats.insert("finish_time", StatValue::Text(Utc::now().to_rfc3339()));
        stats.insert(
            "elapsed_time_seconds",
            StatValue::Text(format!("{:.3}", self.started.elapsed().as_secs_f64())),
        );
        stats.insert("finish_reason", StatValue::Text(reason.to_string()));
        stats
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunStats) {
    println!("=== Crawl Statistics ===\n");

    for (key, value) in stats.iter() {
        println!("  {}: {}", key, value);
    }
    println!();

    let visited = stats.count("pages_visited").unwrap_or(0);
    let errors = stats.count("error_count").unwrap_or(0);
    let attempted = visited + errors;
    let success_rate = if attempted > 0 {
        (visited as f64 / attempted as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        success_rate, visited, attempted
    );
}
