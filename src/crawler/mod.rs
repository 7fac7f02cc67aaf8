//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Frontier admission and deduplication
//! - HTTP fetching with retry logic
//! - HTML link extraction
//! - Dispatch scheduling, page budget, and politeness delay
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod scheduler;

pub use coordinator::{CrawlOutcome, Engine};
pub use fetcher::{build_http_client, FetchedPage, HttpFetcher, PageFetcher, MAX_REDIRECTS};
pub use frontier::{Admission, Frontier, FrontierEntry, SkipReason};
pub use parser::extract_hrefs;
pub use scheduler::Scheduler;
