//! Harvest module for catalog polling
//!
//! This module contains the core harvesting logic, including:
//! - HTTP page fetching with retry logic
//! - Cursor pagination and duplicate detection per source
//! - Overall run coordination across destination files

mod coordinator;
mod fetcher;
mod walker;

pub use coordinator::{group_sources, run_harvest, Coordinator};
pub use fetcher::{backoff_delay, build_http_client, page_url, FetchFailure, PageFetcher};
pub use walker::{scan_page, walk_source, PageScan, WalkOutcome};
