//! Output module for run reports and collection statistics
//!
//! This module handles:
//! - Per-source and per-file results of a harvest run
//! - Printing the run summary
//! - Inspecting existing destination files (`--stats`)

mod report;
pub mod stats;

pub use report::{print_report, FileReport, HarvestReport, SourceReport};
pub use stats::{load_statistics, print_statistics, FileStatistics};
