//! Run reports
//!
//! The coordinator fills these in as it goes; `main` decides the exit code
//! from `HarvestReport::success` and prints the summary.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Result of walking one source
#[derive(Debug, Clone, Default)]
pub struct SourceReport {
    pub name: String,
    pub new_items: usize,
    pub duplicates: usize,
    pub pages_fetched: u32,
    pub stopped_at_known: bool,
    /// Fetch error that ended the walk early, if any
    pub error: Option<String>,
}

/// Result of processing one destination file
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    pub output_file: String,
    pub existing_items: usize,
    pub new_items: usize,
    pub duplicates: usize,
    /// Items in the file after the save
    pub total_items: usize,
    /// The file was written, or deliberately left untouched
    pub saved: bool,
    pub sources: Vec<SourceReport>,
}

impl FileReport {
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.sources.iter().filter(|s| s.error.is_some())
    }
}

/// Outcome of a whole harvest run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
    pub files: Vec<FileReport>,
}

impl HarvestReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            elapsed: Duration::ZERO,
            files: Vec::new(),
        }
    }

    /// True when every destination file was saved
    ///
    /// Sources that stopped on a network error do not make a run fail; their
    /// partial results were still saved.
    pub fn success(&self) -> bool {
        self.files.iter().all(|f| f.saved)
    }

    pub fn total_new_items(&self) -> usize {
        self.files.iter().map(|f| f.new_items).sum()
    }

    pub fn total_duplicates(&self) -> usize {
        self.files.iter().map(|f| f.duplicates).sum()
    }

    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.saved)
    }
}

/// Prints a run summary to stdout
pub fn print_report(report: &HarvestReport) {
    println!("=== Harvest Summary ===\n");

    for file in &report.files {
        println!(
            "{} [{}]",
            file.output_file,
            if file.saved { "saved" } else { "FAILED" }
        );
        println!(
            "  Existing: {}, New: {}, Duplicates: {}, Total: {}",
            file.existing_items, file.new_items, file.duplicates, file.total_items
        );

        for source in &file.sources {
            let ending = match (&source.error, source.stopped_at_known) {
                (Some(e), _) => format!("aborted: {}", e),
                (None, true) => "stopped at known item".to_string(),
                (None, false) => "exhausted".to_string(),
            };
            println!(
                "  - {}: {} new, {} duplicates, {} pages ({})",
                source.name, source.new_items, source.duplicates, source.pages_fetched, ending
            );
        }
        println!();
    }

    println!(
        "Added {} new items across {} file(s) in {:.1}s",
        report.total_new_items(),
        report.files.len(),
        report.elapsed.as_secs_f64()
    );
}
