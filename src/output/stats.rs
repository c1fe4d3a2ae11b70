//! Statistics over existing destination files
//!
//! Backs the `--stats` mode: reads each configured destination file and
//! reports what it currently holds, without touching the network.

use crate::config::Config;
use crate::harvest::group_sources;
use crate::storage::{parse_collection, Storage};
use chrono::{DateTime, NaiveDateTime, Utc};

/// What a destination file currently holds
#[derive(Debug, Clone, Default)]
pub struct FileStatistics {
    pub output_file: String,

    /// Sources writing into this file
    pub sources: Vec<String>,

    pub exists: bool,

    /// Set when the file exists but could not be read or parsed
    pub unreadable: Option<String>,

    pub total_items: usize,

    /// Items carrying a bundled-item map
    pub bundles: usize,

    pub last_update: Option<DateTime<Utc>>,
}

/// Loads statistics for every destination file named in `config`
pub fn load_statistics(config: &Config, storage: &dyn Storage) -> Vec<FileStatistics> {
    group_sources(&config.sources)
        .into_iter()
        .map(|(output_file, sources)| {
            let mut stats = FileStatistics {
                output_file: output_file.to_string(),
                sources: sources.iter().map(|s| s.name.clone()).collect(),
                ..Default::default()
            };

            match storage.read(output_file) {
                Ok(None) => {}
                Ok(Some(bytes)) => {
                    stats.exists = true;
                    read_contents(&bytes, &mut stats);
                }
                Err(e) => {
                    stats.exists = true;
                    stats.unreadable = Some(e.to_string());
                }
            }

            stats
        })
        .collect()
}

fn read_contents(bytes: &[u8], stats: &mut FileStatistics) {
    match parse_collection(bytes) {
        Ok(stored) => {
            stats.total_items = stored.items.len();
            stats.bundles = stored
                .items
                .iter()
                .filter(|i| i.bundled_items.is_some())
                .count();
            stats.last_update = stored.last_update.as_deref().and_then(parse_timestamp);
        }
        Err(e) => stats.unreadable = Some(e.to_string()),
    }
}

/// Accepts RFC 3339 and offset-less ISO timestamps, the latter taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc())
        })
        .ok()
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &[FileStatistics]) {
    println!("=== Collection Statistics ===\n");

    for file in stats {
        println!("{} (sources: {})", file.output_file, file.sources.join(", "));

        if !file.exists {
            println!("  not created yet");
        } else if let Some(e) = &file.unreadable {
            println!("  unreadable: {}", e);
        } else {
            println!("  Items: {}", file.total_items);
            println!("  With bundled items: {}", file.bundles);
            match file.last_update {
                Some(ts) => println!("  Last update: {}", ts.to_rfc3339()),
                None => println!("  Last update: unknown"),
            }
        }
        println!();
    }

    let total: usize = stats.iter().map(|f| f.total_items).sum();
    println!("Total items: {} across {} file(s)", total, stats.len());
}
