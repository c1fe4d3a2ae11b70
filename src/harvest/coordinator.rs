//! Harvest coordinator - run orchestration
//!
//! This module ties the pieces of a run together:
//! - Grouping sources by destination file
//! - Loading each destination once
//! - Walking the sources of a destination in order over one shared id set
//! - Saving each destination once and collecting the report

use crate::config::{Config, SourceConfig};
use crate::harvest::fetcher::PageFetcher;
use crate::harvest::walker::walk_source;
use crate::output::{FileReport, HarvestReport, SourceReport};
use crate::storage::{load_existing, merge_and_save, ExistingSet, FsStorage, Storage};
use crate::HarvestError;
use chrono::Utc;
use std::time::Instant;

/// Groups sources by output file, in order of first appearance
pub fn group_sources(sources: &[SourceConfig]) -> Vec<(&str, Vec<&SourceConfig>)> {
    let mut groups: Vec<(&str, Vec<&SourceConfig>)> = Vec::new();

    for source in sources {
        match groups
            .iter_mut()
            .find(|(file, _)| *file == source.output_file)
        {
            Some((_, members)) => members.push(source),
            None => groups.push((source.output_file.as_str(), vec![source])),
        }
    }

    groups
}

/// Main harvest coordinator
pub struct Coordinator<S: Storage = FsStorage> {
    config: Config,
    fetcher: PageFetcher,
    storage: S,
}

impl Coordinator<FsStorage> {
    /// Creates a coordinator writing under the configured output directory
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let storage = FsStorage::new(&config.output.directory);
        Self::with_storage(config, storage)
    }
}

impl<S: Storage> Coordinator<S> {
    pub fn with_storage(config: Config, storage: S) -> Result<Self, HarvestError> {
        let fetcher = PageFetcher::new(&config.fetcher)?;
        Ok(Self {
            config,
            fetcher,
            storage,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs one pass over every configured source
    ///
    /// Destination files are processed one after another. A file that fails to
    /// save is recorded in the report and does not stop the remaining files.
    pub async fn run(&self) -> HarvestReport {
        let start_time = Instant::now();
        let mut report = HarvestReport::new(Utc::now());

        let groups = group_sources(&self.config.sources);
        tracing::info!(
            "Starting harvest: {} source(s) into {} file(s)",
            self.config.sources.len(),
            groups.len()
        );

        for (output_file, sources) in groups {
            let file_report = self.harvest_file(output_file, &sources).await;
            report.files.push(file_report);
        }

        report.elapsed = start_time.elapsed();
        tracing::info!(
            "Harvest finished in {:.1}s: {} new items, {} file(s) failed",
            report.elapsed.as_secs_f64(),
            report.total_new_items(),
            report.failed_files().count()
        );

        report
    }

    /// Loads, walks and saves a single destination file
    async fn harvest_file(&self, output_file: &str, sources: &[&SourceConfig]) -> FileReport {
        let ExistingSet {
            items: existing_items,
            ids: mut known_ids,
        } = load_existing(&self.storage, output_file);
        let mut file_report = FileReport {
            output_file: output_file.to_string(),
            existing_items: existing_items.len(),
            ..Default::default()
        };
        let mut new_items = Vec::new();

        for source in sources {
            tracing::info!("[{}] Walking {}", source.name, source.base_url);
            let outcome = walk_source(
                &self.fetcher,
                source,
                &mut known_ids,
                self.config.fetcher.page_delay(),
            )
            .await;

            tracing::info!(
                "[{}] {} new, {} duplicates over {} page(s)",
                source.name,
                outcome.new_count(),
                outcome.duplicate_count,
                outcome.pages_fetched
            );

            file_report.duplicates += outcome.duplicate_count;
            file_report.sources.push(SourceReport {
                name: source.name.clone(),
                new_items: outcome.new_count(),
                duplicates: outcome.duplicate_count,
                pages_fetched: outcome.pages_fetched,
                stopped_at_known: outcome.stopped_at_known,
                error: outcome.error,
            });
            new_items.extend(outcome.new_items);
        }

        file_report.new_items = new_items.len();

        if new_items.is_empty() && self.config.output.skip_unchanged {
            tracing::info!("No new items for {}, leaving it untouched", output_file);
            file_report.total_items = existing_items.len();
            file_report.saved = true;
            return file_report;
        }

        match merge_and_save(
            &self.storage,
            existing_items,
            new_items,
            output_file,
            self.config.output.merge_order,
        ) {
            Some(total) => {
                file_report.total_items = total;
                file_report.saved = true;
            }
            None => file_report.saved = false,
        }

        tracing::info!(
            "{}: {} new, {} duplicates, {} total",
            output_file,
            file_report.new_items,
            file_report.duplicates,
            file_report.total_items
        );

        file_report
    }
}

/// Runs a complete harvest with filesystem storage
pub async fn run_harvest(config: Config) -> Result<HarvestReport, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run().await)
}
