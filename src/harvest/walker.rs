//! Cursor-driven pagination over a single source
//!
//! The walker fetches pages one after another, turns entries with unseen ids
//! into items, and decides after every page whether to keep going.

use crate::catalog::{CatalogPage, Item};
use crate::config::{DuplicatePolicy, SourceConfig};
use crate::harvest::fetcher::{page_url, PageFetcher};
use std::collections::HashSet;
use std::time::Duration;

/// What the walker should do after scanning a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScan {
    /// Fetch the page behind this cursor next
    Continue(String),

    /// A known id was met under `StopAtKnown`; the rest of the page is discarded
    Stop,

    /// The page had no next cursor
    Exhausted,
}

/// Everything a walk over one source produced
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    /// Items whose ids were not known, in discovery order
    pub new_items: Vec<Item>,

    /// Entries skipped because their id was already known
    pub duplicate_count: usize,

    pub pages_fetched: u32,

    /// The walk ended on a known id
    pub stopped_at_known: bool,

    /// Set when the walk was cut short by a fetch that ran out of attempts
    pub error: Option<String>,
}

impl WalkOutcome {
    pub fn new_count(&self) -> usize {
        self.new_items.len()
    }
}

/// Scans one page against the known ids
///
/// New ids are inserted into `known_ids` immediately, so later entries,
/// pages and sources of the same destination see them as known.
pub fn scan_page(
    page: &CatalogPage,
    known_ids: &mut HashSet<i64>,
    policy: DuplicatePolicy,
    outcome: &mut WalkOutcome,
) -> PageScan {
    for entry in page.entries() {
        let Some(id) = entry.id else {
            tracing::debug!("Skipping catalog entry without an id");
            continue;
        };

        if known_ids.contains(&id) {
            outcome.duplicate_count += 1;
            match policy {
                DuplicatePolicy::StopAtKnown => {
                    tracing::debug!("Reached known id {}, stopping", id);
                    outcome.stopped_at_known = true;
                    return PageScan::Stop;
                }
                DuplicatePolicy::Exhaustive => continue,
            }
        }

        if let Some(item) = Item::from_entry(entry) {
            known_ids.insert(id);
            outcome.new_items.push(item);
        }
    }

    match page.next_cursor() {
        Some(cursor) => PageScan::Continue(cursor.to_string()),
        None => PageScan::Exhausted,
    }
}

/// Walks every page of `source` until the cursor runs out, a known id stops
/// the walk, or the page limit is reached
///
/// A fetch that exhausts its attempts ends the walk for this source only;
/// items gathered up to that point are kept in the outcome.
pub async fn walk_source(
    fetcher: &PageFetcher,
    source: &SourceConfig,
    known_ids: &mut HashSet<i64>,
    page_delay: Duration,
) -> WalkOutcome {
    let mut outcome = WalkOutcome::default();
    let mut cursor: Option<String> = None;

    loop {
        if let Some(limit) = source.max_pages {
            if outcome.pages_fetched >= limit {
                tracing::info!("[{}] Reached page limit of {}", source.name, limit);
                break;
            }
        }

        let url = match page_url(&source.base_url, cursor.as_deref()) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("[{}] Invalid page URL: {}", source.name, e);
                outcome.error = Some(e.to_string());
                break;
            }
        };

        let page = match fetcher.fetch_page(&url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!(
                    "[{}] Giving up after page {}: {}",
                    source.name,
                    outcome.pages_fetched,
                    e
                );
                outcome.error = Some(e.to_string());
                break;
            }
        };
        outcome.pages_fetched += 1;

        let before = outcome.new_count();
        let scan = scan_page(&page, known_ids, source.duplicate_policy, &mut outcome);
        tracing::info!(
            "[{}] Page {}: {} entries, {} new",
            source.name,
            outcome.pages_fetched,
            page.entries().len(),
            outcome.new_count() - before
        );

        tokio::time::sleep(page_delay).await;

        match scan {
            PageScan::Continue(next) => cursor = Some(next),
            PageScan::Stop | PageScan::Exhausted => break,
        }
    }

    outcome
}
