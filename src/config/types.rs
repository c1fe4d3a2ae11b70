use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(rename = "source", default)]
    pub sources: Vec<SourceConfig>,
}

/// HTTP fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Identification header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Seconds to wait for a response before treating the request as timed out
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Total number of attempts per page, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` failing waits `n * retry-base-delay-ms`
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Pause after every fetched page (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory that output files are resolved against
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Whether newly discovered items go before or after the existing ones
    #[serde(rename = "merge-order", default)]
    pub merge_order: MergeOrder,

    /// Leave a destination file untouched when a run found nothing new
    #[serde(rename = "skip-unchanged", default)]
    pub skip_unchanged: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            merge_order: MergeOrder::default(),
            skip_unchanged: false,
        }
    }
}

/// A paginated catalog endpoint and the file its items are collected into
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Name used in logs and reports
    pub name: String,

    /// First-page URL; the cursor is appended as a `Cursor` query parameter
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Destination file, relative to the output directory
    #[serde(rename = "output-file")]
    pub output_file: String,

    /// What to do when a page contains an already known id
    #[serde(rename = "duplicate-policy", default)]
    pub duplicate_policy: DuplicatePolicy,

    /// Upper bound on pages fetched for this source in one run
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

/// How a source walker reacts to an id it has already seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Pages are newest-first: the first known id ends the walk
    StopAtKnown,

    /// Count duplicates and keep paging until the cursor runs out
    #[default]
    Exhaustive,
}

/// Ordering of the merged collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeOrder {
    /// New items first, then the existing ones
    #[default]
    NewestFirst,

    /// Existing items first, new items appended
    ExistingFirst,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    4
}

fn default_retry_base_delay_ms() -> u64 {
    2000
}

fn default_page_delay_ms() -> u64 {
    1250
}

fn default_directory() -> String {
    ".".to_string()
}
