//! Persisted collections: loading what is already known, merging, and saving
//!
//! A collection file is read once when a destination is processed and
//! overwritten in full afterwards. There are no partial or appending writes.

use crate::catalog::Item;
use crate::config::MergeOrder;
use crate::storage::traits::{Storage, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The document written to a destination file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Always written as null; kept for readers that expect the field
    pub keyword: Option<String>,
    pub total_items: usize,
    pub last_update: DateTime<Utc>,
    pub data: Vec<Item>,
}

impl Collection {
    /// Wraps `data` with a fresh `lastUpdate` and a matching `totalItems`
    pub fn new(data: Vec<Item>) -> Self {
        Self {
            keyword: None,
            total_items: data.len(),
            last_update: Utc::now(),
            data,
        }
    }
}

/// Read side of a collection document
///
/// Only `data` is relied on. `keyword` and `totalItems` are ignored and
/// `lastUpdate` is kept as whatever string the file holds.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    #[serde(default)]
    last_update: Option<serde_json::Value>,

    #[serde(default)]
    data: Vec<Item>,
}

/// Layouts accepted when reading a destination file
#[derive(Deserialize)]
#[serde(untagged)]
enum PersistedLayout {
    /// Bare item array written by early versions of the tool
    Legacy(Vec<Item>),
    Document(StoredDocument),
}

/// Contents of a destination file as read back
#[derive(Debug, Clone, Default)]
pub struct StoredCollection {
    pub items: Vec<Item>,

    /// Raw `lastUpdate` string, when the file has one
    pub last_update: Option<String>,
}

/// Items already recorded in a destination file
#[derive(Debug, Clone, Default)]
pub struct ExistingSet {
    /// Items in file order
    pub items: Vec<Item>,

    /// Ids of `items`, for membership checks
    pub ids: HashSet<i64>,
}

impl ExistingSet {
    /// Builds the set, keeping only the first item for any repeated id
    pub fn from_items(items: Vec<Item>) -> Self {
        let total = items.len();
        let mut ids = HashSet::with_capacity(total);
        let items: Vec<Item> = items.into_iter().filter(|i| ids.insert(i.id)).collect();

        if items.len() < total {
            tracing::warn!(
                "Dropped {} repeated id(s) from existing data",
                total - items.len()
            );
        }

        Self { items, ids }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parses the contents of a destination file
pub fn parse_collection(bytes: &[u8]) -> Result<StoredCollection, serde_json::Error> {
    Ok(match serde_json::from_slice::<PersistedLayout>(bytes)? {
        PersistedLayout::Legacy(items) => StoredCollection {
            items,
            last_update: None,
        },
        PersistedLayout::Document(doc) => StoredCollection {
            items: doc.data,
            last_update: match doc.last_update {
                Some(serde_json::Value::String(s)) => Some(s),
                _ => None,
            },
        },
    })
}

/// Loads the items already stored under `name`
///
/// A missing file is an empty start. A file that cannot be read or parsed is
/// logged and also treated as an empty start; this never fails.
pub fn load_existing(storage: &dyn Storage, name: &str) -> ExistingSet {
    let bytes = match storage.read(name) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::info!("No existing data in {}, starting fresh", name);
            return ExistingSet::default();
        }
        Err(e) => {
            tracing::warn!("Could not read {} ({}), starting fresh", name, e);
            return ExistingSet::default();
        }
    };

    match parse_collection(&bytes) {
        Ok(stored) => {
            let existing = ExistingSet::from_items(stored.items);
            tracing::info!("Loaded {} existing items from {}", existing.len(), name);
            existing
        }
        Err(e) => {
            tracing::warn!("Could not parse {} ({}), starting fresh", name, e);
            ExistingSet::default()
        }
    }
}

/// Concatenates existing and new items in the requested order
///
/// An id is emitted at most once; the first occurrence in the merged
/// order wins.
pub fn merge_items(existing: Vec<Item>, new_items: Vec<Item>, order: MergeOrder) -> Vec<Item> {
    let (first, second) = match order {
        MergeOrder::NewestFirst => (new_items, existing),
        MergeOrder::ExistingFirst => (existing, new_items),
    };

    let mut seen = HashSet::with_capacity(first.len() + second.len());
    first
        .into_iter()
        .chain(second)
        .filter(|item| seen.insert(item.id))
        .collect()
}

/// Serializes `collection` in full and writes it under `name`
pub fn save_collection(
    storage: &dyn Storage,
    name: &str,
    collection: &Collection,
) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(collection)?;
    storage.write(name, &bytes)
}

/// Merges and overwrites the destination file
///
/// # Returns
///
/// * `Some(total)` - The file was written and now holds `total` items
/// * `None` - Serialization or the write failed (already logged)
pub fn merge_and_save(
    storage: &dyn Storage,
    existing: Vec<Item>,
    new_items: Vec<Item>,
    name: &str,
    order: MergeOrder,
) -> Option<usize> {
    let collection = Collection::new(merge_items(existing, new_items, order));

    match save_collection(storage, name, &collection) {
        Ok(()) => {
            tracing::info!("Saved {} items to {}", collection.total_items, name);
            Some(collection.total_items)
        }
        Err(e) => {
            tracing::error!("Failed to save {}: {}", name, e);
            None
        }
    }
}
