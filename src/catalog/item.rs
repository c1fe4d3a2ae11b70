//! Persisted catalog items and bundled-item extraction

use crate::catalog::page::{BundledEntry, CatalogEntry};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Bundled entries of this type are left out of the bundled map
pub const EXCLUDED_BUNDLE_TYPE: &str = "UserOutfit";

/// Position (1-based) of a bundled sub-item mapped to the ids found there
///
/// Keys are persisted as JSON strings ("1", "2", ...) and kept in numeric order.
pub type BundledMap = BTreeMap<u32, Vec<i64>>;

/// A catalog item as recorded in a collection file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundled_items: Option<BundledMap>,
}

impl Item {
    /// Creates an item with only the required fields set
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            creator: None,
            price: None,
            created: None,
            bundled_items: None,
        }
    }

    /// Builds an item from a catalog entry
    ///
    /// Returns `None` when the entry carries no id. The bundled map is only
    /// attached when at least one sub-item survived extraction.
    pub fn from_entry(entry: &CatalogEntry) -> Option<Self> {
        let id = entry.id?;

        let bundled_items = entry
            .bundled_items
            .as_deref()
            .map(extract_bundled)
            .filter(|map| !map.is_empty());

        Some(Self {
            id,
            name: entry.name.clone().unwrap_or_default(),
            creator: entry.creator_name.clone(),
            price: entry.price,
            created: entry.created.clone(),
            bundled_items,
        })
    }
}

/// Older files hold `"name": null` for entries the API sent without a name
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Maps bundled sub-items to their 1-based positions
///
/// Every sub-entry consumes a position, including excluded ones, so a
/// skipped outfit leaves a gap in the keys.
pub fn extract_bundled(entries: &[BundledEntry]) -> BundledMap {
    let mut map = BundledMap::new();

    for (index, entry) in entries.iter().enumerate() {
        if entry.item_type.as_deref() == Some(EXCLUDED_BUNDLE_TYPE) {
            continue;
        }

        if let Some(id) = entry.id {
            map.entry(index as u32 + 1).or_default().push(id);
        }
    }

    map
}
