//! Wire types for one page of a catalog search response
//!
//! Every field the API may omit is an `Option`; nothing here is validated
//! beyond what serde needs to read the shape.

use serde::Deserialize;

/// One page returned by the catalog API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    #[serde(default)]
    pub data: Option<Vec<CatalogEntry>>,

    #[serde(default)]
    pub next_page_cursor: Option<String>,
}

impl CatalogPage {
    /// Entries on this page, empty when `data` is missing or null
    pub fn entries(&self) -> &[CatalogEntry] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// The cursor for the following page, if there is one
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_page_cursor
            .as_deref()
            .filter(|cursor| !cursor.is_empty())
    }
}

/// A single catalog entry as sent by the API
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub creator_name: Option<String>,

    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub created: Option<String>,

    #[serde(default)]
    pub bundled_items: Option<Vec<BundledEntry>>,
}

/// A component of a composite catalog entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BundledEntry {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(rename = "type", default)]
    pub item_type: Option<String>,
}
