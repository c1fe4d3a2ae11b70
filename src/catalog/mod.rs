//! Catalog data model
//!
//! - `page`: the JSON shape returned by the catalog API
//! - `item`: the record persisted into collection files, and bundled-item extraction

mod item;
mod page;

pub use item::{extract_bundled, BundledMap, Item, EXCLUDED_BUNDLE_TYPE};
pub use page::{BundledEntry, CatalogEntry, CatalogPage};
