//! Storage module for persisting collections
//!
//! This module handles everything that touches destination files:
//! - The blob storage seam and its filesystem backend
//! - Loading the items already recorded in a destination file
//! - Merging newly discovered items and overwriting the file

mod collection;
mod fs;
mod traits;

pub use collection::{
    load_existing, merge_and_save, merge_items, parse_collection, save_collection, Collection,
    ExistingSet, StoredCollection,
};
pub use fs::FsStorage;
pub use traits::{Storage, StorageError, StorageResult};
