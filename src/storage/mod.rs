//! Storage backends for careerlens
//!
//! The coordinator reaches storage only through the `OnboardingStore` trait.
//! The primary implementation is `SqliteStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    InsightStore, OnboardingStore, OpenStore, ProfileStore, StorageError, StorageResult,
    StoreTransaction,
};
