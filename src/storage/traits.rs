//! Storage trait definitions

use crate::model::{
    ExternalId, IndustryInsight, InsightWrite, NewInsight, ProfileFields, UserId, UserProfile,
};
use chrono::{DateTime, Utc};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Insight not found for industry: {0}")]
    InsightNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Connection lock poisoned")]
    LockPoisoned,

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Keyed storage of industry insights
pub trait InsightStore: Send + Sync {
    /// Load the insight for an industry, if one exists
    fn find_insight(&self, industry: &str) -> StorageResult<Option<IndustryInsight>>;

    /// All insights, ordered by industry
    fn list_insights(&self) -> StorageResult<Vec<IndustryInsight>>;
}

/// Storage of user profiles
pub trait ProfileStore: Send + Sync {
    /// Load the profile linked to an external identity
    fn find_profile(&self, external_id: &ExternalId) -> StorageResult<Option<UserProfile>>;

    /// Provision a profile for an external identity.
    ///
    /// Idempotent: returns the existing profile if one is already linked.
    fn ensure_profile(
        &self,
        external_id: &ExternalId,
        now: DateTime<Utc>,
    ) -> StorageResult<UserProfile>;
}

/// A store whose insight and profile writes share one transaction.
///
/// Implementations must be thread-safe (Send + Sync) to support
/// concurrent access from multiple threads.
pub trait OnboardingStore: InsightStore + ProfileStore {
    /// Open a transaction scope.
    ///
    /// Dropping the returned scope without calling `commit` rolls back
    /// every write made through it.
    fn begin(&self) -> StorageResult<Box<dyn StoreTransaction + '_>>;
}

/// Writes that commit or roll back together
pub trait StoreTransaction {
    /// Read an insight with the transaction's view of the store
    fn find_insight(&mut self, industry: &str) -> StorageResult<Option<IndustryInsight>>;

    /// Insert the insight unless one exists for its industry.
    ///
    /// Atomic under races: returns whichever record ends up stored,
    /// flagging whether it was this write.
    fn create_insight_if_absent(&mut self, insight: NewInsight) -> StorageResult<InsightWrite>;

    /// Overwrite a profile's mutable fields and return the updated row
    fn update_profile(
        &mut self,
        user_id: &UserId,
        fields: &ProfileFields,
        now: DateTime<Utc>,
    ) -> StorageResult<UserProfile>;

    /// Make all writes durable and visible
    fn commit(self: Box<Self>) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: OnboardingStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
