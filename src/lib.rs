//! careerlens: profile onboarding with lazily generated industry insights
//!
//! Updates a user's profile and makes sure the chosen industry has an
//! insight record, generating it on first use. The insight write and the
//! profile write commit in one transaction; the (slow) generator runs
//! before that transaction opens.
//!
//! # Core Concepts
//!
//! - **Profiles**: one per identity-provider account, holding industry, experience, bio and skills
//! - **Insights**: one immutable record per industry, refreshed (elsewhere) after 7 days
//! - **Coordinator**: the read, generate, then transact flow that keeps the two consistent
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use careerlens::{MockGenerator, OpenStore, ProfileUpdateCoordinator, SqliteStore};
//!
//! let store = Arc::new(SqliteStore::open_in_memory().unwrap());
//! let coordinator = ProfileUpdateCoordinator::new(store, Arc::new(MockGenerator::new()));
//! // Coordinator is ready for use
//! ```

pub mod api;
pub mod clock;
pub mod generator;
pub mod identity;
mod model;
pub mod onboarding;
pub mod storage;

pub use api::{OnboardingApi, UpdateUserResponse};
pub use clock::{Clock, ManualClock, SystemClock};
pub use generator::{
    CommandGenerator, DisabledGenerator, GenerationError, InsightGenerator, MockGenerator,
};
pub use identity::{Credential, IdentityResolver, StaticTokens, TrustedIdentity};
pub use model::{
    refresh_interval, ExternalId, IndustryInsight, InsightContent, InsightId, InsightWrite,
    NewInsight, OnboardingStatus, ProfileFields, ProfileUpdate, UserId, UserProfile,
    REFRESH_INTERVAL_SECS,
};
pub use onboarding::{
    ErrorKind, OnboardingError, OnboardingResult, ProfileUpdateCoordinator, ProfileUpdated,
};
pub use storage::{
    InsightStore, OnboardingStore, OpenStore, ProfileStore, SqliteStore, StorageError,
    StorageResult, StoreTransaction,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
