//! Core data structures: user profiles and industry insights

mod insight;
mod profile;

pub use insight::{
    refresh_interval, IndustryInsight, InsightContent, InsightId, InsightWrite, NewInsight,
    REFRESH_INTERVAL_SECS,
};
pub use profile::{
    ExternalId, OnboardingStatus, ProfileFields, ProfileUpdate, UserId, UserProfile,
};
