//! User profile records and the fields an update may change

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Internal identifier of a user profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new random UserId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to the identity provider's account for a user.
///
/// Unique across profiles: at most one profile exists per external id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExternalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ExternalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A stored user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub external_id: ExternalId,
    /// Industry key; references an `IndustryInsight` by value
    pub industry: Option<String>,
    /// Years of experience
    pub experience: Option<u32>,
    pub bio: Option<String>,
    pub skills: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// A freshly provisioned profile with no onboarding data
    pub fn new(external_id: ExternalId, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            external_id,
            industry: None,
            experience: None,
            bio: None,
            skills: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// True once an industry has been chosen.
    pub fn is_onboarded(&self) -> bool {
        self.industry.as_deref().is_some_and(|i| !i.is_empty())
    }
}

/// Raw profile update as submitted by a caller (unvalidated).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub industry: String,
    pub experience: u32,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl ProfileUpdate {
    pub fn new(industry: impl Into<String>, experience: u32) -> Self {
        Self {
            industry: industry.into(),
            experience,
            ..Default::default()
        }
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    /// Normalize and check the update.
    ///
    /// Strings are trimmed, blank skills dropped and a blank bio cleared.
    /// Returns a description of the problem when the industry is empty.
    pub fn validate(self) -> Result<ProfileFields, String> {
        let industry = self.industry.trim().to_string();
        if industry.is_empty() {
            return Err("industry must not be empty".to_string());
        }

        let bio = self
            .bio
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty());

        let skills = self
            .skills
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(ProfileFields {
            industry,
            experience: self.experience,
            bio,
            skills,
        })
    }
}

/// Validated mutable fields of a profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub industry: String,
    pub experience: u32,
    pub bio: Option<String>,
    pub skills: BTreeSet<String>,
}

/// Result of an onboarding status check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStatus {
    pub is_onboarded: bool,
}
