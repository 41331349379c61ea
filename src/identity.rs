//! Caller identity resolution
//!
//! Authentication happens elsewhere. A resolver only maps the opaque
//! credential a transport received to the identity-provider account it
//! belongs to.

use crate::model::ExternalId;
use crate::onboarding::{OnboardingError, OnboardingResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Opaque credential presented by a caller (session token, API key, ...)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Credentials never show up in logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Maps a credential to the caller's external identity.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Fails with `OnboardingError::Unauthorized` when the credential
    /// does not identify anyone.
    async fn resolve(&self, credential: &Credential) -> OnboardingResult<ExternalId>;
}

/// Treats the credential itself as the external id.
///
/// For trusted transports such as the local CLI, where whoever runs the
/// command already controls the database.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustedIdentity;

#[async_trait]
impl IdentityResolver for TrustedIdentity {
    async fn resolve(&self, credential: &Credential) -> OnboardingResult<ExternalId> {
        let id = credential.as_str().trim();
        if id.is_empty() {
            return Err(OnboardingError::Unauthorized);
        }
        Ok(ExternalId::new(id))
    }
}

/// Fixed token table (testing and embedding).
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, ExternalId>,
}

impl StaticTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(
        mut self,
        token: impl Into<String>,
        external_id: impl Into<ExternalId>,
    ) -> Self {
        self.tokens.insert(token.into(), external_id.into());
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticTokens {
    async fn resolve(&self, credential: &Credential) -> OnboardingResult<ExternalId> {
        self.tokens
            .get(credential.as_str())
            .cloned()
            .ok_or(OnboardingError::Unauthorized)
    }
}
