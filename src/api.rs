//! Transport-independent API layer.
//!
//! `OnboardingApi` is the single entry point for caller-facing operations.
//! Transports (the CLI, an HTTP handler, direct embedding) hand it the raw
//! credential they received; it resolves the caller and drives the
//! coordinator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identity::{Credential, IdentityResolver};
use crate::model::{IndustryInsight, OnboardingStatus, ProfileUpdate, UserProfile};
use crate::onboarding::{ErrorKind, OnboardingError, OnboardingResult, ProfileUpdateCoordinator};

/// Response of `update_user`, shaped for direct serialization.
///
/// Success: `{"success": true, "profile": .., "insight": ..}`.
/// Failure: `{"success": false, "errorKind": .., "message": ..}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight: Option<IndustryInsight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UpdateUserResponse {
    fn ok(profile: UserProfile, insight: IndustryInsight) -> Self {
        Self {
            success: true,
            profile: Some(profile),
            insight: Some(insight),
            error_kind: None,
            message: None,
        }
    }

    fn failed(error: &OnboardingError) -> Self {
        let message = match error {
            OnboardingError::Unauthorized => "Unauthorized".to_string(),
            OnboardingError::NotFound(_) => "User not found".to_string(),
            other => format!("Failed to update profile: {}", other),
        };
        Self {
            success: false,
            profile: None,
            insight: None,
            error_kind: Some(error.kind()),
            message: Some(message),
        }
    }
}

/// Single entry point for all caller-facing operations.
#[derive(Clone)]
pub struct OnboardingApi {
    resolver: Arc<dyn IdentityResolver>,
    coordinator: ProfileUpdateCoordinator,
}

impl OnboardingApi {
    pub fn new(resolver: Arc<dyn IdentityResolver>, coordinator: ProfileUpdateCoordinator) -> Self {
        Self {
            resolver,
            coordinator,
        }
    }

    /// Update the caller's profile.
    ///
    /// Never fails outright: every error is reported in the response.
    pub async fn update_user(
        &self,
        credential: &Credential,
        update: ProfileUpdate,
    ) -> UpdateUserResponse {
        let outcome = async {
            let identity = self.resolver.resolve(credential).await?;
            self.coordinator.update_profile(&identity, update).await
        }
        .await;

        match outcome {
            Ok(updated) => {
                tracing::info!(
                    external_id = %updated.profile.external_id,
                    industry = %updated.insight.industry,
                    created = updated.insight_created,
                    "profile updated"
                );
                UpdateUserResponse::ok(updated.profile, updated.insight)
            }
            Err(e @ (OnboardingError::Unauthorized | OnboardingError::NotFound(_))) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "profile update rejected");
                UpdateUserResponse::failed(&e)
            }
            Err(e) => {
                tracing::error!(kind = ?e.kind(), error = %e, "error updating profile");
                UpdateUserResponse::failed(&e)
            }
        }
    }

    /// Whether the caller has completed onboarding.
    ///
    /// Unlike `update_user`, failures propagate: nothing is at stake.
    pub async fn onboarding_status(
        &self,
        credential: &Credential,
    ) -> OnboardingResult<OnboardingStatus> {
        let identity = self.resolver.resolve(credential).await?;
        self.coordinator
            .onboarding_status(&identity)
            .await
            .map_err(|e| {
                if matches!(e, OnboardingError::StorageFailed(_)) {
                    tracing::error!(error = %e, "error checking onboarding status");
                }
                e
            })
    }
}
