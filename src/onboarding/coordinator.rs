//! ProfileUpdateCoordinator: updates a profile and makes sure its industry
//! has an insight, generating one on first use.
//!
//! The flow is read, generate, then transact:
//!
//! 1. look the insight up outside any transaction (saves the generator call
//!    on the common path, but is never trusted for correctness)
//! 2. on a miss, call the generator with no transaction open
//! 3. in one transaction, create-if-absent the insight and update the profile
//!
//! Concurrent callers racing on a new industry may each generate content;
//! the store's create-if-absent keeps exactly one record and every caller
//! gets that record back.

use super::error::{OnboardingError, OnboardingResult};
use crate::clock::{Clock, SystemClock};
use crate::generator::InsightGenerator;
use crate::model::{
    ExternalId, IndustryInsight, InsightWrite, NewInsight, OnboardingStatus, ProfileUpdate,
    UserProfile,
};
use crate::storage::{OnboardingStore, StorageError, StorageResult};
use std::sync::Arc;

/// Successful profile update: the committed profile and its industry's insight
#[derive(Debug, Clone)]
pub struct ProfileUpdated {
    pub profile: UserProfile,
    pub insight: IndustryInsight,
    /// True when this call created the insight
    pub insight_created: bool,
}

/// Orchestrates profile updates against an injected store and generator.
#[derive(Clone)]
pub struct ProfileUpdateCoordinator {
    store: Arc<dyn OnboardingStore>,
    generator: Arc<dyn InsightGenerator>,
    clock: Arc<dyn Clock>,
}

impl ProfileUpdateCoordinator {
    pub fn new(store: Arc<dyn OnboardingStore>, generator: Arc<dyn InsightGenerator>) -> Self {
        Self {
            store,
            generator,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply a profile update, creating the industry's insight if needed.
    ///
    /// Nothing is written unless both the insight (when new) and the profile
    /// commit together.
    pub async fn update_profile(
        &self,
        identity: &ExternalId,
        update: ProfileUpdate,
    ) -> OnboardingResult<ProfileUpdated> {
        let fields = update.validate().map_err(OnboardingError::InvalidInput)?;
        let profile = self.load_profile(identity).await?;

        let industry = fields.industry.clone();
        let cached = self
            .with_store(move |store| store.find_insight(&industry))
            .await?;

        let generated = match cached {
            Some(_) => None,
            None => {
                tracing::debug!(industry = %fields.industry, "no insight stored; generating");
                Some(self.generator.generate(&fields.industry).await?)
            }
        };

        let generated_here = generated.is_some();
        let now = self.clock.now();
        let user_id = profile.id;
        let (profile, write) = self
            .with_store(move |store| {
                let mut tx = store.begin()?;

                let write = match generated {
                    Some(content) => tx.create_insight_if_absent(NewInsight::new(
                        fields.industry.clone(),
                        content,
                        now,
                    ))?,
                    None => {
                        let insight = tx.find_insight(&fields.industry)?.ok_or_else(|| {
                            StorageError::InsightNotFound(fields.industry.clone())
                        })?;
                        InsightWrite {
                            insight,
                            created: false,
                        }
                    }
                };

                let profile = tx.update_profile(&user_id, &fields, now)?;
                tx.commit()?;
                Ok((profile, write))
            })
            .await?;

        if write.created {
            tracing::info!(industry = %write.insight.industry, "created industry insight");
        } else if generated_here {
            tracing::debug!(
                industry = %write.insight.industry,
                "another writer created the insight first; discarding generated content"
            );
        }

        Ok(ProfileUpdated {
            profile,
            insight: write.insight,
            insight_created: write.created,
        })
    }

    /// Whether the profile has chosen an industry. Read-only.
    pub async fn onboarding_status(
        &self,
        identity: &ExternalId,
    ) -> OnboardingResult<OnboardingStatus> {
        let profile = self.load_profile(identity).await?;
        Ok(OnboardingStatus {
            is_onboarded: profile.is_onboarded(),
        })
    }

    async fn load_profile(&self, identity: &ExternalId) -> OnboardingResult<UserProfile> {
        let external_id = identity.clone();
        self.with_store(move |store| store.find_profile(&external_id))
            .await?
            .ok_or_else(|| OnboardingError::NotFound(identity.clone()))
    }

    /// Run blocking store work off the async workers.
    ///
    /// The closure runs to completion even if the awaiting future is
    /// dropped, so a started transaction either commits or rolls back.
    async fn with_store<T, F>(&self, f: F) -> OnboardingResult<T>
    where
        F: FnOnce(&dyn OnboardingStore) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?;
        Ok(result?)
    }
}
