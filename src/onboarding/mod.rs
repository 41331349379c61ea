//! Profile onboarding: the lookup-or-create-then-update flow

mod coordinator;
mod error;

pub use coordinator::{ProfileUpdateCoordinator, ProfileUpdated};
pub use error::{ErrorKind, OnboardingError, OnboardingResult};
