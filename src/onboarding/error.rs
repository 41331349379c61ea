//! Onboarding error taxonomy

use crate::generator::GenerationError;
use crate::model::ExternalId;
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in onboarding operations
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("User not found: {0}")]
    NotFound(ExternalId),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to generate industry insights: {0}")]
    GenerationFailed(String),

    #[error("Storage failure: {0}")]
    StorageFailed(#[from] StorageError),
}

impl From<GenerationError> for OnboardingError {
    fn from(e: GenerationError) -> Self {
        Self::GenerationFailed(e.to_string())
    }
}

impl OnboardingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::GenerationFailed(_) => ErrorKind::GenerationFailed,
            Self::StorageFailed(_) => ErrorKind::StorageFailed,
        }
    }
}

/// Serializable tag callers match on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    InvalidInput,
    GenerationFailed,
    StorageFailed,
}

/// Result type for onboarding operations
pub type OnboardingResult<T> = Result<T, OnboardingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_errors_keep_their_message() {
        let err: OnboardingError = GenerationError::Failed("rate limited".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::GenerationFailed);
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn storage_errors_map_to_storage_failed() {
        let err: OnboardingError = StorageError::LockPoisoned.into();
        assert_eq!(err.kind(), ErrorKind::StorageFailed);
    }

    #[test]
    fn kind_serializes_as_plain_name() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, r#""NotFound""#);
    }
}
