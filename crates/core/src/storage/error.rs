use thiserror::Error;

use crate::models::ValidationError;
use crate::store::PrimaryKey;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    /// A conditional write's precondition failed.
    #[error("{entity_type} conflict: {id}")]
    Conflict {
        entity_type: &'static str,
        id: String,
    },
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    /// A lookup expected to match exactly one item did not.
    #[error("{entity_type} integrity violation: {detail}")]
    Integrity {
        entity_type: &'static str,
        detail: String,
    },
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("{entity_type} repository has no secondary index configured")]
    IndexNotConfigured { entity_type: &'static str },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// A batch write was only partly applied. Nothing was rolled back.
    #[error("Batch write left {} requests unprocessed", unprocessed.len())]
    PartialBatch { unprocessed: Vec<PrimaryKey> },
}

impl RepositoryError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn conflict(entity_type: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::Conflict {
            entity_type,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_not_found_display() {
        let error = RepositoryError::not_found("Application", "APP#abc-123");
        assert_eq!(error.to_string(), "Application not found: APP#abc-123");
        assert!(error.is_not_found());
    }

    #[test]
    fn test_repository_error_conflict_display() {
        let error = RepositoryError::conflict("Application", "a@x.com");
        assert_eq!(error.to_string(), "Application conflict: a@x.com");
        assert!(error.is_conflict());
    }

    #[test]
    fn test_repository_error_from_validation() {
        let error: RepositoryError = ValidationError::MissingField("Name").into();
        assert_eq!(
            error.to_string(),
            "Validation failed: Missing required field: Name"
        );
    }

    #[test]
    fn test_repository_error_integrity_display() {
        let error = RepositoryError::Integrity {
            entity_type: "Application",
            detail: "2 applications share identity sub-1".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Application integrity violation: 2 applications share identity sub-1"
        );
    }

    #[test]
    fn test_repository_error_partial_batch_display() {
        let error = RepositoryError::PartialBatch {
            unprocessed: vec![
                PrimaryKey::new("APP#1", "Document-CV"),
                PrimaryKey::new("APP#1", "Document-Consent"),
            ],
        };
        assert_eq!(
            error.to_string(),
            "Batch write left 2 requests unprocessed"
        );
    }

    #[test]
    fn test_repository_error_index_not_configured_display() {
        let error = RepositoryError::IndexNotConfigured {
            entity_type: "Post",
        };
        assert_eq!(
            error.to_string(),
            "Post repository has no secondary index configured"
        );
    }
}
