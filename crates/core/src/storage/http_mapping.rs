//! Pure functions for mapping repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404 (Not Found)
/// - `Conflict` -> 409 (Conflict)
/// - `Validation` -> 400 (Bad Request)
/// - `StoreUnavailable` -> 503 (Service Unavailable)
/// - everything else -> 500 (Internal Server Error)
///
/// # Examples
///
/// ```
/// use applyhub_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "Application",
///     id: "APP#abc-123".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::Conflict { .. } => 409,
        RepositoryError::Validation(_) => 400,
        RepositoryError::Integrity { .. } => 500,
        RepositoryError::StoreUnavailable(_) => 503,
        RepositoryError::IndexNotConfigured { .. } => 500,
        RepositoryError::InvalidData(_) => 500,
        RepositoryError::PartialBatch { .. } => 500,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValidationError;

    #[test]
    fn test_not_found_maps_to_404() {
        let error = RepositoryError::not_found("Document", "APP#1/Document-CV");
        assert_eq!(repository_error_to_status_code(&error), 404);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let error = RepositoryError::conflict("Application", "a@x.com");
        assert_eq!(repository_error_to_status_code(&error), 409);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let error = RepositoryError::Validation(ValidationError::InvalidEmail("x".to_string()));
        assert_eq!(repository_error_to_status_code(&error), 400);
    }

    #[test]
    fn test_store_unavailable_maps_to_503() {
        let error = RepositoryError::StoreUnavailable("throughput exceeded".to_string());
        assert_eq!(repository_error_to_status_code(&error), 503);
    }

    #[test]
    fn test_integrity_maps_to_500() {
        let error = RepositoryError::Integrity {
            entity_type: "Application",
            detail: "duplicate identity".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&error), 500);
    }

    #[test]
    fn test_partial_batch_maps_to_500() {
        let error = RepositoryError::PartialBatch {
            unprocessed: Vec::new(),
        };
        assert_eq!(repository_error_to_status_code(&error), 500);
    }
}
