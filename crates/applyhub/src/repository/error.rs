use applyhub_core::storage::RepositoryError;
use applyhub_core::store::StoreError;

/// Converts a store failure for an operation whose condition guards against a
/// duplicate: a failed condition becomes a conflict on `id`.
pub(crate) fn conflict_on_condition(
    entity_type: &'static str,
    id: &str,
    err: StoreError,
) -> RepositoryError {
    if err.is_condition_failure() {
        return RepositoryError::conflict(entity_type, id);
    }
    store_error(err)
}

/// Converts a store failure for an operation whose condition requires the
/// target to exist: a failed condition becomes not-found on `id`.
pub(crate) fn not_found_on_condition(
    entity_type: &'static str,
    id: &str,
    err: StoreError,
) -> RepositoryError {
    if err.is_condition_failure() {
        return RepositoryError::not_found(entity_type, id);
    }
    store_error(err)
}

/// Converts a store failure that carries no entity-level meaning.
pub(crate) fn store_error(err: StoreError) -> RepositoryError {
    match err {
        StoreError::Unavailable(message) => RepositoryError::StoreUnavailable(message),
        StoreError::Validation(message) | StoreError::Serialization(message) => {
            RepositoryError::InvalidData(message)
        }
        err @ (StoreError::ConditionFailed | StoreError::TransactionCanceled { .. }) => {
            RepositoryError::StoreUnavailable(err.to_string())
        }
    }
}
