use thiserror::Error;

/// Why a single item of a transaction was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancellationReason {
    /// The item was fine; the transaction failed because of another item.
    None,
    /// The item's condition expression evaluated to false.
    ConditionalCheckFailed,
    /// Any other store-reported reason code.
    Other(String),
}

impl CancellationReason {
    pub fn is_condition_failure(&self) -> bool {
        matches!(self, CancellationReason::ConditionalCheckFailed)
    }
}

/// Errors surfaced by a key-value store backend.
///
/// The store never retries; every failure is handed back as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conditional check failed")]
    ConditionFailed,
    #[error("Transaction canceled: {reasons:?}")]
    TransactionCanceled { reasons: Vec<CancellationReason> },
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// True when the failure was caused by a condition expression, either on a
    /// single-item write or on any member of a transaction.
    pub fn is_condition_failure(&self) -> bool {
        match self {
            StoreError::ConditionFailed => true,
            StoreError::TransactionCanceled { reasons } => {
                reasons.iter().any(CancellationReason::is_condition_failure)
            }
            _ => false,
        }
    }

    /// Position of the first transaction member whose condition failed.
    pub fn failed_condition_index(&self) -> Option<usize> {
        match self {
            StoreError::TransactionCanceled { reasons } => {
                reasons.iter().position(CancellationReason::is_condition_failure)
            }
            _ => None,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
