//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `applyhub_core::store`. Condition
//! failures keep their identity; every infrastructure failure becomes
//! `Unavailable`. Nothing is retried here.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{BuildError, SdkError};
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use applyhub_core::store::{CancellationReason, StoreError};

fn throughput_exceeded() -> StoreError {
    StoreError::Unavailable("Throughput exceeded".to_string())
}

fn request_limit_exceeded() -> StoreError {
    StoreError::Unavailable("Request limit exceeded".to_string())
}

fn internal_server_error() -> StoreError {
    StoreError::Unavailable("DynamoDB internal server error".to_string())
}

fn table_not_found() -> StoreError {
    StoreError::Unavailable("Table not found".to_string())
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => table_not_found(),
        GetItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        GetItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        GetItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::Unavailable(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        PutItemError::ResourceNotFoundException(_) => table_not_found(),
        PutItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        PutItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::Unavailable("Item collection size limit exceeded".to_string())
        }
        PutItemError::TransactionConflictException(_) => {
            StoreError::Unavailable("Transaction conflict".to_string())
        }
        PutItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::Unavailable(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        DeleteItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        DeleteItemError::ResourceNotFoundException(_) => table_not_found(),
        DeleteItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        DeleteItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        DeleteItemError::TransactionConflictException(_) => {
            StoreError::Unavailable("Transaction conflict".to_string())
        }
        DeleteItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::Unavailable(format!("DeleteItem failed: {:?}", err)),
    }
}

/// Map an UpdateItem SDK error to StoreError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        UpdateItemError::ConditionalCheckFailedException(_) => StoreError::ConditionFailed,
        UpdateItemError::ResourceNotFoundException(_) => table_not_found(),
        UpdateItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        UpdateItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        UpdateItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::Unavailable("Item collection size limit exceeded".to_string())
        }
        UpdateItemError::TransactionConflictException(_) => {
            StoreError::Unavailable("Transaction conflict".to_string())
        }
        UpdateItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::Unavailable(format!("UpdateItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> StoreError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => table_not_found(),
        QueryError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        QueryError::RequestLimitExceeded(_) => request_limit_exceeded(),
        QueryError::InternalServerError(_) => internal_server_error(),
        err => StoreError::Unavailable(format!("Query failed: {:?}", err)),
    }
}

/// Map a BatchWriteItem SDK error to StoreError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(_) => table_not_found(),
        BatchWriteItemError::ProvisionedThroughputExceededException(_) => throughput_exceeded(),
        BatchWriteItemError::RequestLimitExceeded(_) => request_limit_exceeded(),
        BatchWriteItemError::ItemCollectionSizeLimitExceededException(_) => {
            StoreError::Unavailable("Item collection size limit exceeded".to_string())
        }
        BatchWriteItemError::InternalServerError(_) => internal_server_error(),
        err => StoreError::Unavailable(format!("BatchWriteItem failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error to StoreError.
///
/// A canceled transaction keeps its per-item reasons so callers can tell which
/// member's condition failed.
pub fn map_transact_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
) -> StoreError {
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(canceled) => {
            let reasons = canceled
                .cancellation_reasons()
                .iter()
                .map(|reason| parse_cancellation_code(reason.code()))
                .collect();
            StoreError::TransactionCanceled { reasons }
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            StoreError::Unavailable("Transaction in progress".to_string())
        }
        TransactWriteItemsError::ResourceNotFoundException(_) => table_not_found(),
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            throughput_exceeded()
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => request_limit_exceeded(),
        TransactWriteItemsError::InternalServerError(_) => internal_server_error(),
        err => StoreError::Unavailable(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Map a request builder error (a missing required field) to StoreError.
pub fn map_build_error(err: BuildError) -> StoreError {
    StoreError::Validation(format!("Failed to build request: {err}"))
}

/// Parse the reason code DynamoDB reports for one transaction member.
pub fn parse_cancellation_code(code: Option<&str>) -> CancellationReason {
    match code {
        None | Some("None") => CancellationReason::None,
        Some("ConditionalCheckFailed") => CancellationReason::ConditionalCheckFailed,
        Some(other) => CancellationReason::Other(other.to_string()),
    }
}
