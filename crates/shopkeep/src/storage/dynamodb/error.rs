//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to [`TableError`], and table errors that carry no
//! domain meaning to `RepositoryError`.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::CancellationReason;
use shopkeep_core::storage::RepositoryError;

use super::table::TableError;

const THROUGHPUT_EXCEEDED: &str = "Throughput exceeded, please retry";
const REQUEST_LIMIT_EXCEEDED: &str = "Request limit exceeded, please retry";
const TABLE_NOT_FOUND: &str = "Table not found";
const INTERNAL_ERROR: &str = "DynamoDB internal server error";

/// Transport-level failures (no response from the service).
fn map_transport_error<E, R>(err: &SdkError<E, R>) -> Option<TableError> {
    match err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            Some(TableError::Unavailable(err.to_string()))
        }
        _ => None,
    }
}

/// Map a GetItem SDK error to TableError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> TableError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => {
            TableError::Unavailable(TABLE_NOT_FOUND.to_string())
        }
        GetItemError::ProvisionedThroughputExceededException(_) => {
            TableError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        GetItemError::RequestLimitExceeded(_) => {
            TableError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        GetItemError::InternalServerError(_) => TableError::Service(INTERNAL_ERROR.to_string()),
        err => TableError::Service(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to TableError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> TableError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => {
            TableError::Unavailable(TABLE_NOT_FOUND.to_string())
        }
        QueryError::ProvisionedThroughputExceededException(_) => {
            TableError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        QueryError::RequestLimitExceeded(_) => {
            TableError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        QueryError::InternalServerError(_) => TableError::Service(INTERNAL_ERROR.to_string()),
        err => TableError::Service(format!("Query failed: {:?}", err)),
    }
}

/// Map a Scan SDK error to TableError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(err: SdkError<ScanError, R>) -> TableError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => {
            TableError::Unavailable(TABLE_NOT_FOUND.to_string())
        }
        ScanError::ProvisionedThroughputExceededException(_) => {
            TableError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        ScanError::RequestLimitExceeded(_) => {
            TableError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        ScanError::InternalServerError(_) => TableError::Service(INTERNAL_ERROR.to_string()),
        err => TableError::Service(format!("Scan failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to TableError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> TableError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        PutItemError::ConditionalCheckFailedException(_) => {
            TableError::ConditionFailed { index: 0 }
        }
        PutItemError::TransactionConflictException(_) => TableError::TransactionConflict,
        PutItemError::ResourceNotFoundException(_) => {
            TableError::Unavailable(TABLE_NOT_FOUND.to_string())
        }
        PutItemError::ProvisionedThroughputExceededException(_) => {
            TableError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        PutItemError::RequestLimitExceeded(_) => {
            TableError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            TableError::InvalidRequest("Item collection size limit exceeded".to_string())
        }
        PutItemError::InternalServerError(_) => TableError::Service(INTERNAL_ERROR.to_string()),
        err => TableError::Service(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a TransactWriteItems SDK error to TableError.
///
/// A cancelled transaction reports one reason per operation, in request
/// order; the first conditional failure decides the result.
pub fn map_transact_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<TransactWriteItemsError, R>,
) -> TableError {
    if let Some(mapped) = map_transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        TransactWriteItemsError::TransactionCanceledException(cancelled) => {
            map_cancellation_reasons(cancelled.cancellation_reasons())
        }
        TransactWriteItemsError::TransactionInProgressException(_) => {
            TableError::TransactionConflict
        }
        TransactWriteItemsError::ResourceNotFoundException(_) => {
            TableError::Unavailable(TABLE_NOT_FOUND.to_string())
        }
        TransactWriteItemsError::ProvisionedThroughputExceededException(_) => {
            TableError::Throttled(THROUGHPUT_EXCEEDED.to_string())
        }
        TransactWriteItemsError::RequestLimitExceeded(_) => {
            TableError::Throttled(REQUEST_LIMIT_EXCEEDED.to_string())
        }
        TransactWriteItemsError::InternalServerError(_) => {
            TableError::Service(INTERNAL_ERROR.to_string())
        }
        err => TableError::Service(format!("TransactWriteItems failed: {:?}", err)),
    }
}

/// Pick the failing operation out of a cancelled transaction.
pub fn map_cancellation_reasons(reasons: &[CancellationReason]) -> TableError {
    let codes: Vec<Option<&str>> = reasons.iter().map(CancellationReason::code).collect();
    map_cancellation_codes(&codes)
}

fn map_cancellation_codes(codes: &[Option<&str>]) -> TableError {
    if let Some(index) = codes
        .iter()
        .position(|code| *code == Some("ConditionalCheckFailed"))
    {
        return TableError::ConditionFailed { index };
    }
    if codes.contains(&Some("TransactionConflict")) {
        return TableError::TransactionConflict;
    }
    if codes
        .iter()
        .any(|code| matches!(code, Some("ThrottlingError" | "ProvisionedThroughputExceeded")))
    {
        return TableError::Throttled(THROUGHPUT_EXCEEDED.to_string());
    }
    TableError::Service(format!("Transaction cancelled: {:?}", codes))
}

/// Map a table error that the calling operation did not handle itself.
pub fn map_table_error(err: TableError) -> RepositoryError {
    match err {
        TableError::ConditionFailed { index } => {
            RepositoryError::Conflict(format!("Condition failed for operation {index}"))
        }
        TableError::TransactionConflict => {
            RepositoryError::Conflict("Concurrent modification, please retry".to_string())
        }
        TableError::Throttled(msg) | TableError::Unavailable(msg) => {
            RepositoryError::ConnectionFailed(msg)
        }
        TableError::InvalidRequest(msg) | TableError::Service(msg) => {
            RepositoryError::QueryFailed(msg)
        }
    }
}
