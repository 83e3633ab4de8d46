//! Article store error types.

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// Result type for article store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during article store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Condition check failed: {0}")]
    ConditionFailed(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid item: {0}")]
    InvalidItem(String),
}

impl StoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn invalid_item(msg: impl Into<String>) -> Self {
        Self::InvalidItem(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Network(_) | StoreError::Throttled(_))
    }

    pub fn is_condition_failed(&self) -> bool {
        matches!(self, StoreError::ConditionFailed(_))
    }

    /// Short label used as the metrics status dimension.
    pub fn metric_label(&self) -> &'static str {
        match self {
            StoreError::Config(_) => "config",
            StoreError::Network(_) => "network",
            StoreError::Throttled(_) => "throttled",
            StoreError::ConditionFailed(_) => "condition_failed",
            StoreError::TableNotFound(_) => "table_not_found",
            StoreError::RequestFailed(_) => "error",
            StoreError::InvalidItem(_) => "invalid_item",
        }
    }

    /// Classify an SDK error from any DynamoDB operation.
    pub fn from_sdk<E, R>(operation: &str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug,
    {
        let message = format!("{}: {}", operation, DisplayErrorContext(&err));
        match &err {
            SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => Self::Network(message),
            SdkError::ResponseError(_) => Self::Network(message),
            _ => match err.code() {
                Some("ConditionalCheckFailedException") => Self::ConditionFailed(message),
                Some("ProvisionedThroughputExceededException")
                | Some("ThrottlingException")
                | Some("RequestLimitExceeded") => Self::Throttled(message),
                Some("ResourceNotFoundException") => Self::TableNotFound(message),
                Some("InternalServerError") | Some("ServiceUnavailable") => Self::Network(message),
                _ => Self::RequestFailed(message),
            },
        }
    }
}
