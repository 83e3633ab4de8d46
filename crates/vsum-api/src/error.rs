//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use vsum_dynamo::StoreError;
use vsum_models::{JobMetadata, JobState, LifecycleStatus};
use vsum_pipeline::PipelineError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Summary already in progress")]
    InFlight(Box<JobState>),

    #[error("Summary did not finish in time")]
    Timeout,

    #[error("{0}")]
    Pipeline(PipelineError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InFlight(_) => StatusCode::CONFLICT,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Pipeline(e) => pipeline_status(e),
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Upstream collaborator failures are 502; local failures are 500.
fn pipeline_status(error: &PipelineError) -> StatusCode {
    match error {
        PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PipelineError::AlreadyInFlight(_) => StatusCode::CONFLICT,
        PipelineError::MetadataUnavailable(_)
        | PipelineError::CaptionFetch(_)
        | PipelineError::Llm(_)
        | PipelineError::Summarize(_) => StatusCode::BAD_GATEWAY,
        PipelineError::CaptionUnavailable { .. }
        | PipelineError::Store(_)
        | PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            PipelineError::AlreadyInFlight(state) => ApiError::InFlight(state),
            other => ApiError::Pipeline(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

/// Body of a 409: the running job's progress.
#[derive(Serialize)]
struct InFlightResponse {
    status: LifecycleStatus,
    metadata: JobMetadata,
}

fn is_production() -> bool {
    std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            ApiError::InFlight(state) => {
                let body = InFlightResponse {
                    status: state.status,
                    metadata: state.metadata,
                };
                (status, Json(body)).into_response()
            }
            ApiError::Pipeline(_) | ApiError::Timeout => {
                // Don't expose internal error details in production
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR && is_production() {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                };
                (
                    status,
                    [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                    message,
                )
                    .into_response()
            }
            _ => {
                let detail = match &self {
                    ApiError::Store(_) | ApiError::Internal(_) if is_production() => {
                        "An internal error occurred".to_string()
                    }
                    _ => self.to_string(),
                };
                (status, Json(ErrorResponse { detail })).into_response()
            }
        }
    }
}
