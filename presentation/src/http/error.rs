//! Mapping from [`DomainError`] to HTTP responses and channel error codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::warn;
use vibecation_domain::{ChannelErrorCode, DomainError};

/// JSON error body: `{ "error": "<code>", "message": "...", "retryable": bool }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub retryable: bool,
}

/// Error returned by every REST handler
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            DomainError::Conflict(_)
            | DomainError::PhaseClosed { .. }
            | DomainError::AlreadySubmitted { .. } => StatusCode::CONFLICT,
            DomainError::Invalid(_) => StatusCode::BAD_REQUEST,
            DomainError::DownstreamFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match &self.0 {
            DomainError::NotFound(_) => "not_found",
            DomainError::Unauthorized { .. } => "unauthorized",
            DomainError::Conflict(_) => "conflict",
            DomainError::PhaseClosed { .. } => "phase_closed",
            DomainError::AlreadySubmitted { .. } => "already_submitted",
            DomainError::Invalid(_) => "invalid",
            DomainError::DownstreamFailure(_) => "downstream_failure",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        let body = ErrorBody {
            error: self.code(),
            message: self.0.to_string(),
            retryable: self.0.is_retryable(),
        };
        (status, Json(body)).into_response()
    }
}

/// Error code reported on the live channel for a failed operation
pub fn channel_code(err: &DomainError) -> ChannelErrorCode {
    match err {
        DomainError::Unauthorized { .. } => ChannelErrorCode::Unauthorized,
        DomainError::NotFound(_) => ChannelErrorCode::NotFound,
        DomainError::Invalid(_) => ChannelErrorCode::InvalidFrame,
        _ => ChannelErrorCode::Internal,
    }
}
