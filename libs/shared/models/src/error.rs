use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, message);
        } else {
            tracing::debug!("Rejected: {}: {}", status, message);
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Outcome taxonomy shared by the availability, booking and patient operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("start time must be before end time")]
    InvalidRange,

    #[error("requested time is outside the available schedule")]
    OutsideAvailability,

    #[error("requested time conflicts with an existing appointment")]
    SlotConflict,

    #[error("availability window overlaps an existing window")]
    WindowOverlap,

    #[error("appointment is already cancelled")]
    AlreadyCancelled,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} still has appointments")]
    InUse(&'static str),

    /// Infrastructure failure. The detail is for logs only and never reaches clients.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<SchedulingError> for AppError {
    fn from(error: SchedulingError) -> Self {
        match error {
            SchedulingError::InvalidArgument(msg) => AppError::BadRequest(msg),
            SchedulingError::InvalidRange => AppError::BadRequest(error.to_string()),
            SchedulingError::OutsideAvailability => AppError::Unprocessable(error.to_string()),
            SchedulingError::SlotConflict
            | SchedulingError::WindowOverlap
            | SchedulingError::AlreadyCancelled
            | SchedulingError::InUse(_) => AppError::Conflict(error.to_string()),
            SchedulingError::NotFound(_) => AppError::NotFound(error.to_string()),
            SchedulingError::Storage(_) => AppError::Internal("internal server error".to_string()),
        }
    }
}
