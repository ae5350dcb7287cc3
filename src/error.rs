//! Error types for Bibliotheca server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric codes returned alongside every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    StorageFailure = 2,
    NoSuchBook = 3,
    NoSuchLoan = 4,
    BookNotAvailable = 5,
    BookOnLoan = 6,
    LoanAlreadyReturned = 7,
    BadValue = 8,
    MalformedImport = 9,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {1}")]
    NotFound(NotFoundKind, String),

    /// A business rule refused the operation
    #[error("Conflict: {1}")]
    Conflict(ConflictKind, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// What kind of record a [`AppError::NotFound`] was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Book,
    Loan,
}

/// Which business rule a [`AppError::Conflict`] comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    BookOnLoan,
    BookNotAvailable,
    LoanAlreadyReturned,
    SequenceExhausted,
}

impl AppError {
    pub fn book_not_found(id: &str) -> Self {
        AppError::NotFound(NotFoundKind::Book, format!("Book {} not found", id))
    }

    pub fn loan_not_found(id: &str) -> Self {
        AppError::NotFound(NotFoundKind::Loan, format!("Loan {} not found", id))
    }

    pub fn conflict(kind: ConflictKind, message: impl Into<String>) -> Self {
        AppError::Conflict(kind, message.into())
    }

    /// Numeric code reported to clients
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => ErrorCode::BadValue,
            AppError::NotFound(NotFoundKind::Book, _) => ErrorCode::NoSuchBook,
            AppError::NotFound(NotFoundKind::Loan, _) => ErrorCode::NoSuchLoan,
            AppError::Conflict(ConflictKind::BookOnLoan, _) => ErrorCode::BookOnLoan,
            AppError::Conflict(ConflictKind::BookNotAvailable, _) => ErrorCode::BookNotAvailable,
            AppError::Conflict(ConflictKind::LoanAlreadyReturned, _) => {
                ErrorCode::LoanAlreadyReturned
            }
            AppError::Conflict(ConflictKind::SequenceExhausted, _) => ErrorCode::Failure,
            AppError::Parse(_) => ErrorCode::MalformedImport,
            AppError::Storage(_) => ErrorCode::StorageFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message) = match &self {
            AppError::Validation(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::NotFound(_, msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(_, msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Parse(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{} is invalid", field),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Parse(e.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
