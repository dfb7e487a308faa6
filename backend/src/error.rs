//! Error taxonomy shared by every request path.
//!
//! Each variant maps to one HTTP status and a stable `kind` string; the JSON body is a
//! `common::model::error::ErrorBody`. Nothing here is retried: an error ends the request
//! that produced it and nothing else.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use common::model::error::ErrorBody;
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Only CSV files are allowed: {0}")]
    InvalidFileType(String),

    #[error("Unreadable CSV content: {0}")]
    UnreadableContent(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid pagination parameters: {0}")]
    InvalidPaginationParameters(String),

    #[error("Invalid credentials. Username and password are case-sensitive.")]
    AuthenticationFailed,

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Database error: {0}")]
    UnknownDatabaseError(String),
}

impl ApiError {
    /// Machine-readable name sent in the `kind` field of the error body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidFileType(_) => "InvalidFileType",
            ApiError::UnreadableContent(_) => "UnreadableContent",
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::InvalidPaginationParameters(_) => "InvalidPaginationParameters",
            ApiError::AuthenticationFailed => "AuthenticationFailed",
            ApiError::PayloadTooLarge { .. } => "PayloadTooLarge",
            ApiError::ConstraintViolation(_) => "ConstraintViolation",
            ApiError::ConnectionUnavailable(_) => "ConnectionUnavailable",
            ApiError::UnknownDatabaseError(_) => "UnknownDatabaseError",
        }
    }

    /// Prefixes the error detail with where it happened, keeping the variant.
    pub fn context(self, what: impl std::fmt::Display) -> Self {
        match self {
            ApiError::UnreadableContent(m) => ApiError::UnreadableContent(format!("{what}: {m}")),
            ApiError::ConstraintViolation(m) => {
                ApiError::ConstraintViolation(format!("{what}: {m}"))
            }
            ApiError::ConnectionUnavailable(m) => {
                ApiError::ConnectionUnavailable(format!("{what}: {m}"))
            }
            ApiError::UnknownDatabaseError(m) => {
                ApiError::UnknownDatabaseError(format!("{what}: {m}"))
            }
            other => other,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidFileType(_)
            | ApiError::UnreadableContent(_)
            | ApiError::InvalidRequest(_)
            | ApiError::InvalidPaginationParameters(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ConstraintViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UnknownDatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ConnectionUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self, ApiError::AuthenticationFailed) {
            builder.insert_header((header::WWW_AUTHENTICATE, r#"Basic realm="csv-upload""#));
        }
        builder.json(ErrorBody {
            kind: self.kind().to_string(),
            message: self.to_string(),
        })
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => ApiError::ConstraintViolation(err.to_string()),
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::NotADatabase
                | ErrorCode::PermissionDenied
                | ErrorCode::SystemIoFailure
                | ErrorCode::DatabaseCorrupt,
            ) => ApiError::ConnectionUnavailable(err.to_string()),
            _ => ApiError::UnknownDatabaseError(err.to_string()),
        }
    }
}

impl From<csv::Error> for ApiError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line());
        let detail = match err.kind() {
            csv::ErrorKind::Utf8 { .. } => "content is not valid UTF-8".to_string(),
            csv::ErrorKind::UnequalLengths {
                expected_len, len, ..
            } => format!("expected {expected_len} fields, found {len}"),
            _ => err.to_string(),
        };
        match line {
            Some(line) => ApiError::UnreadableContent(format!("line {line}: {detail}")),
            None => ApiError::UnreadableContent(detail),
        }
    }
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        ApiError::InvalidRequest(format!("malformed multipart body: {err}"))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::UnknownDatabaseError(format!("database task failed: {err}"))
    }
}
