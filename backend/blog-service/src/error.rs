/// Error types for Blog Service
///
/// Every failure a route can produce is one of the catalogued variants below.
/// Each carries an HTTP status, a human message and a machine code, and is
/// rendered as `{ status, message, code }` at the transport boundary.
use crate::db::StoreError;
use crate::validation::SchemaError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed input rejected before schema validation (bad JSON, bad path)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request failed its route schema
    #[error("{}", .0.message)]
    Validation(SchemaError),

    /// Caller does not own the comment
    #[error("forbidden access")]
    ForbiddenAccess,

    /// Caller does not own the post
    #[error("permission denied")]
    PermissionDenied,

    #[error("user not found")]
    UserNotFound,

    #[error("post not found")]
    PostNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("counter not found")]
    CounterNotFound,

    #[error("username has already been taken")]
    UsernameAlreadyTaken,

    #[error("phone number has already been taken")]
    PhoneNumberAlreadyTaken,

    /// Store unreachable or returned something unusable
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => "badRequest",
            AppError::ForbiddenAccess => "forbiddenAccess",
            AppError::PermissionDenied => "permissionDenied",
            AppError::UserNotFound => "userNotFound",
            AppError::PostNotFound => "postNotFound",
            AppError::CommentNotFound => "commentNotFound",
            AppError::CounterNotFound => "counterNotFound",
            AppError::UsernameAlreadyTaken => "usernameAlreadyTaken",
            AppError::PhoneNumberAlreadyTaken => "phoneNumberAlreadyTaken",
            AppError::Store(_) | AppError::Internal(_) => "internalError",
        }
    }

    /// Message sent to clients. Internal faults never expose their cause.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Store(_) | AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a ValidationErrors>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::ForbiddenAccess | AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::PostNotFound
            | AppError::CommentNotFound
            | AppError::CounterNotFound => StatusCode::NOT_FOUND,
            AppError::UsernameAlreadyTaken | AppError::PhoneNumberAlreadyTaken => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, debug = ?self, "request failed with internal error");
        }

        let errors = match self {
            AppError::Validation(schema_error) => Some(&schema_error.errors),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorBody {
            status: status.as_u16(),
            message: self.public_message(),
            code: self.code(),
            errors,
        })
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Validation(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
