//! Application error type and its mapping onto HTTP responses.
//!
//! Handlers return `AppResult<T>`; every error that escapes a handler is
//! converted here. Server-side detail is logged, the client only ever sees
//! the bare status text. Validation failures are not errors: handlers
//! re-render the form with status 422 themselves.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Database errors (SQLx library errors).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Template rendering failed after the cache was built.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Session store read/write failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Password hashing or verification machinery failed. Distinct from a
    /// wrong password, which is `InvalidCredentials`.
    #[error("password hash error: {0}")]
    PasswordHash(argon2::password_hash::Error),

    /// A record that was asked for does not exist (unknown snippet id,
    /// unknown route). Carries no internal detail.
    #[error("not found")]
    NotFound,

    /// The client sent something malformed: unreadable form body, a value
    /// that does not convert to the target field type, a failed CSRF
    /// check. The detail string is logged, never echoed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Signup with an email address that is already registered. Matched by
    /// the signup handler and turned into a field error.
    #[error("duplicate email")]
    DuplicateEmail,

    /// Email/password pair did not authenticate. Matched by the login
    /// handler and turned into a non-field error.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(detail) => {
                tracing::warn!(%detail, "rejected client request");
                StatusCode::BAD_REQUEST
            }
            // These two are normally consumed by the signup/login handlers;
            // if one leaks this far it is still a client-side outcome.
            AppError::DuplicateEmail | AppError::InvalidCredentials => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Database(_)
            | AppError::Template(_)
            | AppError::Session(_)
            | AppError::PasswordHash(_)
            | AppError::Internal(_) => {
                tracing::error!(error = %self, "server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let reason = status.canonical_reason().unwrap_or("Error");
        (status, reason.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
