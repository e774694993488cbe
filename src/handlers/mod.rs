//! HTTP route handlers:
//! - `snippets`: browse and create snippets
//! - `users`: signup, login, logout
//! - `health`: liveness probe
//!
//! Handlers extract what they need (state, session, form body), call the
//! data layer, and answer through the template cache; every error path
//! funnels through `AppError`.

pub mod health;
pub mod snippets;
pub mod users;

use crate::error::AppError;

/// Fallback for paths no route matched.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
