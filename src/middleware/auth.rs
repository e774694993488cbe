use axum::{
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::session;

/// Route-scoped gate for authenticated-only pages.
///
/// Without an authenticated user id in the session the wrapped handler is
/// never invoked; the visitor is bounced to the login page instead.
/// Responses that did pass the gate are marked `no-store` so pages tied to
/// a login cannot come back out of a shared cache.
pub async fn require_auth(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if session::authenticated_user(&session).await?.is_none() {
        return Ok(Redirect::to("/user/login").into_response());
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
