use std::collections::HashMap;

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::session;

/// Form bodies larger than this are rejected outright.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Rejects state-changing submissions that do not carry the session's
/// CSRF token in a `csrf_token` form field.
///
/// The body is buffered here so the token can be read, then handed to the
/// inner handler unchanged; a missing or mismatched token is a client
/// error and the handler never runs. Reads pass through untouched.
pub async fn verify_csrf(
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !matches!(
        *request.method(),
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|err| AppError::BadRequest(format!("reading form body: {err}")))?;
    let fields: HashMap<String, String> = serde_urlencoded::from_bytes(&bytes)
        .map_err(|err| AppError::BadRequest(format!("decoding form body: {err}")))?;

    let expected = session::csrf_token(&session).await?;
    match fields.get("csrf_token") {
        Some(submitted) if *submitted == expected => {
            let request = Request::from_parts(parts, Body::from(bytes));
            Ok(next.run(request).await)
        }
        Some(_) => Err(AppError::BadRequest("CSRF token mismatch".to_string())),
        None => Err(AppError::BadRequest("missing CSRF token".to_string())),
    }
}
