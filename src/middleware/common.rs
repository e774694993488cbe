//! Chain-wide interceptors: panic recovery, request logging and security
//! headers. These run on every request, including static assets.

use std::any::Any;
use std::time::Instant;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Converts a panic caught by `CatchPanicLayer` into a generic 500.
///
/// The payload is logged server-side with as much detail as it carries;
/// the client sees nothing but the status line, and `Connection: close`
/// tells it not to reuse the connection.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "non-string panic payload".to_string()
    };
    tracing::error!(panic = %detail, "recovered from panic while handling request");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONNECTION, "close")],
        "Internal Server Error",
    )
        .into_response()
}

/// Logs method, URI and protocol on the way in; status and elapsed time on
/// the way out. Every request gets a line, whatever its outcome.
pub async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();
    tracing::info!(%method, %uri, ?version, "request");

    let start = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "response"
    );
    response
}

/// Stamps the fixed security header set onto every response.
pub async fn secure_headers(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com",
        ),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("origin-when-cross-origin"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("0"),
    );
    response
}
