//! Route table and middleware chain assembly.
//!
//! Three rings, innermost to outermost:
//! - protected routes (`/snippet/create`, `/user/logout`) behind the
//!   authentication gate;
//! - dynamic routes behind CSRF validation and session loading;
//! - the whole router behind security headers, request logging and panic
//!   recovery, with `/static` served from disk, a `/ping` liveness probe
//!   and an explicit 404 fallback.
//!
//! Wrong-method requests on a known path get axum's 405 with an `Allow`
//! header; unknown paths fall through to the 404 helper.

use std::path::PathBuf;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir};
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::SqliteStore;

use crate::handlers::{self, health, snippets, users};
use crate::middleware::{auth, common, csrf};
use crate::state::AppState;

pub fn routes(
    state: AppState,
    static_dir: PathBuf,
    session_layer: SessionManagerLayer<SqliteStore>,
) -> Router {
    let protected = Router::new()
        .route(
            "/snippet/create",
            get(snippets::create).post(snippets::create_post),
        )
        .route("/user/logout", post(users::logout_post))
        .route_layer(from_fn(auth::require_auth));

    // Layer order: the layer added last wraps the ones before it, so the
    // session manager ends up outside the CSRF check, which needs it.
    let dynamic = Router::new()
        .route("/", get(snippets::home))
        .route("/snippet/view/{id}", get(snippets::view))
        .route("/user/signup", get(users::signup).post(users::signup_post))
        .route("/user/login", get(users::login).post(users::login_post))
        .merge(protected)
        .layer(from_fn(csrf::verify_csrf))
        .layer(session_layer);

    Router::new()
        .route("/ping", get(health::ping))
        .merge(dynamic)
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(handlers::not_found)
        .layer(from_fn(common::secure_headers))
        .layer(from_fn(common::log_request))
        .layer(CatchPanicLayer::custom(common::handle_panic))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use http_body_util::BodyExt;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    use crate::state::AppState;
    use crate::templates::{TemplateCache, TemplateConfig};

    async fn test_app() -> Router {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("migrations apply");

        let store = SqliteStore::new(db.clone());
        store.migrate().await.expect("session schema applies");
        let session_layer = SessionManagerLayer::new(store).with_secure(false);

        let templates =
            TemplateCache::build(TemplateConfig::new("ui/html")).expect("template cache builds");

        routes(AppState { db, templates }, PathBuf::from("ui/static"), session_layer)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.expect("infallible")
    }

    fn get_request(path: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).expect("request builds")
    }

    fn post_form(path: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
        let body = serde_urlencoded::to_string(fields).expect("form encodes");
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body)).expect("request builds")
    }

    /// The `name=value` pair of the session cookie, if the response set one.
    fn session_cookie(response: &Response) -> Option<String> {
        response.headers().get(header::SET_COOKIE).map(|value| {
            value
                .to_str()
                .expect("cookie is ascii")
                .split(';')
                .next()
                .expect("cookie has a value")
                .to_string()
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8 body")
    }

    fn csrf_token_in(body: &str) -> String {
        let marker = "name=\"csrf_token\" value=\"";
        let start = body.find(marker).expect("page embeds a CSRF field") + marker.len();
        let end = body[start..].find('"').expect("token is quoted") + start;
        body[start..end].to_string()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .expect("redirect carries Location")
            .to_str()
            .expect("location is ascii")
    }

    #[tokio::test]
    async fn ping_works_without_a_session() {
        let app = test_app().await;
        let response = send(&app, get_request("/ping", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "OK");
    }

    #[tokio::test]
    async fn home_renders_and_sets_security_headers() {
        let app = test_app().await;
        let response = send(&app, get_request("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::X_FRAME_OPTIONS],
            "deny",
        );
        assert_eq!(
            response.headers()[header::X_CONTENT_TYPE_OPTIONS],
            "nosniff",
        );
        let body = body_string(response).await;
        assert!(body.contains("Snipbin"));
    }

    #[tokio::test]
    async fn snippet_view_rejects_bad_ids() {
        let app = test_app().await;

        let response = send(&app, get_request("/snippet/view/0", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, get_request("/snippet/view/abc", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Well-formed id, no such snippet.
        let response = send(&app, get_request("/snippet/view/99", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = test_app().await;
        let response = send(&app, get_request("/no/such/page", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_method_not_allowed() {
        let app = test_app().await;
        let request = Request::builder()
            .method(Method::DELETE)
            .uri("/ping")
            .body(Body::empty())
            .expect("request builds");
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = response.headers()[header::ALLOW]
            .to_str()
            .expect("allow is ascii");
        assert!(allow.contains("GET"));
    }

    #[tokio::test]
    async fn anonymous_create_redirects_to_login() {
        let app = test_app().await;
        let response = send(&app, get_request("/snippet/create", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/user/login");
    }

    #[tokio::test]
    async fn post_without_csrf_token_is_rejected() {
        let app = test_app().await;
        let response = send(
            &app,
            post_form(
                "/user/login",
                None,
                &[("email", "ann@example.com"), ("password", "whatever99")],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn signup_rejects_invalid_email_and_keeps_input() {
        let app = test_app().await;

        let response = send(&app, get_request("/user/signup", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response).expect("session cookie set");
        let token = csrf_token_in(&body_string(response).await);

        let response = send(
            &app,
            post_form(
                "/user/signup",
                Some(&cookie),
                &[
                    ("name", "Ann"),
                    ("email", "bad-email"),
                    ("password", "longenough12"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_string(response).await;
        assert!(body.contains("This field must be a valid email address"));
        // Submitted values survive the round trip.
        assert!(body.contains("Ann"));
        // Only the email field is in error.
        assert!(!body.contains("This field cannot be blank"));
        assert!(!body.contains("This field must be at least 8 characters long"));
    }

    #[tokio::test]
    async fn malformed_expires_is_a_bad_request() {
        let app = test_app().await;

        let (cookie, token) = signup_and_login(&app).await;
        let response = send(
            &app,
            post_form(
                "/snippet/create",
                Some(&cookie),
                &[
                    ("title", "t"),
                    ("content", "c"),
                    ("expires", "soon"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        // Non-integer expires fails at binding, not validation.
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    /// Signs up and logs in `ann@example.com`, returning the authenticated
    /// session cookie and the session's CSRF token.
    async fn signup_and_login(app: &Router) -> (String, String) {
        let response = send(app, get_request("/user/signup", None)).await;
        let mut cookie = session_cookie(&response).expect("session cookie set");
        let token = csrf_token_in(&body_string(response).await);

        let response = send(
            app,
            post_form(
                "/user/signup",
                Some(&cookie),
                &[
                    ("name", "Ann"),
                    ("email", "ann@example.com"),
                    ("password", "longenough12"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/user/login");
        if let Some(fresh) = session_cookie(&response) {
            cookie = fresh;
        }

        let response = send(
            app,
            post_form(
                "/user/login",
                Some(&cookie),
                &[
                    ("email", "ann@example.com"),
                    ("password", "longenough12"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/snippet/create");
        let rotated = session_cookie(&response).expect("login rotates the session cookie");
        assert_ne!(rotated, cookie, "login must issue a fresh token");

        (rotated, token)
    }

    #[tokio::test]
    async fn login_with_wrong_password_shows_generic_error() {
        let app = test_app().await;

        let response = send(&app, get_request("/user/signup", None)).await;
        let cookie = session_cookie(&response).expect("session cookie set");
        let token = csrf_token_in(&body_string(response).await);

        let response = send(
            &app,
            post_form(
                "/user/signup",
                Some(&cookie),
                &[
                    ("name", "Ann"),
                    ("email", "ann@example.com"),
                    ("password", "longenough12"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = send(
            &app,
            post_form(
                "/user/login",
                Some(&cookie),
                &[
                    ("email", "ann@example.com"),
                    ("password", "wrong-password"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_string(response).await;
        assert!(body.contains("Email or password is incorrect"));
    }

    #[tokio::test]
    async fn duplicate_signup_reports_email_in_use() {
        let app = test_app().await;
        let (_, _) = signup_and_login(&app).await;

        let response = send(&app, get_request("/user/signup", None)).await;
        let cookie = session_cookie(&response).expect("session cookie set");
        let token = csrf_token_in(&body_string(response).await);

        let response = send(
            &app,
            post_form(
                "/user/signup",
                Some(&cookie),
                &[
                    ("name", "Ann Again"),
                    ("email", "ann@example.com"),
                    ("password", "longenough12"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_string(response).await;
        assert!(body.contains("Email address is already in use"));
    }

    #[tokio::test]
    async fn create_view_flash_round_trip() {
        let app = test_app().await;
        let (cookie, token) = signup_and_login(&app).await;

        let response = send(
            &app,
            post_form(
                "/snippet/create",
                Some(&cookie),
                &[
                    ("title", "O snail"),
                    ("content", "Climb Mount Fuji, but slowly, slowly!"),
                    ("expires", "365"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let view_path = location(&response).to_string();
        assert!(view_path.starts_with("/snippet/view/"));

        // First view shows the snippet and the one-shot flash message.
        let response = send(&app, get_request(&view_path, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("O snail"));
        assert!(body.contains("Snippet successfully created!"));

        // The flash was consumed by being shown.
        let response = send(&app, get_request(&view_path, Some(&cookie))).await;
        let body = body_string(response).await;
        assert!(!body.contains("Snippet successfully created!"));
    }

    #[tokio::test]
    async fn snippet_create_rejects_invalid_fields() {
        let app = test_app().await;
        let (cookie, token) = signup_and_login(&app).await;

        let response = send(
            &app,
            post_form(
                "/snippet/create",
                Some(&cookie),
                &[
                    ("title", ""),
                    ("content", "body"),
                    ("expires", "14"),
                    ("csrf_token", &token),
                ],
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_string(response).await;
        assert!(body.contains("This field cannot be blank"));
        assert!(body.contains("This field must equal 1, 7 or 365"));
    }

    #[tokio::test]
    async fn logout_rotates_and_locks_out() {
        let app = test_app().await;
        let (cookie, token) = signup_and_login(&app).await;

        let response = send(
            &app,
            post_form("/user/logout", Some(&cookie), &[("csrf_token", &token)]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        let cookie = session_cookie(&response).expect("logout rotates the session cookie");

        // Flash survives the token rotation; authentication does not.
        let response = send(&app, get_request("/", Some(&cookie))).await;
        let body = body_string(response).await;
        // The apostrophe is HTML-escaped by the template engine, so match
        // around it.
        assert!(body.contains("been logged out successfully!"));

        let response = send(&app, get_request("/snippet/create", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/user/login");
    }
}
