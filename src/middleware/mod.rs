//! Request interceptors, applied in a fixed order around the router:
//! panic recovery, then request logging, then security headers, then (for
//! dynamic routes) session loading and CSRF validation, then (for
//! protected routes) the authentication requirement. Each stage either
//! passes the request inward or short-circuits with its own response.

pub mod auth;
pub mod common;
pub mod csrf;
