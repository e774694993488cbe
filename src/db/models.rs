//! Row types mapped straight out of the database.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One text snippet. `expires` is an absolute instant; rows past it are
/// filtered out by every read in `db::snippets`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

/// A registered account. The password is stored as an Argon2id PHC
/// string, never in the clear, and never serialized into a template.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub created: DateTime<Utc>,
}
