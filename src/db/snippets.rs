use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use crate::db::models::Snippet;
use crate::error::{AppError, AppResult};

/// Inserts a snippet expiring `expires_days` from now and returns its id.
pub async fn insert(
    pool: &SqlitePool,
    title: &str,
    content: &str,
    expires_days: i64,
) -> AppResult<i64> {
    let created = Utc::now();
    let expires = created + Duration::days(expires_days);

    let result = sqlx::query(
        "INSERT INTO snippets (title, content, created, expires)
         VALUES (?, ?, ?, ?)",
    )
    .bind(title)
    .bind(content)
    .bind(created)
    .bind(expires)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Fetches one live snippet. An unknown id and an expired snippet are the
/// same from the caller's point of view: not found.
pub async fn get(pool: &SqlitePool, id: i64) -> AppResult<Snippet> {
    let snippet = sqlx::query_as::<_, Snippet>(
        "SELECT id, title, content, created, expires FROM snippets
         WHERE datetime(expires) > datetime('now') AND id = ?",
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::RowNotFound => AppError::NotFound,
        _ => AppError::Database(err),
    })?;

    Ok(snippet)
}

/// The ten most recently created live snippets, newest first.
pub async fn latest(pool: &SqlitePool) -> AppResult<Vec<Snippet>> {
    let snippets = sqlx::query_as::<_, Snippet>(
        "SELECT id, title, content, created, expires FROM snippets
         WHERE datetime(expires) > datetime('now')
         ORDER BY id DESC LIMIT 10",
    )
    .fetch_all(pool)
    .await?;

    Ok(snippets)
}
