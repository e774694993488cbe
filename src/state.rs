//! Shared application state: the database pool and the template cache.
//!
//! Axum clones the state for every request; both fields are cheap handles
//! (`SqlitePool` is a pool handle, the cache sits behind an `Arc`) and
//! both are safe to share across tasks. The template cache is immutable
//! once built, so concurrent reads need no locking.

use std::sync::Arc;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::templates::{TemplateCache, TemplateConfig};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub templates: Arc<TemplateCache>,
}

impl AppState {
    /// Connects the pool, applies migrations and compiles every template.
    /// Any failure here is fatal; the server must not come up with a
    /// broken schema or an incomplete template cache.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = SqlitePool::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let templates = TemplateCache::build(TemplateConfig::new(config.template_dir.clone()))?;

        Ok(AppState { db, templates })
    }
}
