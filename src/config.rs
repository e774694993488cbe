//! Configuration from environment variables (with `.env` support for
//! local development).
//!
//! - `HOST`: bind address (default: 127.0.0.1)
//! - `PORT`: bind port (default: 4000)
//! - `DATABASE_URL`: SQLite connection string
//! - `TEMPLATE_DIR`: page template sources (default: ui/html)
//! - `STATIC_DIR`: static asset root (default: ui/static)

use std::env;
use std::path::PathBuf;

use anyhow::Result;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub template_dir: PathBuf,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Missing .env is fine; real environments set variables directly.
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:snipbin.db?mode=rwc".to_string()),
            template_dir: env::var("TEMPLATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ui/html")),
            static_dir: env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ui/static")),
        })
    }

    /// Socket address for the TCP listener, e.g. `127.0.0.1:4000`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
