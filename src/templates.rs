//! Startup-built template cache and the per-request view model.
//!
//! All page templates are read and compiled once, before the server starts
//! accepting requests; a template that fails to parse aborts startup
//! instead of surfacing mid-request. Pages extend `base.html` and may
//! include any partial, so the environment holds the base, every partial
//! and every page under its file name.
//!
//! Rendering is buffer-first: the page is rendered to a string, and only a
//! fully-rendered body is ever written to the response, so a client never
//! sees half a page with a 200 status.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Datelike, Utc};
use minijinja::{value::Value, Environment};
use serde::Serialize;
use tower_sessions::Session;

use crate::db::models::Snippet;
use crate::error::{AppError, AppResult};
use crate::session;
use crate::validation::Errors;

/// A text-to-text template filter, registered under a name.
pub type TextFilter = fn(String) -> Result<String, minijinja::Error>;

/// Explicit template configuration handed to [`TemplateCache::build`]:
/// where the sources live and which filters every template can call.
pub struct TemplateConfig {
    pub dir: PathBuf,
    pub filters: Vec<(&'static str, TextFilter)>,
}

impl TemplateConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            filters: vec![("human_date", human_date)],
        }
    }
}

/// Renders an RFC3339 timestamp as e.g. `06 Aug 2026 at 14:02`.
fn human_date(value: String) -> Result<String, minijinja::Error> {
    if value.is_empty() {
        return Ok(String::new());
    }
    let parsed = DateTime::parse_from_rfc3339(&value).map_err(|err| {
        minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            format!("human_date: not an RFC3339 timestamp: {err}"),
        )
    })?;
    Ok(parsed.format("%d %b %Y at %H:%M").to_string())
}

/// Immutable, pre-parsed template set. Built once, shared read-only.
pub struct TemplateCache {
    env: Environment<'static>,
}

impl TemplateCache {
    /// Reads `base.html`, `partials/*.html` and `pages/*.html` under the
    /// configured directory and compiles the lot. Any unreadable or
    /// unparseable source fails the build, and with it, startup.
    pub fn build(config: TemplateConfig) -> anyhow::Result<Arc<Self>> {
        let mut env = Environment::new();
        for (name, filter) in &config.filters {
            env.add_filter(*name, *filter);
        }

        let mut names = Vec::new();

        let base_path = config.dir.join("base.html");
        let base = fs::read_to_string(&base_path)
            .with_context(|| format!("reading {}", base_path.display()))?;
        env.add_template_owned("base.html".to_string(), base)
            .context("parsing base.html")?;
        names.push("base.html".to_string());

        for subdir in ["partials", "pages"] {
            let dir = config.dir.join(subdir);
            let entries = fs::read_dir(&dir)
                .with_context(|| format!("reading template directory {}", dir.display()))?;
            for entry in entries {
                let path = entry?.path();
                if path.extension().and_then(|ext| ext.to_str()) != Some("html") {
                    continue;
                }
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(str::to_string)
                    .with_context(|| format!("template file name {}", path.display()))?;
                let source = fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                env.add_template_owned(name.clone(), source)
                    .with_context(|| format!("parsing {name}"))?;
                names.push(name);
            }
        }

        // Force compilation now so syntax errors never wait for a request.
        for name in &names {
            env.get_template(name)
                .with_context(|| format!("compiling {name}"))?;
        }

        Ok(Arc::new(Self { env }))
    }

    /// Renders `page` with `data` into a complete response.
    ///
    /// Asking for a page that was never compiled is a programming error
    /// and reported as a 500, as is any rendering failure.
    pub fn render(
        &self,
        page: &str,
        status: StatusCode,
        data: &TemplateData,
    ) -> AppResult<Response> {
        let template = self
            .env
            .get_template(page)
            .map_err(|_| AppError::Internal(format!("the template {page} does not exist")))?;
        let body = template.render(data)?;
        Ok((status, Html(body)).into_response())
    }
}

/// Per-request view model. Assembled fresh for every render, never shared.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    /// The submitted form being re-displayed, if any.
    pub form: Option<Value>,
    pub errors: Errors,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

impl TemplateData {
    /// Base data every page needs: the year, the popped flash message,
    /// the authentication flag and the CSRF token for embedded forms.
    pub async fn from_session(session: &Session) -> AppResult<Self> {
        Ok(Self {
            current_year: Utc::now().year(),
            flash: session::pop_flash(session).await?,
            is_authenticated: session::is_authenticated(session).await?,
            csrf_token: session::csrf_token(session).await?,
            ..Self::default()
        })
    }

    pub fn with_form<F: Serialize>(mut self, form: &F) -> Self {
        self.form = Some(Value::from_serialize(form));
        self
    }
}
