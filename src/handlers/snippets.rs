use axum::{
    extract::{rejection::FormRejection, Form, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::snippets;
use crate::error::{AppError, AppResult};
use crate::forms::{self, SnippetForm};
use crate::session as session_state;
use crate::state::AppState;
use crate::templates::TemplateData;

pub async fn home(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let latest = snippets::latest(&state.db).await?;

    let mut data = TemplateData::from_session(&session).await?;
    data.snippets = latest;
    state.templates.render("home.html", StatusCode::OK, &data)
}

pub async fn view(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> AppResult<Response> {
    // The id segment must be a positive integer; anything else is
    // indistinguishable from a snippet that does not exist.
    let id: i64 = id.parse().map_err(|_| AppError::NotFound)?;
    if id < 1 {
        return Err(AppError::NotFound);
    }

    let snippet = snippets::get(&state.db, id).await?;

    let mut data = TemplateData::from_session(&session).await?;
    data.snippet = Some(snippet);
    state.templates.render("view.html", StatusCode::OK, &data)
}

pub async fn create(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let data = TemplateData::from_session(&session)
        .await?
        .with_form(&SnippetForm::empty());
    state.templates.render("create.html", StatusCode::OK, &data)
}

pub async fn create_post(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<SnippetForm>, FormRejection>,
) -> AppResult<Response> {
    let form = forms::bind(form)?;

    let errors = form.validate();
    if !errors.is_valid() {
        let mut data = TemplateData::from_session(&session).await?.with_form(&form);
        data.errors = errors;
        return state
            .templates
            .render("create.html", StatusCode::UNPROCESSABLE_ENTITY, &data);
    }

    let id = snippets::insert(&state.db, &form.title, &form.content, form.expires).await?;
    session_state::set_flash(&session, "Snippet successfully created!").await?;

    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
