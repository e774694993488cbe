use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::db::users;
use crate::error::{AppError, AppResult};
use crate::forms::{self, LoginForm, SignupForm};
use crate::session as session_state;
use crate::state::AppState;
use crate::templates::TemplateData;

pub async fn signup(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let data = TemplateData::from_session(&session)
        .await?
        .with_form(&SignupForm::default());
    state.templates.render("signup.html", StatusCode::OK, &data)
}

pub async fn signup_post(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<SignupForm>, FormRejection>,
) -> AppResult<Response> {
    let form = forms::bind(form)?;

    let mut errors = form.validate();
    if errors.is_valid() {
        match users::insert(&state.db, &form.name, &form.email, &form.password).await {
            Ok(()) => {
                session_state::set_flash(&session, "Your signup was successful. Please log in.")
                    .await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(AppError::DuplicateEmail) => {
                errors.add_field_error("email", "Email address is already in use");
            }
            Err(err) => return Err(err),
        }
    }

    let mut data = TemplateData::from_session(&session).await?.with_form(&form);
    data.errors = errors;
    state
        .templates
        .render("signup.html", StatusCode::UNPROCESSABLE_ENTITY, &data)
}

pub async fn login(State(state): State<AppState>, session: Session) -> AppResult<Response> {
    let data = TemplateData::from_session(&session)
        .await?
        .with_form(&LoginForm::default());
    state.templates.render("login.html", StatusCode::OK, &data)
}

pub async fn login_post(
    State(state): State<AppState>,
    session: Session,
    form: Result<Form<LoginForm>, FormRejection>,
) -> AppResult<Response> {
    let form = forms::bind(form)?;

    let mut errors = form.validate();
    if errors.is_valid() {
        match users::authenticate(&state.db, &form.email, &form.password).await {
            Ok(user_id) => {
                // Privilege change: rotate the token before marking the
                // session as authenticated.
                session_state::log_in(&session, user_id).await?;
                return Ok(Redirect::to("/snippet/create").into_response());
            }
            Err(AppError::InvalidCredentials) => {
                // One generic message; which half of the pair failed is
                // deliberately not revealed.
                errors.add_non_field_error("Email or password is incorrect");
            }
            Err(err) => return Err(err),
        }
    }

    let mut data = TemplateData::from_session(&session).await?.with_form(&form);
    data.errors = errors;
    state
        .templates
        .render("login.html", StatusCode::UNPROCESSABLE_ENTITY, &data)
}

pub async fn logout_post(session: Session) -> AppResult<Response> {
    session_state::log_out(&session).await?;
    session_state::set_flash(&session, "You've been logged out successfully!").await?;
    Ok(Redirect::to("/").into_response())
}
