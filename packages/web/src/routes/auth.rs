//! Authentication routes
//!
//! Login/logout, registration with email verification, and the
//! verification landing page. The verification URL is logged rather than
//! mailed; the email subsystem is external infrastructure.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form as FormBody, Router,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::info;

use crate::auth::{is_safe_url, CurrentUser, MaybeUser, SESSION_USER_KEY};
use crate::forms::{self, FormData};
use crate::http_error::HttpError;
use crate::render;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct NextQuery {
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidateQuery {
    key: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", get(login_page).post(login_submit))
        .route("/auth/register", get(register_page).post(register_submit))
        .route("/auth/logout", get(logout))
        .route("/auth/validate", get(validate))
        .with_state(state)
}

async fn login_page(
    Query(query): Query<NextQuery>,
    MaybeUser(user): MaybeUser,
) -> Html<String> {
    let form = forms::login_form();
    Html(render::login_page(&form, query.next.as_deref(), user.as_ref()))
}

async fn login_submit(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    session: Session,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    let data = FormData::new(pairs);
    let mut form = forms::login_form();
    form.set_values(&data);

    let email = form.value("email").to_string();
    let password = form.value("password").to_string();

    match state.auth.authenticate(&email, &password).await {
        Ok(user) => {
            session
                .insert(SESSION_USER_KEY, user.id.clone())
                .await
                .map_err(|err| {
                    HttpError::with_details("Session unavailable", "E-500", err.to_string())
                })?;

            if let Some(next) = query.next.as_deref() {
                if !is_safe_url(next) {
                    return Err(HttpError::new("Unsafe redirect target", "E-400"));
                }
                return Ok(Redirect::to(next).into_response());
            }
            Ok(Redirect::to("/").into_response())
        }
        Err(err) if matches!(err.error_code(), "E-202" | "E-203") => {
            form.add_error(err.to_string());
            Ok(Html(render::login_page(&form, query.next.as_deref(), None)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn register_page(MaybeUser(user): MaybeUser) -> Html<String> {
    let form = forms::register_form();
    Html(render::register_page(&form, user.as_ref()))
}

async fn register_submit(
    State(state): State<AppState>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    let data = FormData::new(pairs);
    let mut form = forms::register_form();
    form.set_values(&data);

    if !forms::validate_register(&mut form) {
        return Ok(Html(render::register_page(&form, None)).into_response());
    }

    match state
        .auth
        .register(form.value("email"), form.value("password"))
        .await
    {
        Ok(user) => {
            // The email subsystem is external; surface the link in the log.
            info!("Verification URL: /auth/validate?key={}", user.verification);
            Ok(Html(render::register_done_page(&user.email, None)).into_response())
        }
        Err(err) if err.error_code() == "E-204" => {
            form.add_error(err.to_string());
            Ok(Html(render::register_page(&form, None)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

async fn logout(_user: CurrentUser, session: Session) -> Result<Redirect, HttpError> {
    session
        .remove::<String>(SESSION_USER_KEY)
        .await
        .map_err(|err| HttpError::with_details("Session unavailable", "E-500", err.to_string()))?;
    Ok(Redirect::to("/"))
}

async fn validate(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, HttpError> {
    let verified = match query.key.as_deref() {
        Some(key) => match state.auth.verify(key).await {
            Ok(account) => Some(account.email),
            Err(err) if err.error_code() == "E-205" => None,
            Err(err) => return Err(err.into()),
        },
        None => None,
    };
    Ok(Html(render::validate_page(verified.as_deref(), user.as_ref())))
}
