//! Type registry routes
//!
//! Listing, creation, inspection, modification and (confirmed) deletion of
//! registry types.

use axum::{
    extract::{Path as UrlPath, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form as FormBody, Router,
};
use serde::Deserialize;

use onebase_core::models::permissions;

use crate::auth::{require_all, CurrentUser, MaybeUser};
use crate::forms::{self, FormData};
use crate::http_error::HttpError;
use crate::render;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct ConfirmQuery {
    confirm: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/type/", get(list_types))
        .route("/type/create", get(create_form).post(create_submit))
        .route("/type/{type_id}", get(show_type))
        .route("/type/{type_id}/modify", get(modify_form).post(modify_submit))
        .route("/type/{type_id}/delete", get(delete_type))
        .with_state(state)
}

async fn list_types(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, HttpError> {
    let types = state.types.list().await?;
    Ok(Html(render::types_list_page(&types, user.as_ref())))
}

async fn create_form(
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, HttpError> {
    require_all(&user, &[permissions::CREATE_TYPE])?;
    let form = forms::type_form();
    Ok(Html(render::page(
        "Create Type",
        Some(&user),
        &render::render_form(&form, "/type/create", "Create Type"),
    )))
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

async fn create_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::CREATE_TYPE])?;

    let data = FormData::new(pairs);
    let mut form = forms::type_form();
    form.set_values(&data);

    if forms::validate_type_form(&mut form) {
        let created = state
            .types
            .create(
                form.value("name").trim(),
                form.value("repr").trim(),
                data.flag("is_primitive"),
                optional(form.value("validator")),
            )
            .await;
        match created {
            Ok(soft_type) => {
                return Ok(Redirect::to(&format!("/type/{}", soft_type.id)).into_response())
            }
            Err(err) if err.error_code() == "E-212" => form.add_error(err.to_string()),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(Html(render::page(
        "Create Type",
        Some(&user),
        &render::render_form(&form, "/type/create", "Create Type"),
    ))
    .into_response())
}

async fn show_type(
    State(state): State<AppState>,
    UrlPath(type_id): UrlPath<String>,
    MaybeUser(user): MaybeUser,
) -> Result<Html<String>, HttpError> {
    let soft_type = state.types.get(&type_id).await?;
    Ok(Html(render::type_show_page(&soft_type, user.as_ref())))
}

async fn modify_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    UrlPath(type_id): UrlPath<String>,
) -> Result<Html<String>, HttpError> {
    require_all(&user, &[permissions::UPDATE_TYPE])?;

    let soft_type = state.types.get(&type_id).await?;
    let form = forms::type_form_prefilled(&soft_type);
    let action = format!("/type/{}/modify", soft_type.id);
    Ok(Html(render::page(
        &format!("Modify {}", soft_type.name),
        Some(&user),
        &render::render_form(&form, &action, "Save"),
    )))
}

async fn modify_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    UrlPath(type_id): UrlPath<String>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::UPDATE_TYPE])?;

    let data = FormData::new(pairs);
    let mut form = forms::type_form();
    form.set_values(&data);

    if forms::validate_type_form(&mut form) {
        let updated = state
            .types
            .update(
                &type_id,
                form.value("name").trim(),
                form.value("repr").trim(),
                data.flag("is_primitive"),
                optional(form.value("validator")),
            )
            .await;
        match updated {
            Ok(soft_type) => {
                return Ok(Redirect::to(&format!("/type/{}", soft_type.id)).into_response())
            }
            Err(err) if err.error_code() == "E-212" => form.add_error(err.to_string()),
            Err(err) => return Err(err.into()),
        }
    }

    let action = format!("/type/{}/modify", type_id);
    Ok(Html(render::page(
        "Modify Type",
        Some(&user),
        &render::render_form(&form, &action, "Save"),
    ))
    .into_response())
}

/// Deletion is a two-step flow: the bare GET renders a confirmation page,
/// `confirm=1` performs the delete.
async fn delete_type(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    UrlPath(type_id): UrlPath<String>,
    Query(query): Query<ConfirmQuery>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::DELETE_TYPE])?;

    let soft_type = state.types.get(&type_id).await?;
    if query.confirm.as_deref() == Some("1") {
        state.types.delete(&soft_type.id).await?;
        return Ok(Redirect::to("/type/").into_response());
    }
    Ok(Html(render::type_delete_page(&soft_type, Some(&user))).into_response())
}
