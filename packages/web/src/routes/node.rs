//! Node routes
//!
//! Browsing the path namespace, viewing a node's rows, creating nodes with
//! request-time key fields, and the row insert/update/drop flows. Forms are
//! synthesized per request from the node's keys and validated against the
//! type registry before anything is persisted.

use axum::{
    extract::{Path as UrlPath, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form as FormBody, Router,
};
use serde::Deserialize;

use onebase_core::models::{permissions, Node};
use onebase_core::services::ServiceError;

use crate::auth::{require_all, CurrentUser, MaybeUser};
use crate::forms::{self, FormData};
use crate::http_error::HttpError;
use crate::render::{self, urlencode};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    path: Option<String>,
    offset: Option<usize>,
    count: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DropQuery {
    path: Option<String>,
    rows: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/node/browse", get(browse))
        .route("/node/search", get(view_node).post(select_rows))
        .route("/node/create", get(create_node_form).post(create_node_submit))
        .route("/node/slot/add", get(add_row_form).post(add_row_submit))
        .route(
            "/node/slot/update/{row}",
            get(update_row_form).post(update_row_submit),
        )
        .route("/node/slot/drop", get(drop_rows_confirm).post(drop_rows_submit))
        .with_state(state)
}

/// Resolve a path query to its node, or a coded failure.
async fn node_at_path(state: &AppState, path: &str) -> Result<Node, HttpError> {
    if path.trim().is_empty() {
        return Err(ServiceError::MissingPath.into());
    }
    let node_id = state
        .paths
        .find(path)
        .await?
        .and_then(|p| p.node)
        .ok_or_else(|| HttpError::not_found("Node", path))?;
    Ok(state.nodes.get(&node_id).await?)
}

/// Browse the path namespace; a node-bearing path lands on the node view.
async fn browse(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, HttpError> {
    let path = query.path.unwrap_or_default();
    let (current, children) = state.paths.children(&path).await?;

    if let Some(ref resolved) = current {
        if resolved.node.is_some() {
            let target = format!("/node/search?path={}", urlencode(&path));
            return Ok(Redirect::to(&target).into_response());
        }
    }
    Ok(Html(render::browse_page(&path, current.as_ref(), &children, user.as_ref()))
        .into_response())
}

/// Find a node by path and render its rows.
async fn view_node(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, HttpError> {
    let path = query.path.unwrap_or_default();
    let offset = query.offset.unwrap_or(0);
    let count = query.count.unwrap_or(100);

    let Some(resolved) = state.paths.find(&path).await? else {
        return Ok(Html(render::no_node_page(&path, user.as_ref())).into_response());
    };
    let Some(node_id) = resolved.node else {
        // A node-less path is for browsing, not viewing.
        let target = format!("/node/browse?path={}", urlencode(&path));
        return Ok(Redirect::to(&target).into_response());
    };

    let node = state.nodes.get(&node_id).await?;
    let keys = state.nodes.get_keys(&node).await?;
    let rowset = state.nodes.select(&node, offset, count).await?;
    Ok(Html(render::node_page(&node, &keys, &rowset, &path, user.as_ref())).into_response())
}

/// Row-selection POST on the node view: route into the drop confirmation.
async fn select_rows(
    Query(query): Query<SearchQuery>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Redirect, HttpError> {
    let path = query.path.unwrap_or_default();
    let data = FormData::new(pairs);

    if data.get("DELETE").is_some() {
        let rows = data.get_all("select_row");
        if !rows.is_empty() {
            let target = format!(
                "/node/slot/drop?path={}&rows={}",
                urlencode(&path),
                urlencode(&rows.join(","))
            );
            return Ok(Redirect::to(&target));
        }
    }
    Ok(Redirect::to(&format!(
        "/node/search?path={}",
        urlencode(&path)
    )))
}

/// Rebuild the create URL with one more key field, keeping entered values.
fn add_key_url(data: &FormData, next_count: usize) -> String {
    let mut params: Vec<String> = Vec::new();
    for (name, value) in data.pairs() {
        if name == "keyCount" {
            continue;
        }
        params.push(format!("{}={}", urlencode(name), urlencode(value)));
    }
    params.push(format!("keyCount={}", next_count));
    format!("/node/create?{}", params.join("&"))
}

fn requested_key_count(data: &FormData) -> usize {
    forms::clamp_key_count(
        data.get("keyCount")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1),
    )
}

/// Render the node-creation form with `keyCount` key field triples.
async fn create_node_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::CREATE_NODE])?;

    let data = FormData::new(pairs);
    let path = data
        .get("path")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or(ServiceError::MissingPath)?;

    let key_count = requested_key_count(&data);
    let types = state.types.as_select().await?;
    let form = forms::node_form(&path, key_count, &types, &data);
    let add_key = add_key_url(&data, forms::clamp_key_count(key_count + 1));

    Ok(Html(render::create_node_page(&form, &path, &add_key, Some(&user))).into_response())
}

/// Create the node and attach it at the submitted path.
async fn create_node_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query_pairs): Query<Vec<(String, String)>>,
    FormBody(body_pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::CREATE_NODE])?;

    let data = FormData::merged(body_pairs, query_pairs);
    let path = data
        .get("path")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or(ServiceError::MissingPath)?;

    let key_count = requested_key_count(&data);
    let types = state.types.as_select().await?;
    let mut form = forms::node_form(&path, key_count, &types, &data);

    let title_ok = forms::validate_node_form(&mut form);
    let drafts = forms::parse_key_drafts(&mut form, key_count);

    if let (true, Some(drafts)) = (title_ok, drafts) {
        let created = state
            .nodes
            .create_node(form.value("title"), form.value("description"), drafts)
            .await;
        match created {
            Ok(node) => {
                state.paths.create_node_at_path(&path, &node.id).await?;
                let target = format!("/node/search?path={}", urlencode(&path));
                return Ok(Redirect::to(&target).into_response());
            }
            Err(err) if matches!(err.error_code(), "E-206" | "E-210" | "E-211") => {
                form.add_error(err.to_string());
            }
            Err(err) => return Err(err.into()),
        }
    }

    let add_key = add_key_url(&data, forms::clamp_key_count(key_count + 1));
    Ok(Html(render::create_node_page(&form, &path, &add_key, Some(&user))).into_response())
}

/// Render the insert-row form: one field per key.
async fn add_row_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PathQuery>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::NODE_MODIFY])?;

    let path = query.path.unwrap_or_default();
    let node = node_at_path(&state, &path).await?;
    let keys = state.nodes.get_keys(&node).await?;
    let types = state.nodes.key_types(&keys).await?;

    let form = forms::slot_form(&keys, &types, None);
    let action = format!("/node/slot/add?path={}", urlencode(&path));
    let title = format!("Insert into {}", node.title);
    Ok(Html(render::slot_page(&title, &form, &action, Some(&user))).into_response())
}

/// Validate and insert one row of slots.
async fn add_row_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PathQuery>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::NODE_MODIFY])?;

    let path = query.path.unwrap_or_default();
    let node = node_at_path(&state, &path).await?;
    let keys = state.nodes.get_keys(&node).await?;
    let types = state.nodes.key_types(&keys).await?;

    let data = FormData::new(pairs);
    let mut form = forms::slot_form(&keys, &types, None);
    form.set_values(&data);

    if let Some(values) = forms::validate_slot_form(&mut form, &keys, &types) {
        state.nodes.insert_row(&node, &values).await?;
        let target = format!("/node/search?path={}", urlencode(&path));
        return Ok(Redirect::to(&target).into_response());
    }

    let action = format!("/node/slot/add?path={}", urlencode(&path));
    let title = format!("Insert into {}", node.title);
    Ok(Html(render::slot_page(&title, &form, &action, Some(&user))).into_response())
}

/// Render the update-row form, prefilled from the row's slots.
async fn update_row_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    UrlPath(row): UrlPath<i64>,
    Query(query): Query<PathQuery>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::NODE_UPDATE])?;

    let path = query.path.unwrap_or_default();
    let node = node_at_path(&state, &path).await?;
    let keys = state.nodes.get_keys(&node).await?;
    let types = state.nodes.key_types(&keys).await?;
    let existing = state.nodes.row_values(&node, row).await?;

    let form = forms::slot_form(&keys, &types, Some(&existing));
    let action = format!("/node/slot/update/{}?path={}", row, urlencode(&path));
    let title = format!("Update row {} of {}", row, node.title);
    Ok(Html(render::slot_page(&title, &form, &action, Some(&user))).into_response())
}

/// Validate and update one row's slots in place.
async fn update_row_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    UrlPath(row): UrlPath<i64>,
    Query(query): Query<PathQuery>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::NODE_UPDATE])?;

    let path = query.path.unwrap_or_default();
    let node = node_at_path(&state, &path).await?;
    let keys = state.nodes.get_keys(&node).await?;
    let types = state.nodes.key_types(&keys).await?;

    let data = FormData::new(pairs);
    let mut form = forms::slot_form(&keys, &types, None);
    form.set_values(&data);

    if let Some(values) = forms::validate_slot_form(&mut form, &keys, &types) {
        state.nodes.update_row(&node, row, &values).await?;
        let target = format!("/node/search?path={}", urlencode(&path));
        return Ok(Redirect::to(&target).into_response());
    }

    let action = format!("/node/slot/update/{}?path={}", row, urlencode(&path));
    let title = format!("Update row {} of {}", row, node.title);
    Ok(Html(render::slot_page(&title, &form, &action, Some(&user))).into_response())
}

fn parse_rows(raw: Option<&str>) -> Result<Vec<i64>, HttpError> {
    let raw = raw.unwrap_or("");
    let mut rows = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let row = part
            .parse::<i64>()
            .map_err(|_| HttpError::new(format!("Invalid row index: {part}"), "E-400"))?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(HttpError::new("No rows selected", "E-400"));
    }
    Ok(rows)
}

/// Show the rows about to be dropped.
async fn drop_rows_confirm(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DropQuery>,
) -> Result<Response, HttpError> {
    require_all(&user, &[permissions::SLOT_DROP])?;

    let path = query.path.unwrap_or_default();
    let rows = parse_rows(query.rows.as_deref())?;
    let node = node_at_path(&state, &path).await?;
    let keys = state.nodes.get_keys(&node).await?;
    let preview = state.nodes.rows_preview(&node, &rows).await?;

    let rows_param = query.rows.unwrap_or_default();
    Ok(Html(render::drop_confirm_page(
        &keys,
        &preview,
        &path,
        &rows_param,
        Some(&user),
    ))
    .into_response())
}

/// Drop the confirmed rows and return to the node view.
async fn drop_rows_submit(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<DropQuery>,
    FormBody(pairs): FormBody<Vec<(String, String)>>,
) -> Result<Redirect, HttpError> {
    require_all(&user, &[permissions::SLOT_DROP])?;

    let path = query.path.unwrap_or_default();
    let data = FormData::new(pairs);

    if data.get("YES").is_some() {
        let rows = parse_rows(query.rows.as_deref())?;
        let node = node_at_path(&state, &path).await?;
        state.nodes.drop_rows(&node, &rows).await?;
    }
    Ok(Redirect::to(&format!(
        "/node/search?path={}",
        urlencode(&path)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> FormData {
        FormData::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_add_key_url_bumps_count_and_keeps_values() {
        let d = data(&[
            ("path", "people"),
            ("keyCount", "2"),
            ("key_0_name", "name"),
        ]);
        let url = add_key_url(&d, 3);
        assert!(url.starts_with("/node/create?"));
        assert!(url.contains("keyCount=3"));
        assert!(url.contains("key_0_name=name"));
        assert!(!url.contains("keyCount=2"));
    }

    #[test]
    fn test_parse_rows() {
        assert_eq!(parse_rows(Some("1,3, 5")).unwrap(), vec![1, 3, 5]);
        assert!(parse_rows(Some("")).is_err());
        assert!(parse_rows(Some("one")).is_err());
        assert!(parse_rows(None).is_err());
    }
}
