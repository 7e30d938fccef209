//! Router-level tests: pages render, login gates mutating views, and the
//! full create-type → create-node → view flow works over HTTP.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use onebase_core::db::DocumentStore;
use onebase_web::{create_router, AppState};

const ADMIN_PASSWORD: &str = "secret";

async fn test_app() -> anyhow::Result<(Router, AppState, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(DocumentStore::new(temp_dir.path().join("test.db")).await?);
    let state = AppState::new(store, None);
    state.auth.ensure_admin(ADMIN_PASSWORD).await?;
    let app = create_router(state.clone(), false);
    Ok((app, state, temp_dir))
}

async fn body_text(response: axum::response::Response) -> anyhow::Result<String> {
    let bytes = response.into_body().collect().await?.to_bytes();
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie.to_string());
    }
    builder.body(Body::empty()).unwrap()
}

/// Log in as the bootstrapped admin and return the session cookie.
async fn login(app: &Router) -> anyhow::Result<String> {
    let response = app
        .clone()
        .oneshot(form_post(
            "/auth/login",
            &format!("email=admin%40example.com&password={ADMIN_PASSWORD}"),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()?
        .split(';')
        .next()
        .unwrap()
        .to_string();
    Ok(cookie)
}

#[tokio::test]
async fn test_index_renders() -> anyhow::Result<()> {
    let (app, _state, _temp_dir) = test_app().await?;

    let response = app.oneshot(get("/", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("1Base"));
    assert!(html.contains("Log In"));
    Ok(())
}

#[tokio::test]
async fn test_anonymous_create_redirects_to_login() -> anyhow::Result<()> {
    let (app, _state, _temp_dir) = test_app().await?;

    let response = app
        .oneshot(get("/node/create?path=people&keyCount=1", None))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[header::LOCATION].to_str()?.to_string();
    assert!(location.starts_with("/auth/login?next="));
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_bad_password() -> anyhow::Result<()> {
    let (app, _state, _temp_dir) = test_app().await?;

    let response = app
        .oneshot(form_post(
            "/auth/login",
            "email=admin%40example.com&password=wrong",
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("Invalid username or password"));
    Ok(())
}

#[tokio::test]
async fn test_login_rejects_unsafe_next() -> anyhow::Result<()> {
    let (app, _state, _temp_dir) = test_app().await?;

    let response = app
        .oneshot(form_post(
            "/auth/login?next=https%3A%2F%2Fevil.example.com%2F",
            &format!("email=admin%40example.com&password={ADMIN_PASSWORD}"),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_register_then_verify() -> anyhow::Result<()> {
    let (app, state, _temp_dir) = test_app().await?;

    let response = app
        .clone()
        .oneshot(form_post(
            "/auth/register",
            "email=new%40example.com&password=pw&password_confirm=pw",
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("new@example.com"));

    let account = state
        .auth
        .load_by_email("new@example.com")
        .await?
        .expect("account exists");
    assert!(!account.user.is_active);

    let response = app
        .oneshot(get(
            &format!("/auth/validate?key={}", account.user.verification),
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("verified"));
    Ok(())
}

#[tokio::test]
async fn test_register_password_mismatch_rerenders() -> anyhow::Result<()> {
    let (app, _state, _temp_dir) = test_app().await?;

    let response = app
        .oneshot(form_post(
            "/auth/register",
            "email=new%40example.com&password=one&password_confirm=two",
            None,
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("Passwords do not match"));
    Ok(())
}

#[tokio::test]
async fn test_full_node_flow() -> anyhow::Result<()> {
    let (app, state, _temp_dir) = test_app().await?;
    let cookie = login(&app).await?;

    // Register a primitive type.
    let response = app
        .clone()
        .oneshot(form_post(
            "/type/create",
            "name=string&repr=&is_primitive=true&validator=",
            Some(&cookie),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let type_id = state.types.as_select().await?[0].0.clone();

    // Create a node at a path with one key.
    let body = format!(
        "path=people&title=People&description=Contacts&keyCount=1\
         &key_0_name=name&key_0_type={type_id}&key_0_size=64"
    );
    let response = app
        .clone()
        .oneshot(form_post("/node/create?path=people", &body, Some(&cookie)))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Insert a row.
    let response = app
        .clone()
        .oneshot(form_post(
            "/node/slot/add?path=people",
            "name=Ada",
            Some(&cookie),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The node view shows the row.
    let response = app
        .clone()
        .oneshot(get("/node/search?path=people", Some(&cookie)))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("Node: People"));
    assert!(html.contains("Ada"));
    Ok(())
}

#[tokio::test]
async fn test_invalid_slot_value_rerenders_with_inline_error() -> anyhow::Result<()> {
    let (app, state, _temp_dir) = test_app().await?;
    let cookie = login(&app).await?;

    let integer = state.types.create("integer", "", true, None).await?;
    let node = state
        .nodes
        .create_node(
            "Counts",
            "",
            vec![onebase_core::services::KeyDraft {
                name: "amount".to_string(),
                soft_type: integer.id,
                size: None,
            }],
        )
        .await?;
    state.paths.create_node_at_path("counts", &node.id).await?;

    let response = app
        .oneshot(form_post(
            "/node/slot/add?path=counts",
            "amount=not-a-number",
            Some(&cookie),
        ))
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("field-errors"));
    assert!(html.contains("not a valid integer"));
    Ok(())
}

#[tokio::test]
async fn test_browse_redirects_node_paths() -> anyhow::Result<()> {
    let (app, state, _temp_dir) = test_app().await?;

    let string = state.types.create("string", "", true, None).await?;
    let node = state
        .nodes
        .create_node(
            "People",
            "",
            vec![onebase_core::services::KeyDraft {
                name: "name".to_string(),
                soft_type: string.id,
                size: None,
            }],
        )
        .await?;
    state.paths.create_node_at_path("people", &node.id).await?;

    // A node-bearing path redirects into the node view.
    let response = app
        .clone()
        .oneshot(get("/node/browse?path=people", None))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(response.headers()[header::LOCATION]
        .to_str()?
        .starts_with("/node/search"));

    // The roots list the path.
    let response = app.oneshot(get("/node/browse", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("people"));
    Ok(())
}

#[tokio::test]
async fn test_type_listing_is_public() -> anyhow::Result<()> {
    let (app, state, _temp_dir) = test_app().await?;
    state.types.create("string", "", true, None).await?;

    let response = app.oneshot(get("/type/", None)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("string"));
    Ok(())
}

#[tokio::test]
async fn test_missing_node_is_404() -> anyhow::Result<()> {
    let (app, _state, _temp_dir) = test_app().await?;
    let cookie = login(&app).await?;

    let response = app
        .oneshot(get("/node/slot/add?path=no/such/path", Some(&cookie)))
        .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
