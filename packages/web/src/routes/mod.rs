//! Route assembly
//!
//! Each module contributes a stated sub-router merged here, mirroring the
//! one-module-per-view-area layout of the handlers. The session layer wraps
//! everything (the persist-user middleware needs it), and tracing sits
//! outermost.

use std::time::Duration;

use axum::{middleware, response::Html, routing::get, Router};
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::auth::{persist_user, MaybeUser};
use crate::render;
use crate::state::AppState;

pub mod auth;
pub mod node;
pub mod types;

/// Session inactivity expiry: one week.
const SESSION_EXPIRY_SECS: u64 = 60 * 60 * 24 * 7;

/// Build the application router with session, persist-user and trace layers.
pub fn create_router(state: AppState, secure_cookies: bool) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(
            Duration::from_secs(SESSION_EXPIRY_SECS)
                .try_into()
                .expect("valid session expiry"),
        ));

    Router::new()
        .merge(main_routes(state.clone()))
        .merge(auth::routes(state.clone()))
        .merge(node::routes(state.clone()))
        .merge(types::routes(state.clone()))
        .layer(middleware::from_fn_with_state(state, persist_user))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

fn main_routes(state: AppState) -> Router {
    Router::new().route("/", get(index)).with_state(state)
}

/// Index landing page.
async fn index(MaybeUser(user): MaybeUser) -> Html<String> {
    Html(render::index_page(user.as_ref()))
}
