//! Application state shared across all route handlers.

use std::sync::Arc;

use onebase_core::db::DocumentStore;
use onebase_core::services::{AuthService, NodeService, PathService, TypeService};

/// Services wired over one shared document store.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub types: Arc<TypeService>,
    pub nodes: Arc<NodeService>,
    pub paths: Arc<PathService>,

    /// Development persistent-user email (see `Settings::auth.persist_user`).
    pub persist_user: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<DocumentStore>, persist_user: Option<String>) -> Self {
        Self {
            auth: Arc::new(AuthService::new(store.clone())),
            types: Arc::new(TypeService::new(store.clone())),
            nodes: Arc::new(NodeService::new(store.clone())),
            paths: Arc::new(PathService::new(store)),
            persist_user,
        }
    }
}
