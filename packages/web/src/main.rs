//! 1Base web server binary.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use onebase_core::db::DocumentStore;
use onebase_web::{create_router, AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "onebase_web=debug,onebase_core=debug,tower_http=info".into()),
        )
        .init();

    let settings = Settings::new()?;

    let db_path = PathBuf::from(&settings.database.path);
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let store = Arc::new(DocumentStore::new(db_path).await?);

    let state = AppState::new(store, settings.auth.persist_user.clone());
    state.auth.ensure_admin(&settings.auth.admin_password).await?;

    if let Some(email) = &settings.auth.persist_user {
        tracing::warn!("persistent user enabled for {email}; development only");
    }

    let app = create_router(state, settings.auth.secure_cookies);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    tracing::info!("1Base web starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
