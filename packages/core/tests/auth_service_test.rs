//! Account lifecycle tests: register → verify → authenticate, plus the
//! admin bootstrap.

use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use onebase_core::db::DocumentStore;
use onebase_core::models::permissions;
use onebase_core::services::{AuthService, ServiceError, ADMIN_EMAIL};

async fn create_test_service() -> Result<(AuthService, Arc<DocumentStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(DocumentStore::new(temp_dir.path().join("test.db")).await?);
    Ok((AuthService::new(store.clone()), store, temp_dir))
}

#[tokio::test]
async fn test_register_verify_authenticate_flow() -> Result<()> {
    let (auth, _store, _temp_dir) = create_test_service().await?;

    let user = auth.register("user@example.com", "hunter2").await?;
    assert!(!user.is_active);
    assert!(!user.verification.is_empty());

    // Unverified accounts cannot log in.
    let err = auth.authenticate("user@example.com", "hunter2").await.unwrap_err();
    assert_eq!(err.error_code(), "E-203");

    let verified = auth.verify(&user.verification).await?;
    assert!(verified.is_active);

    let logged_in = auth.authenticate("user@example.com", "hunter2").await?;
    assert_eq!(logged_in.id, user.id);
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() -> Result<()> {
    let (auth, _store, _temp_dir) = create_test_service().await?;

    let user = auth.register("user@example.com", "hunter2").await?;
    auth.verify(&user.verification).await?;

    let err = auth.authenticate("user@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.error_code(), "E-202");

    let err = auth.authenticate("nobody@example.com", "hunter2").await.unwrap_err();
    assert_eq!(err.error_code(), "E-202");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_rejected() -> Result<()> {
    let (auth, _store, _temp_dir) = create_test_service().await?;

    auth.register("user@example.com", "one").await?;
    let err = auth.register("user@example.com", "two").await.unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateEmail { .. }));
    assert_eq!(err.error_code(), "E-204");
    Ok(())
}

#[tokio::test]
async fn test_invalid_verification_token() -> Result<()> {
    let (auth, _store, _temp_dir) = create_test_service().await?;

    let err = auth.verify("no-such-token").await.unwrap_err();
    assert_eq!(err.error_code(), "E-205");
    Ok(())
}

#[tokio::test]
async fn test_admin_bootstrap_is_idempotent() -> Result<()> {
    let (auth, store, _temp_dir) = create_test_service().await?;

    auth.ensure_admin("secret").await?;
    auth.ensure_admin("secret").await?;

    let admin = store
        .user_by_email(ADMIN_EMAIL)
        .await?
        .expect("admin exists");
    assert!(admin.is_active);

    let loaded = auth.load(&admin.id).await?.expect("admin loads");
    assert!(loaded.can_all(&permissions::ALL));

    // The admin can log in with the bootstrap password.
    let logged_in = auth.authenticate(ADMIN_EMAIL, "secret").await?;
    assert_eq!(logged_in.id, admin.id);
    Ok(())
}

#[tokio::test]
async fn test_load_unknown_user_is_none() -> Result<()> {
    let (auth, _store, _temp_dir) = create_test_service().await?;
    assert!(auth.load("stale-session-id").await?.is_none());
    Ok(())
}
