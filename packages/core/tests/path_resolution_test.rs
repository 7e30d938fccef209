//! Path namespace tests: resolution, browsing, node attachment.

use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use onebase_core::db::DocumentStore;
use onebase_core::services::{KeyDraft, NodeService, PathService, ServiceError, TypeService};

struct Fixture {
    paths: PathService,
    nodes: NodeService,
    types: TypeService,
    _temp_dir: TempDir,
}

async fn create_fixture() -> Result<Fixture> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(DocumentStore::new(temp_dir.path().join("test.db")).await?);
    Ok(Fixture {
        paths: PathService::new(store.clone()),
        nodes: NodeService::new(store.clone()),
        types: TypeService::new(store),
        _temp_dir: temp_dir,
    })
}

async fn any_node(fx: &Fixture) -> Result<onebase_core::models::Node> {
    let string = fx.types.create("string", "", true, None).await?;
    let node = fx
        .nodes
        .create_node(
            "Contacts",
            "",
            vec![KeyDraft {
                name: "name".to_string(),
                soft_type: string.id,
                size: None,
            }],
        )
        .await?;
    Ok(node)
}

#[tokio::test]
async fn test_attach_creates_intermediate_segments() -> Result<()> {
    let fx = create_fixture().await?;
    let node = any_node(&fx).await?;

    let leaf = fx
        .paths
        .create_node_at_path("people/contacts", &node.id)
        .await?;
    assert_eq!(leaf.name, "contacts");
    assert_eq!(leaf.node.as_deref(), Some(node.id.as_str()));

    // Intermediate exists and carries no node.
    let people = fx.paths.find("people").await?.expect("people resolves");
    assert!(people.node.is_none());

    let resolved = fx.paths.find("people/contacts").await?.expect("resolves");
    assert_eq!(resolved.id, leaf.id);
    Ok(())
}

#[tokio::test]
async fn test_find_tolerates_slash_noise() -> Result<()> {
    let fx = create_fixture().await?;
    let node = any_node(&fx).await?;
    fx.paths.create_node_at_path("people/contacts", &node.id).await?;

    let resolved = fx.paths.find("/people//contacts/").await?;
    assert!(resolved.is_some());
    Ok(())
}

#[tokio::test]
async fn test_missing_segment_resolves_to_none() -> Result<()> {
    let fx = create_fixture().await?;
    assert!(fx.paths.find("no/such/path").await?.is_none());
    assert!(fx.paths.find("").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_children_listing() -> Result<()> {
    let fx = create_fixture().await?;
    let a = any_node(&fx).await?;
    fx.paths.create_node_at_path("people/contacts", &a.id).await?;

    let (current, roots) = fx.paths.children("").await?;
    assert!(current.is_none());
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].name, "people");

    let (current, children) = fx.paths.children("people").await?;
    assert!(current.is_some());
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].name, "contacts");
    Ok(())
}

#[tokio::test]
async fn test_empty_path_is_coded_error() -> Result<()> {
    let fx = create_fixture().await?;
    let node = any_node(&fx).await?;

    let err = fx.paths.create_node_at_path("  ", &node.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::MissingPath));
    assert_eq!(err.error_code(), "E-207");
    Ok(())
}

#[tokio::test]
async fn test_occupied_leaf_rejected() -> Result<()> {
    let fx = create_fixture().await?;
    let first = any_node(&fx).await?;
    fx.paths.create_node_at_path("people", &first.id).await?;

    let second = any_node_named(&fx, "Other").await?;
    let err = fx
        .paths
        .create_node_at_path("people", &second.id)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E-213");
    Ok(())
}

async fn any_node_named(fx: &Fixture, title: &str) -> Result<onebase_core::models::Node> {
    let string = fx.types.create(&format!("string-{title}"), "", true, None).await?;
    let node = fx
        .nodes
        .create_node(
            title,
            "",
            vec![KeyDraft {
                name: "name".to_string(),
                soft_type: string.id,
                size: None,
            }],
        )
        .await?;
    Ok(node)
}
