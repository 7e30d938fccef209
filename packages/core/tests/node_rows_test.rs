//! Dynamic schema tests: node creation with keys, row insert/update/select,
//! and row drops against the monotonic row counter.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use onebase_core::db::DocumentStore;
use onebase_core::services::{KeyDraft, NodeService, ServiceError, TypeService};

struct Fixture {
    nodes: NodeService,
    types: TypeService,
    _temp_dir: TempDir,
}

async fn create_fixture() -> Result<Fixture> {
    let temp_dir = TempDir::new()?;
    let store = Arc::new(DocumentStore::new(temp_dir.path().join("test.db")).await?);
    Ok(Fixture {
        nodes: NodeService::new(store.clone()),
        types: TypeService::new(store),
        _temp_dir: temp_dir,
    })
}

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn people_node(fx: &Fixture) -> Result<onebase_core::models::Node> {
    let string = fx.types.create("string", "", true, None).await?;
    let integer = fx.types.create("integer", "", true, None).await?;
    let node = fx
        .nodes
        .create_node(
            "People",
            "Contact records",
            vec![
                KeyDraft {
                    name: "name".to_string(),
                    soft_type: string.id.clone(),
                    size: Some(64),
                },
                KeyDraft {
                    name: "age".to_string(),
                    soft_type: integer.id.clone(),
                    size: None,
                },
            ],
        )
        .await?;
    Ok(node)
}

#[tokio::test]
async fn test_create_node_with_ordered_keys() -> Result<()> {
    let fx = create_fixture().await?;
    let node = people_node(&fx).await?;

    assert_eq!(node.row_count, 0);
    let keys = fx.nodes.get_keys(&node).await?;
    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].name, "name");
    assert_eq!(keys[1].name, "age");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_key_names_rejected() -> Result<()> {
    let fx = create_fixture().await?;
    let string = fx.types.create("string", "", true, None).await?;

    let err = fx
        .nodes
        .create_node(
            "Broken",
            "",
            vec![
                KeyDraft {
                    name: "name".to_string(),
                    soft_type: string.id.clone(),
                    size: None,
                },
                KeyDraft {
                    name: "name".to_string(),
                    soft_type: string.id.clone(),
                    size: None,
                },
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateKeyName { .. }));
    Ok(())
}

#[tokio::test]
async fn test_unknown_type_rejected() -> Result<()> {
    let fx = create_fixture().await?;
    let err = fx
        .nodes
        .create_node(
            "Broken",
            "",
            vec![KeyDraft {
                name: "name".to_string(),
                soft_type: "no-such-type".to_string(),
                size: None,
            }],
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E-206");
    Ok(())
}

#[tokio::test]
async fn test_insert_rows_assigns_monotonic_indexes() -> Result<()> {
    let fx = create_fixture().await?;
    let node = people_node(&fx).await?;

    let row0 = fx
        .nodes
        .insert_row(&node, &values(&[("name", "Ada"), ("age", "36")]))
        .await?;
    assert_eq!(row0, 0);

    let node = fx.nodes.get(&node.id).await?;
    assert_eq!(node.row_count, 1);

    let row1 = fx
        .nodes
        .insert_row(&node, &values(&[("name", "Grace"), ("age", "45")]))
        .await?;
    assert_eq!(row1, 1);
    Ok(())
}

#[tokio::test]
async fn test_insert_rejects_invalid_value() -> Result<()> {
    let fx = create_fixture().await?;
    let node = people_node(&fx).await?;

    let err = fx
        .nodes
        .insert_row(&node, &values(&[("name", "Ada"), ("age", "not a number")]))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E-101");

    // Nothing was assigned.
    let node = fx.nodes.get(&node.id).await?;
    assert_eq!(node.row_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_select_pagination_window() -> Result<()> {
    let fx = create_fixture().await?;
    let mut node = people_node(&fx).await?;

    for i in 0..5 {
        fx.nodes
            .insert_row(
                &node,
                &values(&[("name", &format!("person-{i}")), ("age", "30")]),
            )
            .await?;
        node = fx.nodes.get(&node.id).await?;
    }

    let page = fx.nodes.select(&node, 1, 2).await?;
    assert_eq!(page.total, 5);
    assert_eq!(page.rows.len(), 2);
    assert_eq!(page.rows[0].row, 1);
    assert_eq!(page.rows[1].row, 2);
    assert_eq!(page.rows[0].values[0].as_deref(), Some("person-1"));
    Ok(())
}

#[tokio::test]
async fn test_update_row_in_place() -> Result<()> {
    let fx = create_fixture().await?;
    let node = people_node(&fx).await?;

    fx.nodes
        .insert_row(&node, &values(&[("name", "Ada"), ("age", "36")]))
        .await?;
    let node = fx.nodes.get(&node.id).await?;

    fx.nodes
        .update_row(&node, 0, &values(&[("name", "Ada Lovelace"), ("age", "36")]))
        .await?;

    let row = fx.nodes.row_values(&node, 0).await?;
    assert_eq!(row.get("name").map(String::as_str), Some("Ada Lovelace"));

    // Updating never bumps the counter.
    let node = fx.nodes.get(&node.id).await?;
    assert_eq!(node.row_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_update_row_out_of_range() -> Result<()> {
    let fx = create_fixture().await?;
    let node = people_node(&fx).await?;

    let err = fx
        .nodes
        .update_row(&node, 3, &values(&[("name", "x"), ("age", "1")]))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "E-209");
    Ok(())
}

#[tokio::test]
async fn test_drop_rows_leaves_counter_and_gaps() -> Result<()> {
    let fx = create_fixture().await?;
    let mut node = people_node(&fx).await?;

    for i in 0..3 {
        fx.nodes
            .insert_row(
                &node,
                &values(&[("name", &format!("person-{i}")), ("age", "30")]),
            )
            .await?;
        node = fx.nodes.get(&node.id).await?;
    }

    fx.nodes.drop_rows(&node, &[1]).await?;

    // Counter untouched, row 1 is now a gap.
    let node = fx.nodes.get(&node.id).await?;
    assert_eq!(node.row_count, 3);

    let page = fx.nodes.select(&node, 0, 100).await?;
    let rows: Vec<i64> = page.rows.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![0, 2]);

    // The next insert takes index 3, never reusing 1.
    let next = fx
        .nodes
        .insert_row(&node, &values(&[("name", "new"), ("age", "20")]))
        .await?;
    assert_eq!(next, 3);
    Ok(())
}

#[tokio::test]
async fn test_rows_preview_aligns_to_key_order() -> Result<()> {
    let fx = create_fixture().await?;
    let node = people_node(&fx).await?;

    fx.nodes
        .insert_row(&node, &values(&[("name", "Ada"), ("age", "36")]))
        .await?;
    let node = fx.nodes.get(&node.id).await?;

    let preview = fx.nodes.rows_preview(&node, &[0]).await?;
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].values[0].as_deref(), Some("Ada"));
    assert_eq!(preview[0].values[1].as_deref(), Some("36"));
    Ok(())
}
