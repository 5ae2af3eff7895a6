//! `create`, `update` and `delete` commands, issued through the catalog
//! mutator. The live catalog picks the change up through its subscription.

use std::sync::Arc;

use catsync_store::DocumentStore;
use catsync_sync::CatalogMutator;
use serde_json::{Map, Value};

pub(crate) fn parse_fields(json: &str) -> anyhow::Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!(
            "--json must be a JSON object, got {}",
            match other {
                Value::Array(_) => "an array",
                Value::String(_) => "a string",
                Value::Number(_) => "a number",
                Value::Bool(_) => "a boolean",
                _ => "null",
            }
        ),
    }
}

/// # Errors
///
/// Returns an error if `json` is not an object, the product would not be
/// listable, or the store rejects the write.
pub(crate) async fn run_create(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    json: &str,
) -> anyhow::Result<()> {
    let fields = parse_fields(json)?;
    let id = CatalogMutator::new(store, collection).create(fields).await?;
    println!("created {id}");
    Ok(())
}

/// # Errors
///
/// Returns an error if `json` is not an object, holds no recognised field,
/// or the store rejects the write (including an unknown id).
pub(crate) async fn run_update(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    id: &str,
    json: &str,
) -> anyhow::Result<()> {
    let fields = parse_fields(json)?;
    CatalogMutator::new(store, collection)
        .update(id, fields)
        .await?;
    println!("updated {id}");
    Ok(())
}

/// # Errors
///
/// Returns an error if the store rejects the delete (including an unknown id).
pub(crate) async fn run_delete(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    id: &str,
) -> anyhow::Result<()> {
    CatalogMutator::new(store, collection).delete(id).await?;
    println!("deleted {id}");
    Ok(())
}
