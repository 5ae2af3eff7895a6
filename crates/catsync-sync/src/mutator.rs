//! Create, update and delete operations against the product collection.
//!
//! Outgoing fields go through the same coercion as incoming documents, so a
//! written product always normalizes back to what was validated here.
//! Mutations never touch the published catalog directly; the change arrives
//! through the subscription like any other remote edit.

use std::sync::Arc;

use catsync_store::{DocumentStore, StoreError};
use serde_json::{Map, Value};

use crate::coerce::{
    number_value, to_count, to_discount, to_in_stock, to_number, to_original_price,
    to_string_list, to_text,
};
use crate::error::{MutationError, RecordRejected};
use crate::normalize::{check_listable, name_from, product_from_fields};

/// Field names the product schema recognises.
pub const PRODUCT_FIELDS: [&str; 13] = [
    "name",
    "price",
    "image",
    "images",
    "category",
    "description",
    "brand",
    "rating",
    "reviews",
    "inStock",
    "features",
    "originalPrice",
    "discount",
];

#[derive(Clone)]
pub struct CatalogMutator {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl CatalogMutator {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Validates and writes a new product, returning its store-assigned id.
    ///
    /// Missing optional fields are filled with their defaults; an `id` key in
    /// `fields` is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::InvalidProduct`] if the coerced product would
    /// not be admitted to the catalog, or [`MutationError::Store`] if the
    /// write fails.
    pub async fn create(&self, fields: Map<String, Value>) -> Result<String, MutationError> {
        let product = product_from_fields("", &fields);
        check_listable(&product)?;

        let body: Map<String, Value> = PRODUCT_FIELDS
            .iter()
            .filter_map(|key| {
                coerce_field(key, fields.get(*key))
                    .filter(|value| !value.is_null())
                    .map(|value| ((*key).to_owned(), value))
            })
            .collect();
        let id = self
            .store
            .create(&self.collection, body)
            .await
            .map_err(|source| self.store_error("create", source))?;
        tracing::info!(
            collection = %self.collection,
            id = %id,
            name = %product.name,
            "created product"
        );
        Ok(id)
    }

    /// Applies a partial update. Only recognised fields present in `fields`
    /// are written; unknown keys are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::MissingId`] for a blank id,
    /// [`MutationError::EmptyUpdate`] if no recognised field is present,
    /// [`MutationError::InvalidProduct`] if the patch would blank the name or
    /// image or make the price non-positive, or [`MutationError::Store`] if the
    /// write fails (including a missing document).
    pub async fn update(&self, id: &str, fields: Map<String, Value>) -> Result<(), MutationError> {
        if id.trim().is_empty() {
            return Err(MutationError::MissingId);
        }
        let patch = coerce_patch(id, &fields)?;
        let written: Vec<&str> = patch.keys().map(String::as_str).collect();
        tracing::debug!(collection = %self.collection, id, fields = ?written, "updating product");
        self.store
            .update(&self.collection, id, patch)
            .await
            .map_err(|source| self.store_error("update", source))?;
        tracing::info!(collection = %self.collection, id, "updated product");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`MutationError::MissingId`] for a blank id or
    /// [`MutationError::Store`] if the delete fails (including a missing
    /// document).
    pub async fn delete(&self, id: &str) -> Result<(), MutationError> {
        if id.trim().is_empty() {
            return Err(MutationError::MissingId);
        }
        self.store
            .delete(&self.collection, id)
            .await
            .map_err(|source| self.store_error("delete", source))?;
        tracing::info!(collection = %self.collection, id, "deleted product");
        Ok(())
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn store_error(&self, operation: &'static str, source: StoreError) -> MutationError {
        MutationError::Store {
            operation,
            collection: self.collection.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for CatalogMutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogMutator")
            .field("collection", &self.collection)
            .finish_non_exhaustive()
    }
}

/// Coerces the recognised keys of a partial update and validates the ones
/// that participate in the admission rule.
fn coerce_patch(
    id: &str,
    fields: &Map<String, Value>,
) -> Result<Map<String, Value>, MutationError> {
    let mut patch = Map::new();
    for (key, raw) in fields {
        let Some(known) = PRODUCT_FIELDS.iter().find(|k| **k == key.as_str()) else {
            tracing::debug!(id, key = %key, "ignoring unknown product field");
            continue;
        };
        if let Some(value) = coerce_field(known, Some(raw)) {
            patch.insert((*known).to_owned(), value);
        }
    }
    if patch.is_empty() {
        return Err(MutationError::EmptyUpdate { id: id.to_owned() });
    }

    if let Some(name) = patch.get("name").and_then(Value::as_str) {
        if name.is_empty() {
            return Err(RecordRejected::EmptyName { id: id.to_owned() }.into());
        }
    }
    if let Some(price) = patch.get("price").and_then(Value::as_f64) {
        if price <= 0.0 {
            return Err(RecordRejected::NonPositivePrice {
                id: id.to_owned(),
                price,
            }
            .into());
        }
    }
    if let Some(image) = patch.get("image").and_then(Value::as_str) {
        if image.is_empty() {
            return Err(RecordRejected::MissingImage { id: id.to_owned() }.into());
        }
    }
    Ok(patch)
}

/// Coerces one field to its stored JSON shape. `Null` marks a field to be
/// cleared; `None` means the key is not part of the schema.
fn coerce_field(key: &str, value: Option<&Value>) -> Option<Value> {
    let coerced = match key {
        "name" => Value::String(name_from(value)),
        "price" => number_value(to_number(value)),
        "image" | "category" | "description" | "brand" => {
            Value::String(to_text(value).unwrap_or_default())
        }
        "images" | "features" => Value::from(to_string_list(value)),
        "rating" => number_value(to_number(value)),
        "reviews" => Value::from(to_count(value)),
        "inStock" => Value::Bool(to_in_stock(value)),
        "originalPrice" => to_original_price(value).map_or(Value::Null, number_value),
        "discount" => to_discount(value).map_or(Value::Null, Value::Object),
        _ => return None,
    };
    Some(coerced)
}
