//! Normalization from raw store documents to [`catsync_core::Product`].
//!
//! Field coercion is delegated to [`crate::coerce`]; this module applies the
//! product schema and the admission rule. Normalization is a pure function
//! of the input document, so re-normalizing the same document always yields
//! the same product.

use catsync_core::{Product, UNNAMED_PRODUCT};
use catsync_store::RawDocument;
use serde_json::{Map, Value};

use crate::coerce::{
    to_count, to_discount, to_in_stock, to_number, to_original_price, to_string_list, to_text,
};
use crate::error::RecordRejected;

/// Admitted products from one listing plus the number of rejected records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    pub products: Vec<Product>,
    pub rejected: usize,
}

/// Normalizes a single raw document.
///
/// # Errors
///
/// Returns [`RecordRejected`] if the document body is not an object or the
/// resulting product has an empty name, a non-positive price, or no image.
pub fn normalize_document(doc: &RawDocument) -> Result<Product, RecordRejected> {
    let Value::Object(fields) = &doc.fields else {
        return Err(RecordRejected::NotAnObject {
            id: doc.id.clone(),
            found: json_kind(&doc.fields),
        });
    };
    let product = product_from_fields(&doc.id, fields);
    check_listable(&product)?;
    Ok(product)
}

/// Normalizes a full listing, dropping (and logging) every rejected record.
///
/// Input order is preserved for admitted products.
#[must_use]
pub fn normalize_batch(docs: &[RawDocument]) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        products: Vec::with_capacity(docs.len()),
        rejected: 0,
    };
    for doc in docs {
        match normalize_document(doc) {
            Ok(product) => batch.products.push(product),
            Err(reason) => {
                tracing::warn!(id = reason.id(), %reason, "dropping invalid product record");
                batch.rejected += 1;
            }
        }
    }
    batch
}

/// Builds a product from an object body without applying the admission rule.
pub(crate) fn product_from_fields(id: &str, fields: &Map<String, Value>) -> Product {
    Product {
        id: id.to_owned(),
        name: name_from(fields.get("name")),
        price: to_number(fields.get("price")),
        image: to_text(fields.get("image")).unwrap_or_default(),
        images: to_string_list(fields.get("images")),
        category: to_text(fields.get("category")).unwrap_or_default(),
        description: to_text(fields.get("description")).unwrap_or_default(),
        brand: to_text(fields.get("brand")).unwrap_or_default(),
        rating: to_number(fields.get("rating")),
        reviews: to_count(fields.get("reviews")),
        in_stock: to_in_stock(fields.get("inStock")),
        features: to_string_list(fields.get("features")),
        original_price: to_original_price(fields.get("originalPrice")),
        discount: to_discount(fields.get("discount")),
    }
}

/// An absent or non-text name gets the sentinel; an explicit empty string is
/// kept so the admission rule can reject it.
pub(crate) fn name_from(value: Option<&Value>) -> String {
    to_text(value).unwrap_or_else(|| UNNAMED_PRODUCT.to_owned())
}

/// Applies the admission rule to an already-coerced product.
pub(crate) fn check_listable(product: &Product) -> Result<(), RecordRejected> {
    if product.is_listable() {
        return Ok(());
    }
    let id = product.id.clone();
    if product.name.is_empty() {
        Err(RecordRejected::EmptyName { id })
    } else if product.price <= 0.0 {
        Err(RecordRejected::NonPositivePrice {
            id,
            price: product.price,
        })
    } else {
        Err(RecordRejected::MissingImage { id })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
