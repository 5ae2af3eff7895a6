use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Display name given to records whose source document carries no name.
pub const UNNAMED_PRODUCT: &str = "Unnamed Product";

/// Free-form promotional payload attached to a product, passed through from
/// the store untouched.
pub type Discount = serde_json::Map<String, serde_json::Value>;

/// The complete set of admitted products at one point in time.
///
/// Snapshots are replaced wholesale on every successful sync; they are never
/// patched in place.
pub type CatalogSnapshot = Arc<[Product]>;

/// A catalog entry after normalization from a raw store document.
///
/// Serialized field names follow the store's camelCase convention so the
/// same shape can be written back on mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned document id, stable for the lifetime of the document.
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Primary image reference (usually a URL).
    pub image: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    /// Average review score, nominally `0.0..=5.0` but not enforced.
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub reviews: u64,
    pub in_stock: bool,
    #[serde(default)]
    pub features: Vec<String>,
    /// Pre-sale comparison price.
    ///
    /// A stored value of `0` is indistinguishable from "absent" and is
    /// normalized to `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<Discount>,
}

impl Product {
    /// Returns `true` if the product may appear in the published catalog:
    /// a non-empty name, a positive price, and a non-empty primary image.
    /// Whitespace counts as content.
    #[must_use]
    pub fn is_listable(&self) -> bool {
        !self.name.is_empty() && self.price > 0.0 && !self.image.is_empty()
    }

    /// Amount saved against `original_price`, if the product is on sale.
    #[must_use]
    pub fn savings(&self) -> Option<f64> {
        self.original_price
            .filter(|original| *original > self.price)
            .map(|original| original - self.price)
    }

    /// Whole-number percentage saved against `original_price`.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u8> {
        let original = self.original_price?;
        let savings = self.savings()?;
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss
        )]
        let pct = ((savings / original) * 100.0).round().clamp(0.0, 100.0) as u8;
        Some(pct)
    }

    /// Returns `true` if the product has a brand set.
    #[must_use]
    pub fn has_brand(&self) -> bool {
        !self.brand.is_empty()
    }
}
