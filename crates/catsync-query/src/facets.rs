use std::collections::BTreeMap;

use catsync_core::Product;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub value: String,
    pub count: usize,
}

/// Summary of a catalog used to populate filter controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Facets {
    /// Non-empty categories, alphabetical.
    pub categories: Vec<FacetCount>,
    /// Non-empty brands, alphabetical.
    pub brands: Vec<FacetCount>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: usize,
    pub total: usize,
}

impl Facets {
    #[must_use]
    pub fn from_catalog(catalog: &[Product]) -> Self {
        let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
        let mut brands: BTreeMap<&str, usize> = BTreeMap::new();
        let mut facets = Self {
            total: catalog.len(),
            ..Self::default()
        };

        for product in catalog {
            if !product.category.is_empty() {
                *categories.entry(product.category.as_str()).or_default() += 1;
            }
            if product.has_brand() {
                *brands.entry(product.brand.as_str()).or_default() += 1;
            }
            if product.in_stock {
                facets.in_stock += 1;
            }
            let price = product.price;
            facets.min_price = Some(facets.min_price.map_or(price, |m| m.min(price)));
            facets.max_price = Some(facets.max_price.map_or(price, |m| m.max(price)));
        }

        facets.categories = to_counts(categories);
        facets.brands = to_counts(brands);
        facets
    }
}

fn to_counts(map: BTreeMap<&str, usize>) -> Vec<FacetCount> {
    map.into_iter()
        .map(|(value, count)| FacetCount {
            value: value.to_owned(),
            count,
        })
        .collect()
}
