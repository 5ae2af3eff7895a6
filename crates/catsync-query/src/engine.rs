//! Pure filter/sort evaluation over a catalog snapshot.

use std::cmp::Ordering;

use catsync_core::Product;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::query::{Filters, QueryState, SortBy, SortOrder};

/// Returns the products of `catalog` matching every active filter, ordered
/// by the query's sort key.
///
/// The sort is stable and a descending order reverses the comparator, so
/// products with equal keys keep their catalog order in both directions.
#[must_use]
pub fn apply(catalog: &[Product], query: &QueryState) -> Vec<Product> {
    let needle = search_needle(&query.search);
    let mut result: Vec<Product> = catalog
        .iter()
        .filter(|p| matches_search(p, needle.as_deref()) && matches_filters(p, &query.filters))
        .cloned()
        .collect();

    let sort_by = query.sort_by;
    match query.sort_order {
        SortOrder::Asc => result.sort_by(|a, b| compare(a, b, sort_by)),
        SortOrder::Desc => result.sort_by(|a, b| compare(b, a, sort_by)),
    }
    result
}

/// Returns `true` if `product` satisfies the search and every active filter.
#[must_use]
pub fn matches(product: &Product, query: &QueryState) -> bool {
    matches_search(product, search_needle(&query.search).as_deref())
        && matches_filters(product, &query.filters)
}

/// The search text is matched as given, surrounding spaces included; only
/// an empty string disables it.
fn search_needle(search: &str) -> Option<String> {
    (!search.is_empty()).then(|| search.to_lowercase())
}

fn matches_search(product: &Product, needle: Option<&str>) -> bool {
    let Some(needle) = needle else {
        return true;
    };
    [&product.name, &product.brand, &product.description]
        .into_iter()
        .any(|field| !field.is_empty() && field.to_lowercase().contains(needle))
}

fn matches_filters(product: &Product, filters: &Filters) -> bool {
    if !filters.category.is_empty() && product.category != filters.category {
        return false;
    }
    if !filters.price_range.contains(product.price) {
        return false;
    }
    // Brandless products are never excluded by the brand filter.
    if !filters.brands.is_empty()
        && product.has_brand()
        && !filters.brands.contains(&product.brand)
    {
        return false;
    }
    if filters.min_rating > 0.0 && product.rating < filters.min_rating {
        return false;
    }
    !filters.in_stock_only || product.in_stock
}

fn compare(a: &Product, b: &Product, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Name => compare_names(&a.name, &b.name),
        SortBy::Price => a.price.total_cmp(&b.price),
        SortBy::Rating => a.rating.total_cmp(&b.rating),
    }
}

/// Accent- and case-insensitive ordering: names compare on their base
/// letters first ("éclair" next to "eclair", before "fig"), then on the
/// lowercased text, then on the raw text.
///
/// This is a root-locale approximation, not tailored collation; letters a
/// language sorts specially (Swedish "å" after "z", say) fall in with their
/// base letter.
fn compare_names(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| lowercase(a).cmp(lowercase(b)))
        .then_with(|| a.cmp(b))
}

fn base_letters(name: &str) -> impl Iterator<Item = char> + '_ {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase(name: &str) -> impl Iterator<Item = char> + '_ {
    name.chars().flat_map(char::to_lowercase)
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
