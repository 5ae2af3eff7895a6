use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound of the default price range.
pub const DEFAULT_MAX_PRICE: f64 = 9999.0;

/// Highest meaningful rating threshold.
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} \"{value}\" (expected one of: {expected})")]
pub struct ParseQueryError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: DEFAULT_MAX_PRICE,
        }
    }
}

impl PriceRange {
    /// Builds a range, clamping negative or NaN bounds and swapping an
    /// inverted pair.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        let min = if min.is_nan() { 0.0 } else { min.max(0.0) };
        let max = if max.is_nan() {
            DEFAULT_MAX_PRICE
        } else {
            max.max(0.0)
        };
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }

    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    /// Exact category match; empty means any.
    pub category: String,
    pub price_range: PriceRange,
    /// Allowed brands; empty means any. Products without a brand always pass.
    pub brands: BTreeSet<String>,
    /// Minimum rating; `0` disables the filter.
    pub min_rating: f64,
    pub in_stock_only: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Name,
    Price,
    Rating,
}

impl SortBy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Rating => "rating",
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ParseQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "rating" => Ok(Self::Rating),
            _ => Err(ParseQueryError {
                kind: "sort key",
                value: s.to_owned(),
                expected: "name, price, rating",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ParseQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseQueryError {
                kind: "sort order",
                value: s.to_owned(),
                expected: "asc, desc",
            }),
        }
    }
}

/// Full input of a catalog query besides the catalog itself.
///
/// Never touched by the sync pipeline; only the setters below (or a caller
/// building one from request parameters) change it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryState {
    pub search: String,
    pub filters: Filters,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

impl QueryState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.filters.category = category.into();
    }

    pub fn set_price_range(&mut self, min: f64, max: f64) {
        self.filters.price_range = PriceRange::new(min, max);
    }

    /// Adds `brand` to the allowed set, or removes it if already present.
    pub fn toggle_brand(&mut self, brand: &str) {
        if !self.filters.brands.remove(brand) {
            self.filters.brands.insert(brand.to_owned());
        }
    }

    pub fn set_brands<I, S>(&mut self, brands: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.brands = brands
            .into_iter()
            .map(Into::into)
            .filter(|b: &String| !b.trim().is_empty())
            .collect();
    }

    /// Sets the rating threshold, clamped to `0..=5` (NaN disables it).
    pub fn set_min_rating(&mut self, rating: f64) {
        self.filters.min_rating = clamp_rating(rating);
    }

    pub fn set_in_stock_only(&mut self, in_stock_only: bool) {
        self.filters.in_stock_only = in_stock_only;
    }

    pub fn set_sort(&mut self, sort_by: SortBy, sort_order: SortOrder) {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
    }

    pub fn toggle_sort_order(&mut self) {
        self.sort_order = self.sort_order.reversed();
    }

    /// Clears every filter; search and sort are kept.
    pub fn reset_filters(&mut self) {
        self.filters = Filters::default();
    }

    /// Number of filters that currently constrain the result.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        let f = &self.filters;
        [
            !f.category.is_empty(),
            !f.price_range.is_default(),
            !f.brands.is_empty(),
            f.min_rating > 0.0,
            f.in_stock_only,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Returns the state with every field passed through its setter's
    /// clamping, for states built from untrusted input.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        let range = self.filters.price_range;
        self.filters.price_range = PriceRange::new(range.min, range.max);
        self.filters.min_rating = clamp_rating(self.filters.min_rating);
        self.filters.brands.retain(|b| !b.trim().is_empty());
        self
    }
}

fn clamp_rating(rating: f64) -> f64 {
    if rating.is_nan() {
        0.0
    } else {
        rating.clamp(0.0, MAX_RATING)
    }
}
