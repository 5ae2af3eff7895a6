//! Filter, search and sort over a catalog snapshot.
//!
//! [`apply`] is a pure function of `(catalog, query)`; [`QueryCache`] memoizes
//! its last result keyed on the snapshot identity and the full query state.

pub mod cache;
pub mod engine;
pub mod facets;
pub mod query;

pub use cache::QueryCache;
pub use engine::{apply, matches};
pub use facets::{FacetCount, Facets};
pub use query::{
    Filters, ParseQueryError, PriceRange, QueryState, SortBy, SortOrder, DEFAULT_MAX_PRICE,
    MAX_RATING,
};
