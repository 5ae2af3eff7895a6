//! `query` command: loads the catalog once and prints the query result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use catsync_core::Product;
use catsync_query::{QueryState, SortBy, SortOrder};
use catsync_store::DocumentStore;
use catsync_sync::SyncManager;
use clap::Args;

#[derive(Debug, Default, Args)]
pub struct QueryArgs {
    /// Case-insensitive text matched against name, brand and description
    #[arg(long)]
    pub search: Option<String>,
    /// Exact category name
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub min_price: Option<f64>,
    #[arg(long)]
    pub max_price: Option<f64>,
    /// Allowed brand; repeat the flag for several
    #[arg(long = "brand")]
    pub brands: Vec<String>,
    /// Minimum rating, 0 to 5
    #[arg(long)]
    pub min_rating: Option<f64>,
    /// Only show products in stock
    #[arg(long)]
    pub in_stock: bool,
    /// Sort key: name, price or rating
    #[arg(long)]
    pub sort_by: Option<SortBy>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// YAML query state used as the base; flags override it
    #[arg(long)]
    pub query_file: Option<PathBuf>,
    /// Print the result as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Runs one query against a freshly loaded catalog.
///
/// # Errors
///
/// Returns an error if the query file cannot be read or parsed, or if the
/// catalog could not be loaded at all.
pub(crate) async fn run_query(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    args: &QueryArgs,
) -> anyhow::Result<()> {
    let base = match &args.query_file {
        Some(path) => load_query_file(path)?,
        None => QueryState::new(),
    };
    let query = build_query_state(base, args);
    let products = fetch_query_result(store, collection, &query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&products)?);
    } else {
        print!("{}", render_table(&products));
        println!(
            "{} matching products ({} active filters)",
            products.len(),
            query.active_filter_count()
        );
    }
    Ok(())
}

fn load_query_file(path: &Path) -> anyhow::Result<QueryState> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read query file {}", path.display()))?;
    parse_query_file(&contents).with_context(|| format!("invalid query file {}", path.display()))
}

pub(crate) fn parse_query_file(contents: &str) -> anyhow::Result<QueryState> {
    let state: QueryState = serde_yaml::from_str(contents)?;
    Ok(state.sanitized())
}

/// Applies command-line flags on top of `base`.
pub(crate) fn build_query_state(base: QueryState, args: &QueryArgs) -> QueryState {
    let mut state = base;
    if let Some(search) = &args.search {
        state.set_search(search.as_str());
    }
    if let Some(category) = &args.category {
        state.set_category(category.trim());
    }
    if args.min_price.is_some() || args.max_price.is_some() {
        let current = state.filters.price_range;
        state.set_price_range(
            args.min_price.unwrap_or(current.min),
            args.max_price.unwrap_or(current.max),
        );
    }
    if !args.brands.is_empty() {
        state.set_brands(args.brands.iter().map(|b| b.trim()));
    }
    if let Some(rating) = args.min_rating {
        state.set_min_rating(rating);
    }
    if args.in_stock {
        state.set_in_stock_only(true);
    }
    let sort_by = args.sort_by.unwrap_or(state.sort_by);
    let sort_order = if args.desc {
        SortOrder::Desc
    } else {
        state.sort_order
    };
    state.set_sort(sort_by, sort_order);
    state
}

/// Waits for the first loaded snapshot, disposes the manager and evaluates
/// `query` against it.
///
/// # Errors
///
/// Returns an error when the load failed and left no products to query.
pub(crate) async fn fetch_query_result(
    store: Arc<dyn DocumentStore>,
    collection: &str,
    query: &QueryState,
) -> anyhow::Result<Vec<Product>> {
    let sync = SyncManager::start(store, collection);
    let state = sync.wait_until_loaded().await;
    sync.dispose();

    if let Some(error) = &state.error {
        if state.is_empty() {
            anyhow::bail!("catalog could not be loaded: {error}");
        }
        tracing::warn!(error = %error, "catalog loaded with a sync error; results may be stale");
    }
    Ok(catsync_query::apply(&state.products, query))
}

pub(crate) fn render_table(products: &[Product]) -> String {
    use std::fmt::Write as _;

    if products.is_empty() {
        return "no products match the query\n".to_string();
    }
    let mut out = format!(
        "{:<14}{:<32}{:<16}{:>10}{:>8}  STOCK\n",
        "ID", "NAME", "BRAND", "PRICE", "RATING"
    );
    for product in products {
        let brand = if product.has_brand() {
            product.brand.as_str()
        } else {
            "\u{2014}"
        };
        let stock = if product.in_stock { "yes" } else { "no" };
        let _ = writeln!(
            out,
            "{:<14}{:<32}{:<16}{:>10.2}{:>8.1}  {stock}",
            truncate(&product.id, 12),
            truncate(&product.name, 30),
            truncate(brand, 14),
            product.price,
            product.rating,
        );
    }
    out
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}...", value.chars().take(max_chars - 3).collect::<String>())
    } else {
        value.to_string()
    }
}

