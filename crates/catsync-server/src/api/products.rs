//! Catalog read handlers (query, detail, facets) and write handlers that go
//! through the catalog mutator.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use catsync_core::Product;
use catsync_query::{Facets, QueryState, SortBy, SortOrder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::middleware::RequestId;

use super::{map_mutation_error, ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProductQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Comma-separated brand names.
    pub brand: Option<String>,
    pub min_rating: Option<f64>,
    pub in_stock: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductListData {
    items: Vec<Product>,
    total: usize,
    catalog_total: usize,
    active_filters: usize,
    revision: u64,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductIdData {
    id: String,
}

impl ProductQuery {
    /// Maps request parameters onto a query state; numeric values are
    /// clamped by the setters, unknown sort keys are rejected.
    fn into_state(self, req_id: &str) -> Result<QueryState, ApiError> {
        let mut state = QueryState::new();
        if let Some(q) = self.q {
            state.set_search(q);
        }
        if let Some(category) = self.category {
            state.set_category(category.trim());
        }
        if self.min_price.is_some() || self.max_price.is_some() {
            let defaults = state.filters.price_range;
            state.set_price_range(
                self.min_price.unwrap_or(defaults.min),
                self.max_price.unwrap_or(defaults.max),
            );
        }
        if let Some(brands) = self.brand {
            state.set_brands(brands.split(',').map(str::trim));
        }
        if let Some(rating) = self.min_rating {
            state.set_min_rating(rating);
        }
        if let Some(in_stock) = self.in_stock {
            state.set_in_stock_only(in_stock);
        }
        let sort_by = self
            .sort_by
            .as_deref()
            .map(str::parse::<SortBy>)
            .transpose()
            .map_err(|e| ApiError::new(req_id, "validation_error", e.to_string()))?
            .unwrap_or_default();
        let sort_order = self
            .sort_order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()
            .map_err(|e| ApiError::new(req_id, "validation_error", e.to_string()))?
            .unwrap_or_default();
        state.set_sort(sort_by, sort_order);
        Ok(state)
    }
}

fn object_body(req_id: &str, body: Value) -> Result<Map<String, Value>, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        _ => Err(ApiError::new(
            req_id,
            "validation_error",
            "request body must be a JSON object",
        )),
    }
}

// ---------------------------------------------------------------------------
// Read handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/products: filtered, searched and sorted catalog view.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    let query = query.into_state(&req_id.0)?;
    let catalog = state.sync.state();
    let result = state.cache().get_or_compute(&catalog.products, &query);

    Ok(Json(ApiResponse {
        data: ProductListData {
            items: result.to_vec(),
            total: result.len(),
            catalog_total: catalog.len(),
            active_filters: query.active_filter_count(),
            revision: catalog.revision,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/products/{id}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let catalog = state.sync.state();
    let Some(product) = catalog.product(&id).cloned() else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("product {id} not found"),
        ));
    };
    Ok(Json(ApiResponse {
        data: product,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/facets: values for building filter controls.
pub(super) async fn get_facets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Facets>> {
    let catalog = state.sync.state();
    Json(ApiResponse {
        data: Facets::from_catalog(&catalog.products),
        meta: ResponseMeta::new(req_id.0),
    })
}

// ---------------------------------------------------------------------------
// Write handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/products: create a product; it appears in the catalog once
/// the store reports the change.
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<ApiResponse<ProductIdData>>), ApiError> {
    let fields = object_body(&req_id.0, body)?;
    let id = state
        .mutator
        .create(fields)
        .await
        .map_err(|e| map_mutation_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductIdData { id },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// PATCH /api/v1/products/{id}: sparse update of recognised fields.
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ApiResponse<ProductIdData>>, ApiError> {
    let fields = object_body(&req_id.0, body)?;
    state
        .mutator
        .update(&id, fields)
        .await
        .map_err(|e| map_mutation_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductIdData { id },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductIdData>>, ApiError> {
    state
        .mutator
        .delete(&id)
        .await
        .map_err(|e| map_mutation_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductIdData { id },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_maps_to_default_state() {
        let state = ProductQuery::default().into_state("req").unwrap();
        assert_eq!(state, QueryState::new());
    }

    #[test]
    fn one_sided_price_bound_keeps_the_other_default() {
        let state = ProductQuery {
            min_price: Some(20.0),
            ..ProductQuery::default()
        }
        .into_state("req")
        .unwrap();
        assert!((state.filters.price_range.min - 20.0).abs() < f64::EPSILON);
        assert!((state.filters.price_range.max - 9999.0).abs() < f64::EPSILON);
    }

    #[test]
    fn brand_list_is_split_and_trimmed() {
        let state = ProductQuery {
            brand: Some("Stride, Peak,,".to_owned()),
            ..ProductQuery::default()
        }
        .into_state("req")
        .unwrap();
        let brands: Vec<&str> = state.filters.brands.iter().map(String::as_str).collect();
        assert_eq!(brands, vec!["Peak", "Stride"]);
    }

    #[test]
    fn unknown_sort_key_is_a_validation_error() {
        let err = ProductQuery {
            sort_by: Some("popularity".to_owned()),
            ..ProductQuery::default()
        }
        .into_state("req")
        .unwrap_err();
        assert_eq!(err.error.code, "validation_error");
    }
}
