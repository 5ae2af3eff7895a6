mod products;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use catsync_query::QueryCache;
use catsync_store::StoreError;
use catsync_sync::{CatalogMutator, MutationError, SyncManager, SyncPhase};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub sync: Arc<SyncManager>,
    pub mutator: CatalogMutator,
    pub cache: Arc<Mutex<QueryCache>>,
}

impl AppState {
    pub fn new(sync: Arc<SyncManager>, mutator: CatalogMutator) -> Self {
        Self {
            sync,
            mutator,
            cache: Arc::new(Mutex::new(QueryCache::new())),
        }
    }

    pub(super) fn cache(&self) -> MutexGuard<'_, QueryCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct HealthData {
    status: &'static str,
    phase: SyncPhase,
    loading: bool,
    error: Option<String>,
    product_count: usize,
    revision: u64,
    updated_at: Option<DateTime<Utc>>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "bad_gateway" => StatusCode::BAD_GATEWAY,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_mutation_error(request_id: String, error: &MutationError) -> ApiError {
    match error {
        MutationError::InvalidProduct(_)
        | MutationError::MissingId
        | MutationError::EmptyUpdate { .. } => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        MutationError::Store { source, .. } => match source {
            StoreError::NotFound { id, .. } => {
                ApiError::new(request_id, "not_found", format!("product {id} not found"))
            }
            StoreError::RateLimited { .. } => {
                ApiError::new(request_id, "rate_limited", error.to_string())
            }
            _ => {
                tracing::error!(error = %error, "document store mutation failed");
                ApiError::new(request_id, "bad_gateway", "document store request failed")
            }
        },
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/v1/facets", get(products::get_facets))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let phase = state.sync.phase();
    let catalog = state.sync.state();

    let (status_code, status) = match phase {
        SyncPhase::Degraded | SyncPhase::Disposed => {
            tracing::warn!(%phase, error = ?catalog.error, "health check: catalog sync degraded");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
        SyncPhase::Initializing | SyncPhase::Reloading => (StatusCode::OK, "loading"),
        SyncPhase::Subscribed => (StatusCode::OK, "ok"),
    };

    (
        status_code,
        Json(ApiResponse {
            data: HealthData {
                status,
                phase,
                loading: catalog.loading,
                product_count: catalog.len(),
                error: catalog.error,
                revision: catalog.revision,
                updated_at: catalog.updated_at,
            },
            meta,
        }),
    )
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
