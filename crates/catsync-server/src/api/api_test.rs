use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use catsync_store::MemoryStore;
use serde_json::json;
use tower::ServiceExt;

const COLLECTION: &str = "products";

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.put_document(
        COLLECTION,
        "shoe",
        json!({
            "name": "Running Shoe",
            "price": 89.99,
            "image": "shoe.jpg",
            "category": "Footwear",
            "brand": "Stride",
            "rating": 4.6
        }),
    );
    store.put_document(
        COLLECTION,
        "sock",
        json!({
            "name": "Wool Sock",
            "price": 12,
            "image": "sock.jpg",
            "category": "Footwear",
            "brand": "Knit Co",
            "rating": 4.1,
            "inStock": false
        }),
    );
    store.put_document(
        COLLECTION,
        "hat",
        json!({"name": "Bucket Hat", "price": 25, "image": "hat.jpg", "category": "Accessories"}),
    );
    store
}

/// Starts a sync manager and waits until both the subscription snapshot and
/// the initial fetch have been published, so the snapshot stays put.
async fn started_sync(store: &MemoryStore) -> Arc<SyncManager> {
    let sync = Arc::new(SyncManager::start(Arc::new(store.clone()), COLLECTION));
    let mut rx = sync.watch();
    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        rx.wait_for(|s| s.revision >= 2 && !s.loading),
    )
    .await
    .expect("timed out waiting for initial sync")
    .expect("channel closed");
    sync
}

async fn app_for(store: &MemoryStore) -> (Router, Arc<SyncManager>) {
    let sync = started_sync(store).await;
    let mutator = CatalogMutator::new(Arc::new(store.clone()), COLLECTION);
    (build_app(AppState::new(Arc::clone(&sync), mutator)), sync)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).expect("json parse")
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn with_json(method: Method, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn names(json: &serde_json::Value) -> Vec<&str> {
    json["data"]["items"]
        .as_array()
        .expect("items array")
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect()
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_bad_gateway_maps_to_502() {
    let response = ApiError::new("req-1", "bad_gateway", "store down").into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_subscribed_catalog() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-health")
    );

    let (_, json) = send(&app, get("/api/v1/health")).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["phase"], "subscribed");
    assert_eq!(json["data"]["product_count"], 3);
    assert!(json["data"]["error"].is_null());
}

#[tokio::test]
async fn health_is_503_when_degraded() {
    let store = seeded_store();
    store.fail_subscribes("listen refused");
    store.fail_lists("backend offline");
    let (app, _sync) = app_for(&store).await;

    let (status, json) = send(&app, get("/api/v1/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["data"]["status"], "degraded");
    assert!(json["data"]["error"]
        .as_str()
        .is_some_and(|e| e.contains("backend offline")));
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_products_defaults_to_name_order() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;

    let (status, json) = send(&app, get("/api/v1/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&json), vec!["Bucket Hat", "Running Shoe", "Wool Sock"]);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["active_filters"], 0);
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn list_products_applies_filters_and_sort() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;

    let (_, json) = send(
        &app,
        get("/api/v1/products?category=Footwear&sort_by=price&sort_order=desc"),
    )
    .await;
    assert_eq!(names(&json), vec!["Running Shoe", "Wool Sock"]);

    let (_, json) = send(&app, get("/api/v1/products?in_stock=true&brand=Stride")).await;
    assert_eq!(names(&json), vec!["Bucket Hat", "Running Shoe"]);
    assert_eq!(json["data"]["active_filters"], 2);

    let (_, json) = send(&app, get("/api/v1/products?q=SHOE")).await;
    assert_eq!(names(&json), vec!["Running Shoe"]);

    let (_, json) = send(&app, get("/api/v1/products?min_price=20&max_price=30")).await;
    assert_eq!(names(&json), vec!["Bucket Hat"]);
}

#[tokio::test]
async fn list_products_rejects_unknown_sort_key() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;

    let (status, json) = send(&app, get("/api/v1/products?sort_by=popularity")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn repeated_queries_hit_the_cache() {
    let store = seeded_store();
    let sync = started_sync(&store).await;
    let state = AppState::new(
        Arc::clone(&sync),
        CatalogMutator::new(Arc::new(store.clone()), COLLECTION),
    );
    let app = build_app(state.clone());

    send(&app, get("/api/v1/products?q=hat")).await;
    send(&app, get("/api/v1/products?q=hat")).await;
    assert_eq!(state.cache().hits(), 1);
    assert_eq!(state.cache().misses(), 1);
}

#[tokio::test]
async fn get_product_returns_detail_or_404() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;

    let (status, json) = send(&app, get("/api/v1/products/shoe")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Running Shoe");
    assert_eq!(json["data"]["inStock"], true);

    let (status, json) = send(&app, get("/api/v1/products/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn facets_summarise_the_catalog() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;

    let (status, json) = send(&app, get("/api/v1/facets")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["in_stock"], 2);
    assert_eq!(json["data"]["categories"][0]["value"], "Accessories");
    assert_eq!(json["data"]["brands"].as_array().map(Vec::len), Some(2));
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_product_is_visible_after_sync() {
    let store = seeded_store();
    let (app, sync) = app_for(&store).await;

    let (status, json) = send(
        &app,
        with_json(
            Method::POST,
            "/api/v1/products",
            &json!({"name": "Rain Jacket", "price": "140", "image": "jacket.jpg"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = json["data"]["id"].as_str().expect("id").to_owned();

    let mut rx = sync.watch();
    tokio::time::timeout(
        std::time::Duration::from_secs(2),
        rx.wait_for(|s| s.product(&id).is_some()),
    )
    .await
    .expect("timed out")
    .expect("channel closed");

    let (status, json) = send(&app, get(&format!("/api/v1/products/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["price"], 140.0);
}

#[tokio::test]
async fn create_product_rejects_invalid_fields() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;

    let (status, json) = send(
        &app,
        with_json(
            Method::POST,
            "/api/v1/products",
            &json!({"name": "Freebie", "price": 0, "image": "f.jpg"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _) = send(
        &app,
        with_json(Method::POST, "/api/v1/products", &json!(["not", "an", "object"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(store.len(COLLECTION), 3);
}

#[tokio::test]
async fn update_product_patches_known_fields() {
    let store = seeded_store();
    let (app, sync) = app_for(&store).await;

    let (status, _) = send(
        &app,
        with_json(
            Method::PATCH,
            "/api/v1/products/sock",
            &json!({"inStock": true, "price": 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let sock = sync.state().product("sock").cloned().expect("sock");
    assert!(sock.in_stock);
    assert!((sock.price - 10.0).abs() < f64::EPSILON);

    let (status, _) = send(
        &app,
        with_json(Method::PATCH, "/api/v1/products/ghost", &json!({"price": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_product_removes_it_or_404s() {
    let store = seeded_store();
    let (app, sync) = app_for(&store).await;

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/v1/products/hat")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(sync.state().product("hat").is_none());

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/v1/products/hat")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_write_failure_maps_to_bad_gateway() {
    let store = seeded_store();
    let (app, _sync) = app_for(&store).await;
    store.fail_writes("read-only replica");

    let (status, json) = send(
        &app,
        with_json(Method::PATCH, "/api/v1/products/shoe", &json!({"brand": "Peak"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "bad_gateway");
}
