use serde_json::json;

use super::*;

// -----------------------------------------------------------------------
// normalize_document
// -----------------------------------------------------------------------

fn doc(id: &str, fields: Value) -> RawDocument {
    RawDocument::new(id, fields)
}

fn full_doc() -> RawDocument {
    doc(
        "shoe-1",
        json!({
            "name": "Running Shoe",
            "price": 89.99,
            "image": "https://cdn.example.com/shoe.jpg",
            "images": ["https://cdn.example.com/shoe-side.jpg"],
            "category": "Footwear",
            "description": "Lightweight trail runner",
            "brand": "Stride",
            "rating": 4.6,
            "reviews": 212,
            "inStock": true,
            "features": ["breathable", "vegan"],
            "originalPrice": 119.99,
            "discount": {"label": "Spring sale"}
        }),
    )
}

#[test]
fn normalize_document_maps_every_field() {
    let product = normalize_document(&full_doc()).unwrap();
    assert_eq!(product.id, "shoe-1");
    assert_eq!(product.name, "Running Shoe");
    assert!((product.price - 89.99).abs() < f64::EPSILON);
    assert_eq!(product.image, "https://cdn.example.com/shoe.jpg");
    assert_eq!(product.images.len(), 1);
    assert_eq!(product.category, "Footwear");
    assert_eq!(product.brand, "Stride");
    assert_eq!(product.reviews, 212);
    assert!(product.in_stock);
    assert_eq!(product.features, vec!["breathable", "vegan"]);
    assert_eq!(product.original_price, Some(119.99));
    assert_eq!(
        product.discount.as_ref().and_then(|d| d.get("label")),
        Some(&json!("Spring sale"))
    );
}

#[test]
fn normalize_document_applies_defaults_for_missing_optional_fields() {
    let product = normalize_document(&doc(
        "mug-1",
        json!({"name": "Mug", "price": 12, "image": "mug.jpg"}),
    ))
    .unwrap();
    assert!(product.images.is_empty());
    assert_eq!(product.category, "");
    assert_eq!(product.description, "");
    assert_eq!(product.brand, "");
    assert!(product.rating.abs() < f64::EPSILON);
    assert_eq!(product.reviews, 0);
    assert!(product.in_stock, "availability defaults to in stock");
    assert!(product.features.is_empty());
    assert_eq!(product.original_price, None);
    assert_eq!(product.discount, None);
}

#[test]
fn normalize_document_uses_sentinel_for_absent_name() {
    let product =
        normalize_document(&doc("x", json!({"price": 5, "image": "x.jpg"}))).unwrap();
    assert_eq!(product.name, UNNAMED_PRODUCT);
}

#[test]
fn normalize_document_rejects_explicit_empty_name() {
    let err = normalize_document(&doc("x", json!({"name": "", "price": 5, "image": "x.jpg"})))
        .unwrap_err();
    assert_eq!(err, RecordRejected::EmptyName { id: "x".to_owned() });
}

#[test]
fn normalize_document_rejects_zero_and_unparseable_price() {
    for price in [json!(0), json!(-4), json!("free"), json!(null)] {
        let err = normalize_document(&doc(
            "p",
            json!({"name": "Thing", "price": price, "image": "p.jpg"}),
        ))
        .unwrap_err();
        assert!(
            matches!(err, RecordRejected::NonPositivePrice { .. }),
            "price {price} should be rejected, got {err:?}"
        );
    }
}

#[test]
fn normalize_document_coerces_numeric_strings() {
    let product = normalize_document(&doc(
        "p",
        json!({"name": "Thing", "price": "19.50", "image": "p.jpg", "rating": "4", "reviews": "7"}),
    ))
    .unwrap();
    assert!((product.price - 19.5).abs() < f64::EPSILON);
    assert!((product.rating - 4.0).abs() < f64::EPSILON);
    assert_eq!(product.reviews, 7);
}

#[test]
fn normalize_document_rejects_missing_image() {
    let err = normalize_document(&doc("p", json!({"name": "Thing", "price": 3})))
        .unwrap_err();
    assert_eq!(err, RecordRejected::MissingImage { id: "p".to_owned() });
}

#[test]
fn normalize_document_rejects_non_object_body() {
    let err = normalize_document(&doc("p", json!(["not", "a", "product"]))).unwrap_err();
    assert_eq!(
        err,
        RecordRejected::NotAnObject {
            id: "p".to_owned(),
            found: "array"
        }
    );
}

#[test]
fn normalize_document_treats_zero_original_price_as_absent() {
    let product = normalize_document(&doc(
        "p",
        json!({"name": "Thing", "price": 3, "image": "p.jpg", "originalPrice": 0}),
    ))
    .unwrap();
    assert_eq!(product.original_price, None);
}

#[test]
fn normalize_document_only_explicit_false_is_out_of_stock() {
    let out = normalize_document(&doc(
        "p",
        json!({"name": "Thing", "price": 3, "image": "p.jpg", "inStock": false}),
    ))
    .unwrap();
    assert!(!out.in_stock);

    let junk = normalize_document(&doc(
        "p",
        json!({"name": "Thing", "price": 3, "image": "p.jpg", "inStock": "no"}),
    ))
    .unwrap();
    assert!(junk.in_stock);
}

#[test]
fn normalize_document_is_idempotent() {
    let raw = full_doc();
    assert_eq!(normalize_document(&raw), normalize_document(&raw));
}

// -----------------------------------------------------------------------
// normalize_batch
// -----------------------------------------------------------------------

#[test]
fn normalize_batch_keeps_only_listable_products_in_order() {
    let docs = vec![
        doc("a", json!({"name": "Alpha", "price": 10, "image": "a.jpg"})),
        doc("bad-name", json!({"name": "", "price": 10, "image": "b.jpg"})),
        doc("b", json!({"name": "Beta", "price": 20, "image": "b.jpg"})),
        doc("bad-price", json!({"name": "Gamma", "price": 0, "image": "c.jpg"})),
        doc("bad-body", json!("garbage")),
        doc("c", json!({"name": "Delta", "price": "30", "image": "d.jpg"})),
    ];
    let batch = normalize_batch(&docs);
    let ids: Vec<&str> = batch.products.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(batch.rejected, 3);
    assert!(batch.products.iter().all(Product::is_listable));
}

#[test]
fn normalize_batch_of_empty_listing_is_empty() {
    let batch = normalize_batch(&[]);
    assert!(batch.products.is_empty());
    assert_eq!(batch.rejected, 0);
}
