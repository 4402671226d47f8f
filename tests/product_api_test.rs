mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn product_create_fetch_round_trip() {
    let app = TestApp::new().await;
    let (branch_id, category_id, _) = app.seed_directory().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Spectrum Analyzer",
                "model": "SA-220",
                "category_id": category_id,
                "branch_id": branch_id,
                "notes": "bench 4",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["success"], json!(true));
    let product_id = created["data"]["id"].as_str().expect("product id").to_string();

    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/products/{}", product_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], json!("Spectrum Analyzer"));
    assert_eq!(body["data"]["model"], json!("SA-220"));
    assert_eq!(body["data"]["notes"], json!("bench 4"));
    assert_eq!(body["data"]["is_assigned"], json!(false));
    assert_eq!(body["data"]["current_assignment"], json!(null));
}

#[tokio::test]
async fn product_create_rejects_unknown_references() {
    let app = TestApp::new().await;
    let (branch_id, _, _) = app.seed_directory().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Orphan Device",
                "model": "X-0",
                "category_id": Uuid::new_v4(),
                "branch_id": branch_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn product_search_and_pagination() {
    let app = TestApp::new().await;
    let (branch_id, category_id, _) = app.seed_directory().await;

    for name in ["Drill Alpha", "Drill Beta", "Oscilloscope"] {
        app.seed_product(category_id, branch_id, name).await;
    }

    let response = app
        .request_authenticated(Method::GET, "/api/v1/products?search=Drill", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], json!(2));

    let response = app
        .request_authenticated(Method::GET, "/api/v1/products?page=2&limit=2", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], json!(3));
    assert_eq!(body["data"]["items"].as_array().expect("items").len(), 1);
    assert_eq!(body["data"]["total_pages"], json!(2));
}

#[tokio::test]
async fn generate_qr_always_returns_a_data_uri() {
    let app = TestApp::new().await;
    let (branch_id, category_id, _) = app.seed_directory().await;
    let product_id = app.seed_product(category_id, branch_id, "Badge Printer").await;

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/products/{}/generate-qr", product_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let qr = body["data"]["qr_code"].as_str().expect("qr_code field present");
    assert!(qr.starts_with("data:image/svg+xml;base64,"));

    // Unknown product is a 404, not an empty success
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/products/{}/generate-qr", Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_refuses_products_with_open_assignment() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let product_id = app.seed_product(category_id, branch_id, "Projector").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign",
            Some(json!({ "product_id": product_id, "employee_id": employee_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let assignment_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("assignment id")
        .to_string();

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/products/{}", product_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // After the return it can go
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({ "condition": "GOOD" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/products/{}", product_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn assigned_listing_tracks_open_assignments() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let out_product = app.seed_product(category_id, branch_id, "Field Radio").await;
    let _shelf_product = app.seed_product(category_id, branch_id, "Shelf Radio").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign",
            Some(json!({ "product_id": out_product, "employee_id": employee_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/products/assigned", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body["data"].as_array().expect("assigned products");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!(out_product));
}
