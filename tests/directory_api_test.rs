mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn branch_round_trip_and_duplicate_name() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/branches",
            Some(json!({ "name": "North Yard" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let branch_id = body["data"]["id"].as_str().expect("branch id").to_string();

    // Create-then-fetch returns the submitted fields unchanged
    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/branches/{}", branch_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], json!("North Yard"));

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/branches",
            Some(json!({ "name": "North Yard" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn category_update_and_delete_guard() {
    let app = TestApp::new().await;
    let (branch_id, category_id, _) = app.seed_directory().await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/categories/{}", category_id),
            Some(json!({ "name": "Power Tools", "description": "Mains and battery" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["name"], json!("Power Tools"));
    assert_eq!(body["data"]["description"], json!("Mains and battery"));

    // With a product inside, deletion is refused
    app.seed_product(category_id, branch_id, "Angle Grinder").await;
    let response = app
        .request_authenticated(
            Method::DELETE,
            &format!("/api/v1/categories/{}", category_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn employee_validation_and_unique_badge() {
    let app = TestApp::new().await;

    // Bad email never reaches the database
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/employees",
            Some(json!({ "emp_id": "EMP-100", "name": "Kim Ono", "email": "not-an-email" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/employees",
            Some(json!({ "emp_id": "EMP-100", "name": "Kim Ono" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Badge numbers are unique
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/employees",
            Some(json!({ "emp_id": "EMP-100", "name": "Someone Else" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn list_pagination_is_stable() {
    let app = TestApp::new().await;

    for i in 0..5 {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/departments",
                Some(json!({ "name": format!("Dept {:02}", i) })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let first = body_json(
        app.request_authenticated(Method::GET, "/api/v1/departments?page=1&limit=2", None)
            .await,
    )
    .await;
    let second = body_json(
        app.request_authenticated(Method::GET, "/api/v1/departments?page=2&limit=2", None)
            .await,
    )
    .await;

    // Totals agree across pages; pages do not overlap
    assert_eq!(first["data"]["total"], json!(5));
    assert_eq!(second["data"]["total"], json!(5));
    assert_eq!(first["data"]["total_pages"], json!(3));
    let first_names: Vec<&str> = first["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|d| d["name"].as_str())
        .collect();
    let second_names: Vec<&str> = second["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .filter_map(|d| d["name"].as_str())
        .collect();
    assert_eq!(first_names.len(), 2);
    assert_eq!(second_names.len(), 2);
    assert!(first_names.iter().all(|n| !second_names.contains(n)));
}

#[tokio::test]
async fn oversized_limit_is_clamped() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/branches?limit=5000", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["limit"], json!(100));
}
