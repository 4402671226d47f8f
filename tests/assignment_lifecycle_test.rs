mod common;

use assettrack_api::services::assignments::AssignProductInput;
use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn product_moves_through_assign_and_return() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let product_id = app.seed_product(category_id, branch_id, "Thermal Camera").await;

    // Assign
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign",
            Some(json!({ "product_id": product_id, "employee_id": employee_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("ASSIGNED"));
    let assignment_id = body["data"]["id"].as_str().expect("assignment id").to_string();

    // Product detail reflects the open assignment
    let response = app
        .request_authenticated(Method::GET, &format!("/api/v1/products/{}", product_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["is_assigned"], json!(true));
    assert_eq!(
        body["data"]["current_assignment"]["employee"]["id"],
        json!(employee_id)
    );

    // A second assignment of the same product conflicts
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign",
            Some(json!({ "product_id": product_id, "employee_id": employee_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Return without a condition is rejected
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Return with a condition closes the assignment
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({ "condition": "GOOD" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], json!("RETURNED"));
    assert_eq!(body["data"]["condition"], json!("GOOD"));
    assert!(body["data"]["returned_at"].is_string());

    // Closed rows are immutable history: a second close conflicts
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({ "condition": "GOOD" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // And the product can be assigned again
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign",
            Some(json!({ "product_id": product_id, "employee_id": employee_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn lost_closure_rejects_condition_and_skips_it() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let product_id = app.seed_product(category_id, branch_id, "Label Printer").await;

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

    // A LOST closure with a condition grade makes no sense
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({ "status": "LOST", "condition": "POOR" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({ "status": "LOST" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["status"], json!("LOST"));
    assert_eq!(body["data"]["condition"], json!(null));
}

#[tokio::test]
async fn closed_assignments_cannot_be_edited() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let product_id = app.seed_product(category_id, branch_id, "Torque Wrench").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign",
            Some(json!({ "product_id": product_id, "employee_id": employee_id })),
        )
        .await;
    let assignment_id = body_json(response).await["data"]["id"]
        .as_str()
        .expect("assignment id")
        .to_string();

    // Open assignments accept edits
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/product-assignments/{}", assignment_id),
            Some(json!({ "notes": "left-handed model" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({ "condition": "FAIR" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/product-assignments/{}", assignment_id),
            Some(json!({ "notes": "rewriting history" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn bulk_assign_reports_per_item_outcomes() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let free_product = app.seed_product(category_id, branch_id, "Spare Laptop").await;
    let taken_product = app.seed_product(category_id, branch_id, "Desk Scanner").await;

    // Occupy one of the two products first
    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign",
            Some(json!({ "product_id": taken_product, "employee_id": employee_id })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/product-assignments/assign/bulk",
            Some(json!({
                "product_ids": [free_product, taken_product],
                "employee_id": employee_id,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let assigned = body["data"]["assigned"].as_array().expect("assigned array");
    let failed = body["data"]["failed"].as_array().expect("failed array");
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0]["product_id"], json!(free_product));
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["product_id"], json!(taken_product));
    assert!(failed[0]["reason"].as_str().is_some_and(|r| !r.is_empty()));
}

#[tokio::test]
async fn history_filters_by_product_and_status() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let product_a = app.seed_product(category_id, branch_id, "Monitor A").await;
    let product_b = app.seed_product(category_id, branch_id, "Monitor B").await;

    for product_id in [product_a, product_b] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/api/v1/product-assignments/assign",
                Some(json!({ "product_id": product_id, "employee_id": employee_id })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Close product A's assignment
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/product-assignments/product/{}", product_a),
            None,
        )
        .await;
    let history = body_json(response).await;
    let assignment_id = history["data"][0]["id"].as_str().expect("id").to_string();
    let response = app
        .request_authenticated(
            Method::POST,
            &format!("/api/v1/product-assignments/return/{}", assignment_id),
            Some(json!({ "condition": "EXCELLENT" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Status filter
    let response = app
        .request_authenticated(
            Method::GET,
            "/api/v1/product-assignments/history?status=RETURNED",
            None,
        )
        .await;
    let body = body_json(response).await;
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"], json!(product_a));

    // Product filter
    let response = app
        .request_authenticated(
            Method::GET,
            &format!("/api/v1/product-assignments/history?product_id={}", product_b),
            None,
        )
        .await;
    let body = body_json(response).await;
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["status"], json!("ASSIGNED"));

    // Active list shows only the open assignment
    let response = app
        .request_authenticated(Method::GET, "/api/v1/product-assignments/active", None)
        .await;
    let body = body_json(response).await;
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"], json!(product_b));

    // Date-range filter: a window around now catches everything, a window
    // entirely in the future catches nothing
    let from = (Utc::now() - Duration::hours(1)).to_rfc3339();
    let to = (Utc::now() + Duration::hours(1)).to_rfc3339();
    let response = app
        .request_authenticated(
            Method::GET,
            &format!(
                "/api/v1/product-assignments/history?from_date={}&to_date={}",
                from.replace('+', "%2B"),
                to.replace('+', "%2B")
            ),
            None,
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], json!(2));

    let future = (Utc::now() + Duration::days(2)).to_rfc3339();
    let response = app
        .request_authenticated(
            Method::GET,
            &format!(
                "/api/v1/product-assignments/history?from_date={}",
                future.replace('+', "%2B")
            ),
            None,
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], json!(0));
}

#[tokio::test]
async fn concurrent_assigns_leave_at_most_one_open_row() {
    let app = TestApp::new().await;
    let (branch_id, category_id, employee_id) = app.seed_directory().await;
    let product_id = app.seed_product(category_id, branch_id, "Survey Drone").await;

    let service = &app.state.services.assignments;
    let input = || AssignProductInput {
        product_id,
        employee_id,
        expected_return_at: None,
        notes: None,
    };

    // Race two assigns for the same product; the database-level guarantee
    // means exactly one may win regardless of interleaving
    let (first, second) = tokio::join!(
        service.assign(app.admin_id, input()),
        service.assign(app.admin_id, input()),
    );
    let successes = [first.is_ok(), second.is_ok()]
        .into_iter()
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/product-assignments/active", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], json!(1));
}
