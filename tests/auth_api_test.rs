mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn invalid_credentials_issue_nothing() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "test-admin", "password": "wrong" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert!(body.get("token").is_none());
    assert!(body["data"].is_null() || body.get("data").is_none());
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({ "username": "fresh-user", "password": "a sufficient secret" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], json!("fresh-user"));
    assert_eq!(body["data"]["role"], json!("user"));
    assert_eq!(body["data"]["authority"], json!(["user"]));

    // Duplicate username conflicts
    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({ "username": "fresh-user", "password": "another secret here" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "fresh-user", "password": "a sufficient secret" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().expect("token issued");
    assert!(!token.is_empty());
    assert_eq!(body["data"]["user"]["username"], json!("fresh-user"));

    // The issued token works against the API
    let response = app
        .request(Method::GET, "/api/v1/products", None, Some(token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/products", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/products", None, Some("not-a-real-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_the_token_but_always_succeeds() {
    let app = TestApp::new().await;

    // Logout with no token at all still returns 200
    let response = app.request(Method::POST, "/auth/logout", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Logout with the admin token revokes it
    let response = app
        .request(Method::POST, "/auth/logout", None, Some(app.token()))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(Method::GET, "/api/v1/products", None, Some(app.token()))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn any_account_can_read_itself() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({ "username": "self-reader", "password": "a sufficient secret" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "self-reader", "password": "a sufficient secret" })),
            None,
        )
        .await;
    let body = body_json(response).await;
    let token = body["data"]["token"].as_str().expect("token").to_string();

    // A plain account sees itself even though the admin surface is closed
    let response = app
        .request(Method::GET, "/api/v1/users/me", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], json!("self-reader"));
    assert_eq!(body["data"]["role"], json!("user"));
    assert!(body["data"].get("password_hash").is_none());

    let response = app
        .request(Method::GET, "/api/v1/users", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The seeded admin's /me resolves to the seeded account
    let response = app
        .request_authenticated(Method::GET, "/api/v1/users/me", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], json!(app.admin_id));
    assert_eq!(body["data"]["username"], json!("test-admin"));
}

#[tokio::test]
async fn user_administration_requires_admin_role() {
    let app = TestApp::new().await;

    // A plain user cannot list accounts
    let response = app
        .request(
            Method::POST,
            "/auth/register",
            Some(json!({ "username": "plain-user", "password": "a sufficient secret" })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "plain-user", "password": "a sufficient secret" })),
            None,
        )
        .await;
    let body = body_json(response).await;
    let user_token = body["data"]["token"].as_str().expect("token").to_string();

    let response = app
        .request(Method::GET, "/api/v1/users", None, Some(&user_token))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The seeded admin can
    let response = app
        .request_authenticated(Method::GET, "/api/v1/users", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["total"].as_u64().expect("total") >= 2);

    // And can promote the plain user
    let user_id = body["data"]["items"]
        .as_array()
        .expect("items")
        .iter()
        .find(|u| u["username"] == json!("plain-user"))
        .and_then(|u| u["id"].as_str())
        .expect("plain user listed")
        .to_string();
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/users/{}", user_id),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["role"], json!("admin"));
}
