use std::sync::Arc;
use std::time::Duration;

use assettrack_api::{
    auth::{AuthConfig, AuthService},
    config::AppConfig,
    db,
    entities::UserRole,
    events::{self, EventSender},
    handlers::AppServices,
    services::directory::{BranchInput, CategoryInput, EmployeeInput},
    services::products::CreateProductInput,
    services::users::CreateUserInput,
    AppState,
};
use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "test_secret_key_for_integration_tests_that_is_at_least_64_characters_long";

/// Test harness: the full application router backed by a throwaway SQLite
/// database, with a seeded admin account and a minted bearer token.
pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    token: String,
    pub admin_id: Uuid,
    _event_task: tokio::task::JoinHandle<()>,
    _tmp: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let db_path = tmp.path().join("assettrack_test.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let mut cfg = AppConfig::new(
            db_url,
            TEST_JWT_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            cfg.jwt_secret.clone(),
            cfg.auth_issuer.clone(),
            cfg.auth_audience.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db.clone()));

        let services = AppServices::new(db.clone(), Arc::new(event_sender.clone()), &cfg);

        let state = Arc::new(AppState {
            db,
            config: cfg,
            event_sender,
            auth: auth_service.clone(),
            services,
        });

        // Seed an admin account and mint its token directly.
        let admin = state
            .services
            .users
            .create(CreateUserInput {
                username: "test-admin".to_string(),
                password: "correct horse battery".to_string(),
                role: Some(UserRole::Admin),
            })
            .await
            .expect("seed admin user");
        let token = auth_service
            .generate_token(&admin)
            .expect("mint admin token");

        let router = assettrack_api::app_router(state.clone());

        Self {
            router,
            state,
            token,
            admin_id: admin.id,
            _event_task: event_task,
            _tmp: tmp,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn request_authenticated_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        self.request_with_headers(method, uri, body, Some(self.token()), headers)
            .await
    }

    /// Send a request with arbitrary extra headers and an optional token.
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Seed one branch, one category and one employee, returning their ids.
    pub async fn seed_directory(&self) -> (Uuid, Uuid, Uuid) {
        let branch = self
            .state
            .services
            .directory
            .create_branch(BranchInput {
                name: format!("Branch {}", Uuid::new_v4()),
            })
            .await
            .expect("seed branch");
        let category = self
            .state
            .services
            .directory
            .create_category(CategoryInput {
                name: format!("Category {}", Uuid::new_v4()),
                description: None,
            })
            .await
            .expect("seed category");
        let employee = self
            .state
            .services
            .directory
            .create_employee(EmployeeInput {
                emp_id: format!("EMP-{}", Uuid::new_v4()),
                name: "Dana Field".to_string(),
                email: Some("dana.field@example.com".to_string()),
                department: Some("Operations".to_string()),
                position: Some("Technician".to_string()),
            })
            .await
            .expect("seed employee");
        (branch.id, category.id, employee.id)
    }

    /// Seed a product under the given category/branch.
    pub async fn seed_product(&self, category_id: Uuid, branch_id: Uuid, name: &str) -> Uuid {
        self.state
            .services
            .products
            .create(CreateProductInput {
                name: name.to_string(),
                model: "MK-1".to_string(),
                category_id,
                branch_id,
                department_id: None,
                warranty_date: None,
                compliance_status: Some(true),
                notes: None,
            })
            .await
            .expect("seed product")
            .id
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Read a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is json")
}
