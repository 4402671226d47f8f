use crate::auth::AuthUser;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use bytes::Bytes;
use dashmap::DashMap;
use http_body_util::BodyExt as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared store of responses already produced for an idempotency key.
///
/// Mutating endpoints honor an `Idempotency-Key` header: a duplicate
/// submission (double click, client retry) within the TTL replays the stored
/// response instead of re-executing the mutation, so a retried assign call
/// cannot create a duplicate assignment.
///
/// Stored keys are scoped to the authenticated caller and the exact
/// method + path, and only successful responses are stored. A failed
/// attempt never shadows a later legitimate retry, and one caller's key
/// cannot replay another caller's response or a different endpoint's.
#[derive(Clone)]
pub struct IdempotencyStore(Arc<DashMap<String, StoredResponse>>);

impl Default for IdempotencyStore {
    fn default() -> Self {
        Self(Arc::new(DashMap::new()))
    }
}

impl IdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str, ttl: Duration) -> Option<StoredResponse> {
        if let Some(sr) = self.0.get(key) {
            if sr.stored_at.elapsed() < ttl {
                return Some(sr.clone());
            }
        }
        None
    }

    pub fn insert(&self, key: &str, sr: StoredResponse) {
        self.0.insert(key.to_string(), sr);
    }

    pub fn cleanup(&self, ttl: Duration) {
        let now = Instant::now();
        self.0.retain(|_, sr| now.duration_since(sr.stored_at) < ttl);
    }
}

#[derive(Clone)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub body: Bytes,
    pub content_type: Option<HeaderValue>,
    pub stored_at: Instant,
}

/// Idempotency middleware. Must sit inside the auth middleware: the key
/// scope comes from the authenticated user, and an unauthenticated request
/// is rejected before it can read or write the store.
pub async fn idempotency_middleware(req: Request, next: Next) -> Response {
    static TTL_SECS: u64 = 600; // 10 minutes
    static HEADER: &str = "idempotency-key";

    let method = req.method().clone();
    let is_mutating = matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE");

    if !is_mutating {
        return next.run(req).await;
    }

    let Some(key) = req
        .headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
    else {
        return next.run(req).await;
    };

    let Some(user) = req.extensions().get::<AuthUser>() else {
        return next.run(req).await;
    };
    let scoped_key = format!("{}:{}:{}:{}", user.user_id, method, req.uri().path(), key);

    let store = req
        .extensions()
        .get::<IdempotencyStore>()
        .cloned()
        .unwrap_or_default();

    let ttl = Duration::from_secs(TTL_SECS);
    store.cleanup(ttl);

    // Replay previously stored response
    if let Some(stored) = store.get(&scoped_key, ttl) {
        let mut resp = Response::new(axum::body::Body::from(stored.body.clone()));
        *resp.status_mut() = stored.status;
        if let Some(ct) = stored.content_type.clone() {
            resp.headers_mut()
                .insert(HeaderName::from_static("content-type"), ct);
        }
        return resp;
    }

    let resp = next.run(req).await;

    // Only successful outcomes are worth replaying; a 4xx/5xx attempt must
    // not shadow a later retry that would succeed.
    if !resp.status().is_success() {
        return resp;
    }

    let (parts, body) = resp.into_parts();
    // Try to buffer the body. If it fails, return the original response without storing.
    match body.collect().await {
        Ok(collected) => {
            let bytes = collected.to_bytes();
            let ct = parts.headers.get("content-type").cloned();
            let stored = StoredResponse {
                status: parts.status,
                body: bytes.clone(),
                content_type: ct,
                stored_at: Instant::now(),
            };
            store.insert(&scoped_key, stored);
            Response::from_parts(parts, axum::body::Body::from(bytes))
        }
        Err(_) => Response::from_parts(parts, axum::body::Body::empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use axum::{
        body::Body, http::Request as HttpRequest, http::StatusCode, routing::post, Extension,
        Router,
    };
    use std::sync::atomic::{AtomicU32, Ordering};
    use tower::ServiceExt;
    use uuid::Uuid;

    fn caller(user_id: Uuid) -> AuthUser {
        AuthUser {
            user_id,
            username: "tester".to_string(),
            role: UserRole::User,
            token_id: Uuid::new_v4().to_string(),
        }
    }

    fn keyed_post(uri: &str, key: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri(uri)
            .method("POST")
            .header("idempotency-key", key)
            .body(Body::empty())
            .unwrap()
    }

    fn test_router<H, T>(store: IdempotencyStore, user_id: Uuid, path: &str, handler: H) -> Router
    where
        H: axum::handler::Handler<T, ()>,
        T: 'static,
    {
        Router::new()
            .route(path, post(handler))
            .layer(axum::middleware::from_fn(idempotency_middleware))
            .layer(Extension(store))
            .layer(Extension(caller(user_id)))
    }

    #[tokio::test]
    async fn duplicate_key_replays_response_without_rerunning_handler() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let app = test_router(
            IdempotencyStore::new(),
            Uuid::new_v4(),
            "/things",
            || async {
                let n = CALLS.fetch_add(1, Ordering::SeqCst) + 1;
                format!("call-{n}")
            },
        );

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(keyed_post("/things", "abc-123"))
                .await
                .unwrap();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&bytes[..], b"call-1");
        }

        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn requests_without_key_are_not_deduplicated() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let app = test_router(
            IdempotencyStore::new(),
            Uuid::new_v4(),
            "/things",
            || async {
                CALLS.fetch_add(1, Ordering::SeqCst);
                "ok"
            },
        );

        for _ in 0..2 {
            let _ = app
                .clone()
                .oneshot(
                    HttpRequest::builder()
                        .uri("/things")
                        .method("POST")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
        }

        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn error_responses_are_not_stored() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        // First attempt fails; the keyed retry must reach the handler again.
        let app = test_router(
            IdempotencyStore::new(),
            Uuid::new_v4(),
            "/things",
            || async {
                if CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::CONFLICT, "busy")
                } else {
                    (StatusCode::OK, "done")
                }
            },
        );

        let response = app
            .clone()
            .oneshot(keyed_post("/things", "retry-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .clone()
            .oneshot(keyed_post("/things", "retry-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn keys_are_scoped_per_endpoint() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let handler = || async {
            CALLS.fetch_add(1, Ordering::SeqCst);
            "ok"
        };
        let app = Router::new()
            .route("/alpha", post(handler))
            .route("/beta", post(handler))
            .layer(axum::middleware::from_fn(idempotency_middleware))
            .layer(Extension(IdempotencyStore::new()))
            .layer(Extension(caller(Uuid::new_v4())));

        let _ = app
            .clone()
            .oneshot(keyed_post("/alpha", "shared"))
            .await
            .unwrap();
        let _ = app
            .clone()
            .oneshot(keyed_post("/beta", "shared"))
            .await
            .unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn keys_are_scoped_per_user() {
        static CALLS: AtomicU32 = AtomicU32::new(0);

        let store = IdempotencyStore::new();
        let handler = || async {
            CALLS.fetch_add(1, Ordering::SeqCst);
            "ok"
        };
        let first_user = test_router(store.clone(), Uuid::new_v4(), "/things", handler);
        let second_user = test_router(store, Uuid::new_v4(), "/things", handler);

        let _ = first_user
            .oneshot(keyed_post("/things", "shared"))
            .await
            .unwrap();
        let _ = second_user
            .oneshot(keyed_post("/things", "shared"))
            .await
            .unwrap();

        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }
}
