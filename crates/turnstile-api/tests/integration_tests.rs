//! End-to-end tests for the validation gate: a real Axum router with the
//! middleware attached, driven through `tower::ServiceExt::oneshot`.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::middleware::from_fn;
use axum::routing::{delete, get, post};
use axum::{Extension, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use turnstile_api::middleware::validate_request;
use turnstile_api::{GateConfig, InternalErrorBody, RejectionBody, ValidationGate};
use turnstile_schema::{
    Partition, SchemaId, SchemaStore, StaticSchemaStore, StoreError, ValidatorCache,
};

/// Store wrapper that records every identifier the cache asks for.
struct RecordingStore {
    inner: StaticSchemaStore,
    requested: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new(inner: StaticSchemaStore) -> Self {
        Self {
            inner,
            requested: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl SchemaStore for RecordingStore {
    fn load(&self, id: &SchemaId) -> Result<Option<Value>, StoreError> {
        self.requested.lock().unwrap().push(id.to_string());
        self.inner.load(id)
    }
}

/// Store whose backing storage is permanently broken.
struct FailingStore;

impl SchemaStore for FailingStore {
    fn load(&self, id: &SchemaId) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Io {
            id: id.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}

async fn ok() -> &'static str {
    "ok"
}

async fn echo(body: String) -> String {
    body
}

/// The admin users router group with the gate attached, as a service
/// would wire it.
fn app(store: Arc<dyn SchemaStore>) -> Router {
    app_with_config(store, GateConfig::new("/api/v1/admin/users"))
}

fn app_with_config(store: Arc<dyn SchemaStore>, config: GateConfig) -> Router {
    let cache = Arc::new(ValidatorCache::new(store));
    let gate = ValidationGate::new(cache, config);

    Router::new()
        .route("/api/v1/admin/users", post(ok))
        .route("/api/v1/admin/users/claims", post(echo))
        .route("/api/v1/admin/users/search", get(ok))
        .route("/api/v1/admin/users/{userId}/claims", delete(ok))
        .layer(from_fn(validate_request))
        .layer(Extension(gate))
}

fn claims_body_schema() -> Value {
    json!({
        "type": "object",
        "required": ["userId", "claim"],
        "properties": {
            "userId": {"type": "string"},
            "claim": {"type": "string"}
        },
        "additionalProperties": false
    })
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn missing_required_field_is_rejected() {
    let store = StaticSchemaStore::new().with(
        "api/v1/admin/users/POST_claims_body",
        claims_body_schema(),
    );
    let app = app(Arc::new(store));

    let response = app
        .oneshot(post_json(
            "/api/v1/admin/users/claims",
            r#"{"claim": "billing"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: RejectionBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.partition, Partition::Body);
    assert!(!body.errors.is_empty());
    assert_eq!(body.errors[0].keyword, "required");
    assert!(
        body.errors[0].message.contains("userId"),
        "error must reference the missing field, got: {}",
        body.errors[0].message
    );
}

#[tokio::test]
async fn valid_body_proceeds_with_body_replayed() {
    let store = StaticSchemaStore::new().with(
        "api/v1/admin/users/POST_claims_body",
        claims_body_schema(),
    );
    let app = app(Arc::new(store));

    let payload = r#"{"userId": "u-7", "claim": "billing"}"#;
    let response = app
        .oneshot(post_json("/api/v1/admin/users/claims", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The echo handler saw the exact bytes the client sent.
    assert_eq!(body_bytes(response).await, payload.as_bytes());
}

#[tokio::test]
async fn schemaless_query_is_skipped() {
    let store = StaticSchemaStore::new().with(
        "api/v1/admin/users/POST_claims_body",
        claims_body_schema(),
    );
    let app = app(Arc::new(store));

    // No query schema exists; any query string passes through.
    let response = app
        .oneshot(post_json(
            "/api/v1/admin/users/claims?junk=1&junk=2&x=%20",
            r#"{"userId": "u-7", "claim": "billing"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn failing_body_short_circuits_remaining_partitions() {
    let store = Arc::new(RecordingStore::new(
        StaticSchemaStore::new()
            .with("api/v1/admin/users/POST_claims_body", claims_body_schema())
            .with(
                "api/v1/admin/users/POST_claims_query",
                json!({"type": "object", "required": ["token"]}),
            ),
    ));
    let app = app(store.clone());

    let response = app
        .oneshot(post_json("/api/v1/admin/users/claims?other=1", "{}"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Only the body schema was ever looked up; the walk stopped before
    // the query and params partitions.
    assert_eq!(
        store.requested(),
        vec!["api/v1/admin/users/POST_claims_body".to_string()]
    );
}

#[tokio::test]
async fn params_schema_rejects_bad_path_parameter() {
    let store = StaticSchemaStore::new().with(
        "api/v1/admin/users/DELETE_claims_params",
        json!({
            "type": "object",
            "required": ["userId"],
            "properties": {"userId": {"type": "string", "pattern": "^u-[0-9]+$"}}
        }),
    );
    let app = app(Arc::new(store));

    let bad = Request::builder()
        .method("DELETE")
        .uri("/api/v1/admin/users/abc/claims")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(bad).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: RejectionBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.partition, Partition::Params);
    assert_eq!(body.errors[0].path, "/userId");

    let good = Request::builder()
        .method("DELETE")
        .uri("/api/v1/admin/users/u-42/claims")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(good).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn query_schema_rejects_and_passes() {
    let store = StaticSchemaStore::new().with(
        "api/v1/admin/users/GET_search_query",
        json!({
            "type": "object",
            "required": ["q"],
            "properties": {"q": {"type": "string", "minLength": 2}}
        }),
    );
    let app = app(Arc::new(store));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/users/search?limit=10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: RejectionBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.partition, Partition::Query);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/users/search?q=ana")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_schema_definition_serves_through_once_logged() {
    // Structurally JSON, semantically not a schema.
    let store = Arc::new(RecordingStore::new(StaticSchemaStore::new().with(
        "api/v1/admin/users/POST_claims_body",
        json!({"type": 42}),
    )));
    let app = app(store.clone());

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json("/api/v1/admin/users/claims", r#"{"claim": "x"}"#))
            .await
            .unwrap();
        // The caller is not punished for the operator's broken file.
        assert_eq!(response.status(), StatusCode::OK);
    }

    let body_lookups = store
        .requested()
        .iter()
        .filter(|id| id.ends_with("POST_claims_body"))
        .count();
    assert_eq!(body_lookups, 1, "the degraded definition must be cached");
}

#[tokio::test]
async fn storage_fault_yields_opaque_500() {
    let app = app(Arc::new(FailingStore));

    let response = app
        .oneshot(post_json("/api/v1/admin/users/claims", r#"{"claim": "x"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let bytes = body_bytes(response).await;
    let body: InternalErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.error, "An internal error occurred");
    assert!(
        !String::from_utf8_lossy(&bytes).contains("denied"),
        "storage detail must not leak to the caller"
    );
}

#[tokio::test]
async fn mount_root_endpoint_resolves_with_empty_token() {
    // POST directly at the mount root: identifier POST__body.
    let store = StaticSchemaStore::new().with(
        "api/v1/admin/users/POST__body",
        json!({
            "type": "object",
            "required": ["email"],
            "properties": {"email": {"type": "string", "format": "email"}}
        }),
    );
    let app = app(Arc::new(store));

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/admin/users", r#"{"email": "not-an-email"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: RejectionBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.errors[0].keyword, "format");

    let response = app
        .oneshot(post_json("/api/v1/admin/users", r#"{"email": "ana@example.com"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn oversized_body_is_rejected_as_client_error() {
    let store = StaticSchemaStore::new().with(
        "api/v1/admin/users/POST_claims_body",
        claims_body_schema(),
    );
    let app = app_with_config(
        Arc::new(store),
        GateConfig::new("/api/v1/admin/users").with_max_body_bytes(16),
    );

    let oversized = format!(r#"{{"claim": "{}"}}"#, "x".repeat(64));
    let response = app
        .oneshot(post_json("/api/v1/admin/users/claims", &oversized))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: RejectionBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body.partition, Partition::Body);
    assert_eq!(body.errors[0].keyword, "body");
}
