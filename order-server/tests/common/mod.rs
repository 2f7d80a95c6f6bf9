//! Shared helpers for integration tests
//!
//! Builds a full `ServerState` over an in-memory SQLite database, plus a
//! small JSON-over-router harness so tests exercise the real HTTP surface.

// Each test binary compiles this module separately and uses a subset
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use order_server::auth::JwtConfig;
use order_server::core::{Config, ServerState};
use order_server::db::DbService;

pub fn test_config() -> Config {
    Config {
        work_dir: "/tmp/order-server-test".to_string(),
        http_port: 0,
        jwt: JwtConfig {
            secret: "integration-test-secret-0123456789abcdef".to_string(),
            expiration_minutes: 60,
            issuer: "order-server".to_string(),
            audience: "order-clients".to_string(),
        },
        environment: "test".to_string(),
        timezone: chrono_tz::UTC,
        // Keep the processing placeholder fast in tests
        processing_delay_ms: 10,
        pending_retry_after_minutes: 60,
        cleanup_interval_minutes: 60,
    }
}

pub async fn test_state() -> ServerState {
    let db = DbService::new_in_memory()
        .await
        .expect("Failed to create in-memory database");
    ServerState::from_parts(test_config(), db)
}

pub fn app(state: &ServerState) -> Router {
    order_server::api::router().with_state(state.clone())
}

/// Fire a JSON request at the router and decode the JSON response
pub async fn request(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("Router request failed");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

/// Build an order row for direct repository insertion
pub fn order_fixture(
    status: order_server::db::models::OrderStatus,
    total: f64,
    created_at: i64,
) -> order_server::db::models::Order {
    order_server::db::models::Order {
        id: uuid::Uuid::new_v4().to_string(),
        customer_name: "Fixture Customer".to_string(),
        customer_email: "fixture@example.com".to_string(),
        items: vec![order_server::db::models::OrderItem {
            name: "Fixture Item".to_string(),
            quantity: 1,
            price: total,
        }],
        total_amount: total,
        status,
        notes: None,
        version: 0,
        created_at,
        updated_at: created_at,
    }
}

/// Register a user and log in, returning the bearer token
pub async fn register_and_login(router: &Router, email: &str, password: &str) -> String {
    let (status, _) = request(
        router,
        "POST",
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        router,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    body["token"].as_str().expect("login token").to_string()
}
