#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use medistock::{config::AppConfig, db, repositories::Repositories, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "k8Jq2vX9mZ4rT7wY1pL6sD3fG0hN5bC8xV2qW9eR4tY7uI1oP6aS3dF0gH5jK8lZ";

/// Helper harness for spinning up an application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
}

/// Status code and decoded JSON body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_SECRET.to_string(),
            3600,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cache.enabled = false;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let repos = Repositories::sea_orm(db_arc.clone());
        let state = AppState::build(cfg, repos, Some(db_arc), None);

        let token = state
            .auth
            .generate_token("user-1", Some("pharma@example.com"), Some("Test User"))
            .expect("issue test token");
        let router = medistock::build_router(state.clone());

        Self {
            router,
            state,
            token,
        }
    }

    /// Access the bearer token for the default user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Issue a token for another user of the same application.
    pub fn token_for(&self, user_id: &str) -> String {
        self.state
            .auth
            .generate_token(user_id, None, None)
            .expect("issue token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse { status, body }
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> TestResponse {
        self.request(method, uri, body, Some(self.token())).await
    }

    pub async fn create_aisle(&self, name: &str) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/aisles",
                Some(json!({
                    "name": name,
                    "description": "Rayon de test",
                    "colorHex": "#4CAF50",
                    "icon": "pills",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        data_id(&response.body)
    }

    /// Creates a medicine with quantity 20, thresholds 10/20 and max 100.
    pub async fn create_medicine(&self, aisle_id: Uuid, name: &str) -> Uuid {
        let response = self
            .request_authenticated(
                Method::POST,
                "/api/v1/medicines",
                Some(json!({
                    "name": name,
                    "aisleId": aisle_id,
                    "currentQuantity": 20,
                    "maxQuantity": 100,
                    "warningThreshold": 20,
                    "criticalThreshold": 10,
                    "unit": "boîte",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        data_id(&response.body)
    }
}

pub fn data_id(body: &Value) -> Uuid {
    body["data"]["id"]
        .as_str()
        .and_then(|id| Uuid::parse_str(id).ok())
        .expect("response carries data.id")
}
