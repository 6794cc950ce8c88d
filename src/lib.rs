//! Medistock library
//!
//! Medicine inventory backend: aisles, medicines, stock movements with an
//! audit trail, expiry tracking and live change subscriptions.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod cache;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod queries;
pub mod repositories;
pub mod services;
pub mod telemetry;
pub mod validation;

use axum::{middleware, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::SystemTime;
use utoipa::ToSchema;

use crate::{
    auth::{AuthConfig, AuthService},
    cache::CacheBackend,
    config::AppConfig,
    events::{ChangeFeed, EventSender},
    repositories::Repositories,
    services::Services,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    /// `None` when the services run on in-memory repositories.
    pub db: Option<Arc<DatabaseConnection>>,
    pub config: Arc<AppConfig>,
    pub services: Services,
    pub auth: Arc<AuthService>,
    pub feed: ChangeFeed,
    pub cache: Option<Arc<dyn CacheBackend>>,
    pub started_at: SystemTime,
}

impl AppState {
    /// Wires services, the event processor and the change feed around `repos`.
    ///
    /// Spawns the event processor, so it must run inside a Tokio runtime.
    pub fn build(
        config: AppConfig,
        repos: Repositories,
        db: Option<Arc<DatabaseConnection>>,
        cache: Option<Arc<dyn CacheBackend>>,
    ) -> Self {
        let (events, event_rx) = EventSender::channel(config.event_channel_capacity);
        let feed = ChangeFeed::new(config.change_feed_capacity);
        tokio::spawn(events::process_events(event_rx, feed.clone()));

        let services = Services::new(repos, events, config.policy(), cache.clone());
        let auth = Arc::new(AuthService::new(AuthConfig::from(&config)));

        Self {
            db,
            config: Arc::new(config),
            services,
            auth,
            feed,
            cache,
            started_at: SystemTime::now(),
        }
    }
}

// Common response wrappers
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: telemetry::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    /// Slices one page out of an already filtered and ordered list.
    pub fn from_items(items: Vec<T>, page: u64, limit: u64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = items.len() as u64;
        let total_pages = total.div_ceil(limit);
        // Pages past the end, including offsets that overflow, are empty.
        let offset = page
            .saturating_sub(1)
            .checked_mul(limit)
            .filter(|offset| *offset < total)
            .and_then(|offset| usize::try_from(offset).ok());
        let items = match offset {
            Some(offset) => items
                .into_iter()
                .skip(offset)
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect(),
            None => Vec::new(),
        };

        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`.
///
/// Everything except status, health and the callable functions requires a
/// bearer token; the middleware puts the caller's [`auth::AuthUser`] into the
/// request extensions.
pub fn api_v1_routes(auth: Arc<AuthService>) -> Router<AppState> {
    let protected = Router::new()
        .nest("/medicines", handlers::medicines::medicine_routes())
        .nest("/aisles", handlers::aisles::aisle_routes())
        .nest("/history", handlers::history::history_routes())
        .nest("/dashboard", handlers::dashboard::dashboard_routes())
        .nest("/users", handlers::users::user_routes())
        .nest("/changes", handlers::changes::change_routes())
        .layer(middleware::from_fn_with_state(auth, auth::auth_middleware));

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .nest("/health", health::health_routes())
        // Callable functions authenticate on their own
        .nest("/functions", handlers::functions::function_routes())
        .merge(protected)
}

/// Full application router without transport-level layers (CORS, timeouts).
pub fn build_router(state: AppState) -> Router {
    let auth = state.auth.clone();
    Router::<AppState>::new()
        .route("/", get(|| async { "medistock up" }))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/api-docs/openapi.json", get(openapi::openapi_json))
        .nest("/api/v1", api_v1_routes(auth))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(telemetry::http_trace_layer())
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(telemetry::request_id_middleware))
        .with_state(state)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "service": "medistock",
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            telemetry::scope_request_id(telemetry::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn validation_errors_response_includes_metadata() {
        let response = telemetry::scope_request_id(
            telemetry::RequestId::new("meta-validation"),
            async { ApiResponse::<()>::validation_errors(vec!["missing".into()]) },
        )
        .await;

        assert!(!response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-validation"));
    }

    #[test]
    fn pages_are_sliced_from_the_full_list() {
        let page = PaginatedResponse::from_items((1..=45).collect::<Vec<u32>>(), 3, 20);
        assert_eq!(page.items, vec![41, 42, 43, 44, 45]);
        assert_eq!(page.total, 45);
        assert_eq!(page.total_pages, 3);

        let past_end = PaginatedResponse::from_items(vec![1, 2], 5, 20);
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total_pages, 1);

        let empty = PaginatedResponse::<u32>::from_items(Vec::new(), 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn huge_page_numbers_yield_an_empty_page() {
        let wrapped = PaginatedResponse::from_items(vec![1, 2, 3], (1u64 << 62) + 1, 100);
        assert!(wrapped.items.is_empty());
        assert_eq!(wrapped.total, 3);

        let max = PaginatedResponse::from_items(vec![1, 2, 3], u64::MAX, 100);
        assert!(max.items.is_empty());
        assert_eq!(max.page, u64::MAX);
        assert_eq!(max.total_pages, 1);
    }
}
