/*!
 * # Health Check Module
 *
 * Endpoints for monitoring the service:
 *
 * - Basic health check (`/health`) - overall status with per-component details
 * - Liveness check (`/health/live`) - the process is answering
 * - Readiness check (`/health/ready`) - the database is reachable
 * - Version information (`/health/version`)
 */

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};
use tracing::{error, warn};

use crate::{cache::CacheBackend, AppState};

const CACHE_PROBE_KEY: &str = "health:probe";

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
    Degraded,
}

/// Health check detail
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthDetail {
    pub status: HealthStatus,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HealthDetail {
    fn up() -> Self {
        Self {
            status: HealthStatus::Up,
            message: None,
            timestamp: Utc::now(),
        }
    }

    fn with(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Overall health information
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthInfo {
    pub status: HealthStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub details: BTreeMap<String, HealthDetail>,
}

impl HealthInfo {
    /// Down if any component is down, degraded if any is degraded.
    pub fn from_details(details: BTreeMap<String, HealthDetail>, uptime_seconds: u64) -> Self {
        let any_down = details.values().any(|d| d.status == HealthStatus::Down);
        let any_degraded = details.values().any(|d| d.status == HealthStatus::Degraded);
        let status = if any_down {
            HealthStatus::Down
        } else if any_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        };

        Self {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            uptime_seconds,
            details,
        }
    }
}

/// Calculate system uptime
pub fn uptime(start_time: SystemTime) -> u64 {
    SystemTime::now()
        .duration_since(start_time)
        .unwrap_or(Duration::from_secs(0))
        .as_secs()
}

async fn check_database(db: Option<&DatabaseConnection>) -> HealthDetail {
    match db {
        None => HealthDetail::with(HealthStatus::Degraded, "no database configured"),
        Some(db) => match db.ping().await {
            Ok(_) => HealthDetail::up(),
            Err(e) => {
                error!("Database health check failed: {}", e);
                HealthDetail::with(HealthStatus::Down, "database unreachable")
            }
        },
    }
}

async fn check_cache(cache: Option<&dyn CacheBackend>) -> HealthDetail {
    match cache {
        None => HealthDetail::with(HealthStatus::Up, "disabled"),
        Some(cache) => match cache.exists(CACHE_PROBE_KEY).await {
            Ok(_) => HealthDetail::up(),
            Err(e) => {
                // Cache failures never fail requests, so the service stays usable.
                warn!("Cache health check failed: {}", e);
                HealthDetail::with(HealthStatus::Degraded, e.to_string())
            }
        },
    }
}

/// Runs every component check against the application state.
pub async fn check_health(state: &AppState) -> HealthInfo {
    let mut details = BTreeMap::new();
    details.insert(
        "database".to_string(),
        check_database(state.db.as_deref()).await,
    );
    details.insert(
        "cache".to_string(),
        check_cache(state.cache.as_deref()).await,
    );
    details.insert(
        "change_feed".to_string(),
        HealthDetail::with(
            HealthStatus::Up,
            format!("{} subscribers", state.feed.subscriber_count()),
        ),
    );

    HealthInfo::from_details(details, uptime(state.started_at))
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built": option_env!("BUILD_TIME").unwrap_or("unknown"),
    }))
}

/// Basic health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let info = check_health(&state).await;
    let code = match info.status {
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Up | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(info))
}

/// Liveness probe
pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": HealthStatus::Up })))
}

/// Readiness probe: ready once the database answers
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let database = check_database(state.db.as_deref()).await;
    let code = if database.status == HealthStatus::Down {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(json!({ "status": database.status, "database": database })))
}

/// Creates health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .route("/version", get(version_info))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(status: HealthStatus) -> HealthDetail {
        HealthDetail {
            status,
            message: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn overall_status_is_worst_component() {
        let mut details = BTreeMap::new();
        details.insert("database".to_string(), detail(HealthStatus::Up));
        details.insert("cache".to_string(), detail(HealthStatus::Degraded));
        assert_eq!(
            HealthInfo::from_details(details.clone(), 5).status,
            HealthStatus::Degraded
        );

        details.insert("database".to_string(), detail(HealthStatus::Down));
        assert_eq!(HealthInfo::from_details(details, 5).status, HealthStatus::Down);
    }

    #[tokio::test]
    async fn missing_database_is_degraded() {
        assert_eq!(check_database(None).await.status, HealthStatus::Degraded);
        assert_eq!(check_cache(None).await.status, HealthStatus::Up);
    }
}
