use axum::{extract::State, routing::get, Extension, Router};

use super::common::ok;
use crate::{
    auth::AuthUser, handlers::AppState, queries::DashboardSummary, ApiResponse, ApiResult,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

/// Stock totals, alert counts and recent activity
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = ApiResponse<DashboardSummary>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "dashboard"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<DashboardSummary> {
    let summary = state.services.dashboard.summary(&user.user_id).await?;
    Ok(ok(summary))
}
