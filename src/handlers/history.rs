use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common::ok;
use crate::{auth::AuthUser, handlers::AppState, models::HistoryEntry, ApiResponse, ApiResult};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    pub medicine_id: Option<Uuid>,
    pub aisle_id: Option<Uuid>,
    /// Defaults to 50, capped at 500.
    pub limit: Option<u64>,
}

pub fn history_routes() -> Router<AppState> {
    Router::new().route("/", get(list_history))
}

/// The caller's audit trail, newest first
#[utoipa::path(
    get,
    path = "/api/v1/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "History entries", body = ApiResponse<Vec<HistoryEntry>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "history"
)]
pub async fn list_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<HistoryParams>,
) -> ApiResult<Vec<HistoryEntry>> {
    let entries = state
        .services
        .history
        .list(&user.user_id, params.medicine_id, params.aisle_id, params.limit)
        .await?;
    Ok(ok(entries))
}
