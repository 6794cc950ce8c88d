use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;
use uuid::Uuid;

use super::common::{created, ok, validate_input, PaginationParams};
use crate::{
    auth::AuthUser,
    commands::medicines::{
        MedicineChanges, NewMedicine, StockAdjustmentRequest, StockAdjustmentResult,
        StockUpdateRequest,
    },
    handlers::AppState,
    models::{HistoryEntry, Medicine, MedicineView},
    queries::MedicineListFilter,
    ApiResponse, ApiResult, PaginatedResponse,
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Text matched against name, reference and description.
    #[serde(default)]
    pub q: String,
    pub aisle_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ExpiringParams {
    /// Look-ahead window in days; the configured default when absent.
    pub within_days: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    pub limit: Option<u64>,
}

pub fn medicine_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_medicines).post(create_medicine))
        .route("/search", get(search_medicines))
        .route("/low-stock", get(low_stock_medicines))
        .route("/expiring", get(expiring_medicines))
        .route(
            "/:id",
            get(get_medicine).put(update_medicine).delete(delete_medicine),
        )
        .route("/:id/adjust-stock", post(adjust_stock))
        .route("/:id/stock", put(update_stock))
        .route("/:id/history", get(medicine_history))
}

/// List the caller's medicines
#[utoipa::path(
    get,
    path = "/api/v1/medicines",
    params(PaginationParams, MedicineListFilter),
    responses(
        (status = 200, description = "Medicines returned", body = ApiResponse<PaginatedResponse<MedicineView>>,
            headers(("X-Request-Id" = String, description = "Unique request id for tracing"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn list_medicines(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<MedicineListFilter>,
) -> ApiResult<PaginatedResponse<MedicineView>> {
    let (page, limit) = pagination.normalized();
    let medicines = state
        .services
        .medicines
        .list(&user.user_id, &filter, page, limit)
        .await?;
    Ok(ok(medicines))
}

/// Create a medicine
#[utoipa::path(
    post,
    path = "/api/v1/medicines",
    request_body = NewMedicine,
    responses(
        (status = 201, description = "Medicine created", body = ApiResponse<Medicine>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn create_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewMedicine>,
) -> Result<(StatusCode, Json<ApiResponse<Medicine>>), crate::errors::ServiceError> {
    validate_input(&payload)?;
    let medicine = state
        .services
        .medicines
        .create(&user.user_id, payload)
        .await?;
    info!(medicine_id = %medicine.id, "medicine created");
    Ok(created(medicine))
}

/// Get one medicine with its derived status
#[utoipa::path(
    get,
    path = "/api/v1/medicines/{id}",
    params(("id" = Uuid, Path, description = "Medicine id")),
    responses(
        (status = 200, description = "Medicine returned", body = ApiResponse<MedicineView>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn get_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<MedicineView> {
    let medicine = state.services.medicines.get(&user.user_id, id).await?;
    Ok(ok(medicine))
}

/// Update medicine details
#[utoipa::path(
    put,
    path = "/api/v1/medicines/{id}",
    params(("id" = Uuid, Path, description = "Medicine id")),
    request_body = MedicineChanges,
    responses(
        (status = 200, description = "Medicine updated", body = ApiResponse<Medicine>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn update_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<MedicineChanges>,
) -> ApiResult<Medicine> {
    validate_input(&changes)?;
    let medicine = state
        .services
        .medicines
        .update(&user.user_id, id, changes)
        .await?;
    Ok(ok(medicine))
}

/// Delete a medicine; its history is kept
#[utoipa::path(
    delete,
    path = "/api/v1/medicines/{id}",
    params(("id" = Uuid, Path, description = "Medicine id")),
    responses(
        (status = 200, description = "Medicine deleted", body = ApiResponse<Medicine>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn delete_medicine(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Medicine> {
    let medicine = state.services.medicines.delete(&user.user_id, id).await?;
    info!(medicine_id = %id, "medicine deleted");
    Ok(ok(medicine))
}

/// Search medicines by text
#[utoipa::path(
    get,
    path = "/api/v1/medicines/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching medicines", body = ApiResponse<Vec<MedicineView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn search_medicines(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<MedicineView>> {
    let medicines = state
        .services
        .medicines
        .search(&user.user_id, &params.q, params.aisle_id)
        .await?;
    Ok(ok(medicines))
}

/// Medicines at or below their warning threshold
#[utoipa::path(
    get,
    path = "/api/v1/medicines/low-stock",
    responses(
        (status = 200, description = "Low-stock medicines, critical first", body = ApiResponse<Vec<MedicineView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn low_stock_medicines(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<MedicineView>> {
    let medicines = state.services.medicines.low_stock(&user.user_id).await?;
    Ok(ok(medicines))
}

/// Medicines expired or expiring within the window
#[utoipa::path(
    get,
    path = "/api/v1/medicines/expiring",
    params(ExpiringParams),
    responses(
        (status = 200, description = "Expiring medicines, soonest first", body = ApiResponse<Vec<MedicineView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn expiring_medicines(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ExpiringParams>,
) -> ApiResult<Vec<MedicineView>> {
    let medicines = state
        .services
        .medicines
        .expiring(&user.user_id, params.within_days)
        .await?;
    Ok(ok(medicines))
}

/// Apply a signed stock adjustment
#[utoipa::path(
    post,
    path = "/api/v1/medicines/{id}/adjust-stock",
    params(("id" = Uuid, Path, description = "Medicine id")),
    request_body = StockAdjustmentRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<StockAdjustmentResult>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockAdjustmentRequest>,
) -> ApiResult<StockAdjustmentResult> {
    validate_input(&payload)?;
    let result = state
        .services
        .medicines
        .adjust_stock(&user.user_id, id, payload.adjustment, &payload.reason)
        .await?;
    info!(
        medicine_id = %id,
        adjustment = payload.adjustment,
        new_quantity = result.medicine.current_quantity,
        "stock adjusted"
    );
    Ok(ok(result))
}

/// Set the stock to an absolute quantity
#[utoipa::path(
    put,
    path = "/api/v1/medicines/{id}/stock",
    params(("id" = Uuid, Path, description = "Medicine id")),
    request_body = StockUpdateRequest,
    responses(
        (status = 200, description = "Stock updated", body = ApiResponse<StockAdjustmentResult>),
        (status = 400, description = "Invalid quantity", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StockUpdateRequest>,
) -> ApiResult<StockAdjustmentResult> {
    validate_input(&payload)?;
    let result = state
        .services
        .medicines
        .update_stock(&user.user_id, id, payload.quantity, payload.reason)
        .await?;
    Ok(ok(result))
}

/// History entries recorded for one medicine
#[utoipa::path(
    get,
    path = "/api/v1/medicines/{id}/history",
    params(("id" = Uuid, Path, description = "Medicine id"), LimitParams),
    responses(
        (status = 200, description = "History, newest first", body = ApiResponse<Vec<HistoryEntry>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "medicines"
)]
pub async fn medicine_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<HistoryEntry>> {
    let entries = state
        .services
        .medicines
        .history(&user.user_id, id, params.limit)
        .await?;
    Ok(ok(entries))
}
