use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use tracing::info;
use uuid::Uuid;

use super::common::{created, ok, validate_input};
use crate::{
    auth::AuthUser,
    commands::aisles::{AisleChanges, NewAisle},
    errors::ServiceError,
    handlers::AppState,
    models::{Aisle, AisleView},
    ApiResponse, ApiResult,
};

pub fn aisle_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_aisles).post(create_aisle))
        .route(
            "/:id",
            get(get_aisle).put(update_aisle).delete(delete_aisle),
        )
}

/// List the caller's aisles with medicine counts
#[utoipa::path(
    get,
    path = "/api/v1/aisles",
    responses(
        (status = 200, description = "Aisles ordered by name", body = ApiResponse<Vec<AisleView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "aisles"
)]
pub async fn list_aisles(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Vec<AisleView>> {
    let aisles = state.services.aisles.list(&user.user_id).await?;
    Ok(ok(aisles))
}

/// Create an aisle
#[utoipa::path(
    post,
    path = "/api/v1/aisles",
    request_body = NewAisle,
    responses(
        (status = 201, description = "Aisle created", body = ApiResponse<Aisle>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "aisles"
)]
pub async fn create_aisle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewAisle>,
) -> Result<(StatusCode, Json<ApiResponse<Aisle>>), ServiceError> {
    validate_input(&payload)?;
    let aisle = state.services.aisles.create(&user.user_id, payload).await?;
    info!(aisle_id = %aisle.id, "aisle created");
    Ok(created(aisle))
}

#[utoipa::path(
    get,
    path = "/api/v1/aisles/{id}",
    params(("id" = Uuid, Path, description = "Aisle id")),
    responses(
        (status = 200, description = "Aisle returned", body = ApiResponse<AisleView>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "aisles"
)]
pub async fn get_aisle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<AisleView> {
    let aisle = state.services.aisles.get(&user.user_id, id).await?;
    Ok(ok(aisle))
}

#[utoipa::path(
    put,
    path = "/api/v1/aisles/{id}",
    params(("id" = Uuid, Path, description = "Aisle id")),
    request_body = AisleChanges,
    responses(
        (status = 200, description = "Aisle updated", body = ApiResponse<Aisle>),
        (status = 400, description = "Validation failed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "aisles"
)]
pub async fn update_aisle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(changes): Json<AisleChanges>,
) -> ApiResult<Aisle> {
    validate_input(&changes)?;
    let aisle = state
        .services
        .aisles
        .update(&user.user_id, id, changes)
        .await?;
    Ok(ok(aisle))
}

/// Delete an empty aisle
#[utoipa::path(
    delete,
    path = "/api/v1/aisles/{id}",
    params(("id" = Uuid, Path, description = "Aisle id")),
    responses(
        (status = 200, description = "Aisle deleted", body = ApiResponse<Aisle>),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Aisle still holds medicines", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "aisles"
)]
pub async fn delete_aisle(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Aisle> {
    let aisle = state.services.aisles.delete(&user.user_id, id).await?;
    info!(aisle_id = %id, "aisle deleted");
    Ok(ok(aisle))
}
