//! Callable validation functions.
//!
//! These endpoints authenticate from the `Authorization` header themselves and
//! answer with the `{"error": {"status", "message"}}` envelope instead of the
//! regular API error body.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use tracing::debug;

use crate::{
    auth::{authenticate, AuthUser},
    errors::FunctionErrorResponse,
    handlers::AppState,
    services::functions::{ValidateAisleRequest, ValidateMedicineRequest, ValidationOutcome},
};

pub fn function_routes() -> Router<AppState> {
    Router::new()
        .route("/validateAisle", post(validate_aisle))
        .route("/validateMedicine", post(validate_medicine))
}

fn caller(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, FunctionErrorResponse> {
    authenticate(&state.auth, headers).map_err(|e| {
        debug!(error = %e, "function call rejected");
        FunctionErrorResponse::unauthenticated()
    })
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, FunctionErrorResponse> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| FunctionErrorResponse::invalid_argument(rejection.body_text()))
}

/// Re-validate an aisle payload
#[utoipa::path(
    post,
    path = "/api/v1/functions/validateAisle",
    request_body = ValidateAisleRequest,
    responses(
        (status = 200, description = "Payload is valid", body = ValidationOutcome),
        (status = 400, description = "INVALID_ARGUMENT", body = FunctionErrorResponse),
        (status = 401, description = "UNAUTHENTICATED", body = FunctionErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "functions"
)]
pub async fn validate_aisle(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ValidateAisleRequest>, JsonRejection>,
) -> Result<Json<ValidationOutcome>, FunctionErrorResponse> {
    let user = caller(&state, &headers)?;
    let request = body(payload)?;
    let outcome = state
        .services
        .functions
        .validate_aisle(&user.user_id, &request)
        .await?;
    Ok(Json(outcome))
}

/// Re-validate a medicine payload
#[utoipa::path(
    post,
    path = "/api/v1/functions/validateMedicine",
    request_body = ValidateMedicineRequest,
    responses(
        (status = 200, description = "Payload is valid", body = ValidationOutcome),
        (status = 400, description = "INVALID_ARGUMENT", body = FunctionErrorResponse),
        (status = 401, description = "UNAUTHENTICATED", body = FunctionErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "functions"
)]
pub async fn validate_medicine(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ValidateMedicineRequest>, JsonRejection>,
) -> Result<Json<ValidationOutcome>, FunctionErrorResponse> {
    let user = caller(&state, &headers)?;
    let request = body(payload)?;
    let outcome = state
        .services
        .functions
        .validate_medicine(&user.user_id, &request)
        .await?;
    Ok(Json(outcome))
}
