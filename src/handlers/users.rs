use axum::{extract::State, routing::get, Extension, Router};

use super::common::ok;
use crate::{auth::AuthUser, handlers::AppState, models::User, ApiResponse, ApiResult};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/me", get(current_user))
}

/// Profile of the authenticated caller, refreshed from the token claims
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn current_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<User> {
    let profile = state.services.users.touch(&user).await?;
    Ok(ok(profile))
}
