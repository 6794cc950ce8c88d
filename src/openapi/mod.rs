use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Medistock API",
        version = "0.2.1",
        description = r#"
# Medistock

Medicine inventory for small pharmacies and care units: aisles, medicines,
stock movements and their audit trail.

## Authentication

Every endpoint except `/status`, `/health` and `/metrics` expects a JWT bearer token:

```
Authorization: Bearer <your-jwt-token>
```

Records are scoped to the token subject; another user's record reads as not found.

## Error Handling

Errors share one body format with an HTTP status, a machine code and a localized detail:

```json
{
  "error": "Unprocessable Entity",
  "code": "invalid_quantity",
  "message": "Invalid quantity: stock cannot go negative",
  "details": "Le stock ne peut pas devenir négatif.",
  "request_id": "5f0c…",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

The callable functions under `/functions` answer with
`{"error": {"status": "INVALID_ARGUMENT" | "UNAUTHENTICATED", "message": …}}` instead.

## Pagination

`GET /medicines` accepts `page` (default 1) and `limit` (default 20, max 100).
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "medicines", description = "Medicines and stock movements"),
        (name = "aisles", description = "Aisles that group medicines"),
        (name = "history", description = "Audit trail"),
        (name = "dashboard", description = "Stock overview"),
        (name = "users", description = "Caller profile"),
        (name = "changes", description = "Live change stream"),
        (name = "functions", description = "Callable payload validation")
    ),
    paths(
        // Medicines
        crate::handlers::medicines::list_medicines,
        crate::handlers::medicines::create_medicine,
        crate::handlers::medicines::get_medicine,
        crate::handlers::medicines::update_medicine,
        crate::handlers::medicines::delete_medicine,
        crate::handlers::medicines::search_medicines,
        crate::handlers::medicines::low_stock_medicines,
        crate::handlers::medicines::expiring_medicines,
        crate::handlers::medicines::adjust_stock,
        crate::handlers::medicines::update_stock,
        crate::handlers::medicines::medicine_history,

        // Aisles
        crate::handlers::aisles::list_aisles,
        crate::handlers::aisles::create_aisle,
        crate::handlers::aisles::get_aisle,
        crate::handlers::aisles::update_aisle,
        crate::handlers::aisles::delete_aisle,

        crate::handlers::history::list_history,
        crate::handlers::dashboard::get_dashboard,
        crate::handlers::users::current_user,
        crate::handlers::changes::stream_changes,

        // Functions
        crate::handlers::functions::validate_aisle,
        crate::handlers::functions::validate_medicine,
    ),
    components(
        schemas(
            crate::models::Medicine,
            crate::models::MedicineView,
            crate::models::StockStatus,
            crate::models::Aisle,
            crate::models::AisleView,
            crate::models::HistoryEntry,
            crate::models::User,
            crate::commands::medicines::NewMedicine,
            crate::commands::medicines::MedicineChanges,
            crate::commands::medicines::StockAdjustmentRequest,
            crate::commands::medicines::StockUpdateRequest,
            crate::commands::medicines::StockAdjustmentResult,
            crate::commands::aisles::NewAisle,
            crate::commands::aisles::AisleChanges,
            crate::queries::DashboardSummary,
            crate::services::functions::ValidateAisleRequest,
            crate::services::functions::ValidateMedicineRequest,
            crate::services::functions::ValidationOutcome,

            // Error types
            crate::errors::ErrorResponse,
            crate::errors::FunctionErrorResponse
        )
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serves the generated document at `/api-docs/openapi.json`.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDocV1::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Medistock API"));
        assert!(json.contains("/api/v1/medicines/{id}/adjust-stock"));
        assert!(json.contains("/api/v1/functions/validateAisle"));
        assert!(json.contains("bearer_auth"));
    }
}
