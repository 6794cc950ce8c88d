use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::validation::ValidationError;

fn current_request_id() -> Option<String> {
    crate::telemetry::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every REST endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Unprocessable Entity",
    "code": "invalid_quantity",
    "message": "Invalid quantity: stock cannot go negative (current 20, adjustment -25)",
    "details": "Le stock ne peut pas devenir négatif.",
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Machine-readable error code
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "medicine_not_found")]
    pub code: Option<String>,
    /// Human-readable error description (English)
    pub message: String,
    /// Localized message suitable for end users
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    pub timestamp: String,
}

/// Why a stock change was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    #[error("adjustment must not be zero")]
    ZeroAdjustment,

    #[error("stock cannot go negative (current {current}, adjustment {adjustment})")]
    Negative { current: i32, adjustment: i32 },

    #[error("quantity {requested} is negative")]
    NegativeTarget { requested: i32 },

    #[error("quantity {requested} exceeds maximum {max}")]
    ExceedsMaximum { max: i32, requested: i32 },

    #[error("withdrawal would leave {requested}, below critical threshold {critical}")]
    BelowCritical { critical: i32, requested: i32 },
}

impl StockError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ZeroAdjustment => "zero",
            Self::Negative { .. } | Self::NegativeTarget { .. } => "negative",
            Self::ExceedsMaximum { .. } => "exceeds_max",
            Self::BelowCritical { .. } => "below_critical",
        }
    }

    pub fn localized_message(&self) -> String {
        match self {
            Self::ZeroAdjustment => "L'ajustement doit être différent de zéro.".to_string(),
            Self::Negative { .. } | Self::NegativeTarget { .. } => {
                "Le stock ne peut pas devenir négatif.".to_string()
            }
            Self::ExceedsMaximum { max, .. } => {
                format!("Le stock ne peut pas dépasser la quantité maximale ({}).", max)
            }
            Self::BelowCritical { critical, .. } => format!(
                "Ce retrait ferait passer le stock sous le seuil critique ({}).",
                critical
            ),
        }
    }
}

/// Failures specific to medicine lookups and stock changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MedicineError {
    #[error("medicine {0} not found")]
    NotFound(Uuid),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(#[from] StockError),
}

impl MedicineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "medicine_not_found",
            Self::InvalidQuantity(_) => "invalid_quantity",
        }
    }

    pub fn localized_message(&self) -> String {
        match self {
            Self::NotFound(_) => "Ce médicament est introuvable.".to_string(),
            Self::InvalidQuantity(stock) => stock.localized_message(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Medicine(#[from] MedicineError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<crate::auth::AuthError> for ServiceError {
    fn from(err: crate::auth::AuthError) -> Self {
        ServiceError::Unauthorized(err.to_string())
    }
}

impl From<crate::cache::CacheError> for ServiceError {
    fn from(err: crate::cache::CacheError) -> Self {
        ServiceError::CacheError(err.to_string())
    }
}

impl ServiceError {
    pub fn db_error(message: impl Into<String>) -> Self {
        ServiceError::DatabaseError(DbErr::Custom(message.into()))
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(
                ValidationError::DuplicateAisleName { .. }
                | ValidationError::AisleContainsMedicines { .. },
            ) => StatusCode::CONFLICT,
            Self::Validation(_) | Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Medicine(MedicineError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Medicine(MedicineError::InvalidQuantity(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::DatabaseError(_)
            | Self::EventError(_)
            | Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::MigrationError(_)
            | Self::InternalError(_)
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code included in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::Medicine(err) => err.code(),
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Unauthorized(_) => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            _ => "internal_error",
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_)
            | Self::CacheError(_)
            | Self::SerializationError(_)
            | Self::MigrationError(_)
            | Self::InternalError(_)
            | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// End-user message for business-rule failures.
    pub fn localized_message(&self) -> Option<String> {
        match self {
            Self::Validation(err) => Some(err.localized_message()),
            Self::Medicine(err) => Some(err.localized_message()),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            code: Some(self.code().to_string()),
            message: self.response_message(),
            details: self.localized_message(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

/// Status values used by the callable validation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FunctionErrorStatus {
    InvalidArgument,
    Unauthenticated,
    Internal,
}

impl FunctionErrorStatus {
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FunctionErrorDetails {
    pub status: FunctionErrorStatus,
    pub message: String,
}

/// Error envelope of the callable functions: `{"error": {"status", "message"}}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": {
        "status": "INVALID_ARGUMENT",
        "message": "Le nom ne peut pas être vide."
    }
}))]
pub struct FunctionErrorResponse {
    pub error: FunctionErrorDetails,
}

impl FunctionErrorResponse {
    pub fn new(status: FunctionErrorStatus, message: impl Into<String>) -> Self {
        Self {
            error: FunctionErrorDetails {
                status,
                message: message.into(),
            },
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FunctionErrorStatus::InvalidArgument, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            FunctionErrorStatus::Unauthenticated,
            "L'utilisateur doit être authentifié.",
        )
    }
}

impl From<&ServiceError> for FunctionErrorResponse {
    fn from(error: &ServiceError) -> Self {
        match error {
            ServiceError::Validation(err) => Self::invalid_argument(err.localized_message()),
            ServiceError::Medicine(err) => Self::invalid_argument(err.localized_message()),
            ServiceError::InvalidInput(msg) => Self::invalid_argument(msg.clone()),
            ServiceError::Unauthorized(_) => Self::unauthenticated(),
            other => Self::new(FunctionErrorStatus::Internal, other.response_message()),
        }
    }
}

impl From<ServiceError> for FunctionErrorResponse {
    fn from(error: ServiceError) -> Self {
        Self::from(&error)
    }
}

impl IntoResponse for FunctionErrorResponse {
    fn into_response(self) -> Response {
        (self.error.status.http_status(), Json(self)).into_response()
    }
}
