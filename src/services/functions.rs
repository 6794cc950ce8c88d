//! Server-side re-validation of client input.
//!
//! Backs the two callable endpoints `validateAisle` and `validateMedicine`.
//! Fields are optional in the payload so a missing value is reported as a
//! business-rule violation rather than a decoding failure.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    commands::rejected,
    errors::{ServiceError, ValidationError},
    models::Aisle,
    repositories::Repositories,
    validation::{
        validate_color_hex, validate_icon, validate_name, validate_non_negative,
        validate_thresholds, AISLE_NAME_MAX_LEN, MEDICINE_NAME_MAX_LEN,
    },
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateAisleRequest {
    pub name: Option<String>,
    pub color_hex: Option<String>,
    pub icon: Option<String>,
    /// Set when validating an edit; that aisle is ignored by the uniqueness check.
    pub aisle_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidateMedicineRequest {
    pub name: Option<String>,
    pub current_quantity: Option<i32>,
    pub critical_threshold: Option<i32>,
    pub warning_threshold: Option<i32>,
    pub aisle_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationOutcome {
    pub valid: bool,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self { valid: true }
    }
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::MissingRequiredField {
        field: field.to_string(),
    })
}

pub struct ValidationFunctions {
    repos: Repositories,
}

impl ValidationFunctions {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    #[instrument(skip(self, request))]
    pub async fn validate_aisle(
        &self,
        user_id: &str,
        request: &ValidateAisleRequest,
    ) -> Result<ValidationOutcome, ServiceError> {
        let name = required(request.name.as_deref(), "name").map_err(rejected)?;
        validate_name(name, AISLE_NAME_MAX_LEN).map_err(rejected)?;
        let color = required(request.color_hex.as_deref(), "colorHex").map_err(rejected)?;
        validate_color_hex(color).map_err(rejected)?;
        let icon = required(request.icon.as_deref(), "icon").map_err(rejected)?;
        validate_icon(icon).map_err(rejected)?;

        if let Some(existing) = self.repos.aisles.find_by_name(user_id, name).await? {
            if Some(existing.id) != request.aisle_id {
                return Err(rejected(ValidationError::DuplicateAisleName {
                    name: name.trim().to_string(),
                }));
            }
        }

        debug!(name = %Aisle::name_key(name), "aisle payload valid");
        Ok(ValidationOutcome::valid())
    }

    #[instrument(skip(self, request))]
    pub async fn validate_medicine(
        &self,
        user_id: &str,
        request: &ValidateMedicineRequest,
    ) -> Result<ValidationOutcome, ServiceError> {
        let name = required(request.name.as_deref(), "name").map_err(rejected)?;
        validate_name(name, MEDICINE_NAME_MAX_LEN).map_err(rejected)?;
        let quantity =
            required(request.current_quantity, "currentQuantity").map_err(rejected)?;
        validate_non_negative("currentQuantity", quantity).map_err(rejected)?;
        let critical =
            required(request.critical_threshold, "criticalThreshold").map_err(rejected)?;
        let warning = required(request.warning_threshold, "warningThreshold").map_err(rejected)?;
        validate_thresholds(critical, warning).map_err(rejected)?;

        let aisle_id = required(request.aisle_id, "aisleId").map_err(rejected)?;
        match self.repos.aisles.find_by_id(aisle_id).await? {
            Some(aisle) if aisle.user_id == user_id => {}
            _ => return Err(rejected(ValidationError::InvalidAisleReference { aisle_id })),
        }

        debug!("medicine payload valid");
        Ok(ValidationOutcome::valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aisle::sample_aisle;
    use crate::models::{HistoryAction, HistoryEntry};
    use assert_matches::assert_matches;

    async fn with_aisle() -> (ValidationFunctions, Aisle) {
        let repos = Repositories::in_memory();
        let aisle = sample_aisle();
        let audit = HistoryEntry::new("user-1", HistoryAction::AisleAdded, "seed");
        repos.aisles.insert(&aisle, &audit).await.unwrap();
        (ValidationFunctions::new(repos), aisle)
    }

    fn aisle_request(name: &str) -> ValidateAisleRequest {
        ValidateAisleRequest {
            name: Some(name.into()),
            color_hex: Some("#FFAA00".into()),
            icon: Some("pills".into()),
            aisle_id: None,
        }
    }

    #[tokio::test]
    async fn aisle_name_must_be_unique_except_for_itself() {
        let (functions, aisle) = with_aisle().await;

        assert_matches!(
            functions.validate_aisle("user-1", &aisle_request("antalgiques")).await,
            Err(ServiceError::Validation(ValidationError::DuplicateAisleName { .. }))
        );

        let mut edit = aisle_request("Antalgiques");
        edit.aisle_id = Some(aisle.id);
        assert_eq!(
            functions.validate_aisle("user-1", &edit).await.unwrap(),
            ValidationOutcome::valid()
        );
        assert!(functions.validate_aisle("user-2", &aisle_request("Antalgiques")).await.is_ok());
    }

    #[tokio::test]
    async fn missing_fields_are_reported_by_name() {
        let (functions, _) = with_aisle().await;
        let request = ValidateAisleRequest {
            name: Some("Nouveau".into()),
            ..Default::default()
        };
        assert_matches!(
            functions.validate_aisle("user-1", &request).await,
            Err(ServiceError::Validation(ValidationError::MissingRequiredField { field })) if field == "colorHex"
        );
    }

    #[tokio::test]
    async fn medicine_checks_thresholds_and_aisle() {
        let (functions, aisle) = with_aisle().await;
        let mut request = ValidateMedicineRequest {
            name: Some("Ibuprofène".into()),
            current_quantity: Some(4),
            critical_threshold: Some(5),
            warning_threshold: Some(10),
            aisle_id: Some(aisle.id),
        };
        assert!(functions.validate_medicine("user-1", &request).await.is_ok());

        request.critical_threshold = Some(10);
        assert_matches!(
            functions.validate_medicine("user-1", &request).await,
            Err(ServiceError::Validation(ValidationError::InvalidThresholds { .. }))
        );

        request.critical_threshold = Some(5);
        assert_matches!(
            functions.validate_medicine("user-2", &request).await,
            Err(ServiceError::Validation(ValidationError::InvalidAisleReference { .. }))
        );

        request.current_quantity = Some(-1);
        assert_matches!(
            functions.validate_medicine("user-1", &request).await,
            Err(ServiceError::Validation(ValidationError::NegativeQuantity { .. }))
        );
    }
}
