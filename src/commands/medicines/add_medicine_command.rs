use crate::{
    commands::{normalize_optional, record_write, rejected, Command, CommandContext},
    errors::ServiceError,
    events::Event,
    models::{HistoryAction, HistoryEntry, Medicine},
    validation::{validate_medicine, ExpiryCheck},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Payload describing a medicine to create.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicine {
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub dosage: Option<String>,
    #[validate(length(max = 100))]
    pub form: Option<String>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub current_quantity: i32,
    pub max_quantity: i32,
    pub warning_threshold: i32,
    pub critical_threshold: i32,
    pub expiry_date: Option<DateTime<Utc>>,
    pub aisle_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct AddMedicineCommand {
    pub user_id: String,
    pub medicine: NewMedicine,
}

impl AddMedicineCommand {
    pub fn new(user_id: impl Into<String>, medicine: NewMedicine) -> Self {
        Self {
            user_id: user_id.into(),
            medicine,
        }
    }

    fn build(&self, now: DateTime<Utc>) -> Medicine {
        let input = self.medicine.clone();
        Medicine {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            name: input.name.trim().to_string(),
            description: normalize_optional(input.description),
            dosage: normalize_optional(input.dosage),
            form: normalize_optional(input.form),
            reference: normalize_optional(input.reference),
            unit: input.unit.trim().to_string(),
            current_quantity: input.current_quantity,
            max_quantity: input.max_quantity,
            warning_threshold: input.warning_threshold,
            critical_threshold: input.critical_threshold,
            expiry_date: input.expiry_date,
            aisle_id: input.aisle_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait::async_trait]
impl Command for AddMedicineCommand {
    type Result = Medicine;

    #[instrument(skip(self, ctx), fields(user_id = %self.user_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.medicine.validate()?;

        let now = Utc::now();
        let medicine = self.build(now);
        validate_medicine(&medicine, now, &ctx.policy, ExpiryCheck::Enforce).map_err(rejected)?;
        ctx.ensure_aisle_reference(&self.user_id, medicine.aisle_id)
            .await?;

        let audit = HistoryEntry::new(
            &self.user_id,
            HistoryAction::MedicineAdded,
            format!("{} (stock: {})", medicine.name, medicine.current_quantity),
        )
        .for_medicine(medicine.id)
        .for_aisle(medicine.aisle_id);

        ctx.repos.medicines.insert(&medicine, &audit).await?;
        record_write("medicine", "create");

        info!(medicine_id = %medicine.id, name = %medicine.name, "Medicine added");

        ctx.events
            .publish(Event::MedicineCreated {
                user_id: medicine.user_id.clone(),
                medicine_id: medicine.id,
                aisle_id: medicine.aisle_id,
                name: medicine.name.clone(),
            })
            .await;

        Ok(medicine)
    }
}

#[cfg(test)]
pub(crate) fn sample_new_medicine(aisle_id: Uuid) -> NewMedicine {
    NewMedicine {
        name: "  Doliprane ".to_string(),
        description: Some("Paracétamol".to_string()),
        dosage: Some("500 mg".to_string()),
        form: Some(" ".to_string()),
        reference: Some("DOL-500".to_string()),
        unit: "boîte".to_string(),
        current_quantity: 20,
        max_quantity: 100,
        warning_threshold: 20,
        critical_threshold: 10,
        expiry_date: Some(Utc::now() + chrono::Duration::days(200)),
        aisle_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, context_with_events, seed_aisle};
    use crate::errors::ValidationError;
    use crate::repositories::HistoryFilter;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn saved_medicine_reads_back_with_server_id() {
        let (ctx, mut events) = context_with_events();
        let aisle = seed_aisle(&ctx, "user-1").await;

        let saved = AddMedicineCommand::new("user-1", sample_new_medicine(aisle.id))
            .execute(&ctx)
            .await
            .unwrap();

        assert_eq!(saved.name, "Doliprane");
        assert_eq!(saved.form, None);
        let fetched = ctx.repos.medicines.find_by_id(saved.id).await.unwrap();
        assert_eq!(fetched, Some(saved.clone()));

        let history = ctx
            .repos
            .history
            .list(&HistoryFilter::for_user("user-1").for_medicine(saved.id))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].action, "Ajout médicament");

        assert_matches!(events.try_recv(), Ok(Event::MedicineCreated { medicine_id, .. }) if medicine_id == saved.id);
    }

    #[tokio::test]
    async fn unknown_aisle_is_rejected() {
        let ctx = context();
        let missing = Uuid::new_v4();
        let result = AddMedicineCommand::new("user-1", sample_new_medicine(missing))
            .execute(&ctx)
            .await;
        assert_matches!(
            result,
            Err(ServiceError::Validation(ValidationError::InvalidAisleReference { aisle_id })) if aisle_id == missing
        );
    }

    #[tokio::test]
    async fn inverted_thresholds_are_rejected_before_any_write() {
        let ctx = context();
        let aisle = seed_aisle(&ctx, "user-1").await;
        let mut input = sample_new_medicine(aisle.id);
        input.critical_threshold = 30;

        let result = AddMedicineCommand::new("user-1", input).execute(&ctx).await;
        assert_matches!(
            result,
            Err(ServiceError::Validation(ValidationError::InvalidThresholds { critical: 30, warning: 20 }))
        );
        let stored = ctx
            .repos
            .medicines
            .list(&crate::repositories::MedicineFilter::for_user("user-1"))
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn past_expiry_is_rejected_on_creation() {
        let ctx = context();
        let aisle = seed_aisle(&ctx, "user-1").await;
        let mut input = sample_new_medicine(aisle.id);
        input.expiry_date = Some(Utc::now() - chrono::Duration::days(1));

        let result = AddMedicineCommand::new("user-1", input).execute(&ctx).await;
        assert_matches!(result, Err(ServiceError::Validation(ValidationError::ExpiredDate { .. })));
    }
}
