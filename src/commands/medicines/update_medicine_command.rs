use crate::{
    commands::{normalize_optional, record_write, rejected, Command, CommandContext},
    errors::ServiceError,
    events::Event,
    models::{HistoryAction, HistoryEntry, Medicine},
    validation::{validate_medicine, ExpiryCheck},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Partial update. Absent fields keep their value; a blank text field clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineChanges {
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub dosage: Option<String>,
    #[validate(length(max = 100))]
    pub form: Option<String>,
    #[validate(length(max = 100))]
    pub reference: Option<String>,
    pub unit: Option<String>,
    pub current_quantity: Option<i32>,
    pub max_quantity: Option<i32>,
    pub warning_threshold: Option<i32>,
    pub critical_threshold: Option<i32>,
    pub expiry_date: Option<DateTime<Utc>>,
    /// Removes the expiry date; ignored when `expiry_date` is also set.
    #[serde(default)]
    pub clear_expiry_date: bool,
    pub aisle_id: Option<Uuid>,
}

impl MedicineChanges {
    /// Returns the merged record and the camelCase names of the fields that changed.
    pub fn apply(&self, current: &Medicine) -> (Medicine, Vec<&'static str>) {
        let mut next = current.clone();
        let mut changed = Vec::new();

        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
        }
        if let Some(unit) = &self.unit {
            next.unit = unit.trim().to_string();
        }
        if self.description.is_some() {
            next.description = normalize_optional(self.description.clone());
        }
        if self.dosage.is_some() {
            next.dosage = normalize_optional(self.dosage.clone());
        }
        if self.form.is_some() {
            next.form = normalize_optional(self.form.clone());
        }
        if self.reference.is_some() {
            next.reference = normalize_optional(self.reference.clone());
        }
        if let Some(value) = self.current_quantity {
            next.current_quantity = value;
        }
        if let Some(value) = self.max_quantity {
            next.max_quantity = value;
        }
        if let Some(value) = self.warning_threshold {
            next.warning_threshold = value;
        }
        if let Some(value) = self.critical_threshold {
            next.critical_threshold = value;
        }
        if self.expiry_date.is_some() {
            next.expiry_date = self.expiry_date;
        } else if self.clear_expiry_date {
            next.expiry_date = None;
        }
        if let Some(aisle_id) = self.aisle_id {
            next.aisle_id = aisle_id;
        }

        macro_rules! track {
            ($field:ident, $label:literal) => {
                if next.$field != current.$field {
                    changed.push($label);
                }
            };
        }
        track!(name, "name");
        track!(description, "description");
        track!(dosage, "dosage");
        track!(form, "form");
        track!(reference, "reference");
        track!(unit, "unit");
        track!(current_quantity, "currentQuantity");
        track!(max_quantity, "maxQuantity");
        track!(warning_threshold, "warningThreshold");
        track!(critical_threshold, "criticalThreshold");
        track!(expiry_date, "expiryDate");
        track!(aisle_id, "aisleId");

        (next, changed)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateMedicineCommand {
    pub user_id: String,
    pub medicine_id: Uuid,
    pub changes: MedicineChanges,
}

impl UpdateMedicineCommand {
    pub fn new(user_id: impl Into<String>, medicine_id: Uuid, changes: MedicineChanges) -> Self {
        Self {
            user_id: user_id.into(),
            medicine_id,
            changes,
        }
    }
}

fn change_details(before: &Medicine, after: &Medicine, changed: &[&str]) -> String {
    let mut details = format!("{} : {}", after.name, changed.join(", "));
    if before.current_quantity != after.current_quantity {
        details.push_str(&format!(
            " (stock: {} → {})",
            before.current_quantity, after.current_quantity
        ));
    }
    details
}

#[async_trait::async_trait]
impl Command for UpdateMedicineCommand {
    type Result = Medicine;

    #[instrument(skip(self, ctx), fields(medicine_id = %self.medicine_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.changes.validate()?;

        let current = ctx.owned_medicine(&self.user_id, self.medicine_id).await?;
        let (mut next, changed) = self.changes.apply(&current);
        if changed.is_empty() {
            debug!("No field changed; nothing to write");
            return Ok(current);
        }

        let now = Utc::now();
        let expiry_check = if next.expiry_date != current.expiry_date {
            ExpiryCheck::Enforce
        } else {
            ExpiryCheck::Skip
        };
        validate_medicine(&next, now, &ctx.policy, expiry_check).map_err(rejected)?;
        if next.aisle_id != current.aisle_id {
            ctx.ensure_aisle_reference(&self.user_id, next.aisle_id)
                .await?;
        }

        next.updated_at = now;
        let audit = HistoryEntry::new(
            &self.user_id,
            HistoryAction::MedicineUpdated,
            change_details(&current, &next, &changed),
        )
        .for_medicine(next.id)
        .for_aisle(next.aisle_id);

        ctx.repos.medicines.update(&next, &audit).await?;
        record_write("medicine", "update");

        info!(fields = ?changed, "Medicine updated");

        ctx.events
            .publish(Event::MedicineUpdated {
                user_id: next.user_id.clone(),
                medicine_id: next.id,
                aisle_id: next.aisle_id,
            })
            .await;
        if next.current_quantity != current.current_quantity {
            ctx.events
                .publish(Event::StockAdjusted {
                    user_id: next.user_id.clone(),
                    medicine_id: next.id,
                    aisle_id: next.aisle_id,
                    old_quantity: current.current_quantity,
                    new_quantity: next.current_quantity,
                    status: next.stock_status(),
                })
                .await;
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{context, seed_aisle};
    use crate::errors::ValidationError;
    use crate::models::medicine::sample_medicine;
    use crate::repositories::{HistoryFilter, MedicineRepository};
    use assert_matches::assert_matches;
    use chrono::Duration;

    async fn seeded(ctx: &CommandContext) -> Medicine {
        let aisle = seed_aisle(ctx, "user-1").await;
        let mut medicine = sample_medicine();
        medicine.aisle_id = aisle.id;
        let audit = HistoryEntry::new("user-1", HistoryAction::MedicineAdded, "seed")
            .for_medicine(medicine.id);
        MedicineRepository::insert(ctx.repos.medicines.as_ref(), &medicine, &audit)
            .await
            .unwrap();
        medicine
    }

    #[test]
    fn apply_reports_only_real_changes() {
        let medicine = sample_medicine();
        let changes = MedicineChanges {
            name: Some(" Doliprane ".into()),
            dosage: Some("1 g".into()),
            form: Some("".into()),
            current_quantity: Some(12),
            ..Default::default()
        };
        let (next, changed) = changes.apply(&medicine);
        assert_eq!(changed, vec!["dosage", "form", "currentQuantity"]);
        assert_eq!(next.form, None);
        assert_eq!(
            change_details(&medicine, &next, &changed),
            "Doliprane : dosage, form, currentQuantity (stock: 20 → 12)"
        );
    }

    #[tokio::test]
    async fn update_writes_modification_entry() {
        let ctx = context();
        let medicine = seeded(&ctx).await;
        let changes = MedicineChanges {
            reference: Some("DOL-1000".into()),
            ..Default::default()
        };

        let updated = UpdateMedicineCommand::new("user-1", medicine.id, changes)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(updated.reference.as_deref(), Some("DOL-1000"));

        let history = ctx
            .repos
            .history
            .list(&HistoryFilter::for_user("user-1").for_medicine(medicine.id))
            .await
            .unwrap();
        assert_eq!(history[0].action, "Modification médicament");
        assert_eq!(history[0].details, "Doliprane : reference");
    }

    #[tokio::test]
    async fn expired_stock_stays_editable_until_the_date_changes() {
        let ctx = context();
        let mut medicine = seeded(&ctx).await;
        medicine.expiry_date = Some(Utc::now() - Duration::days(3));
        let audit = HistoryEntry::new("user-1", HistoryAction::MedicineUpdated, "backdate");
        MedicineRepository::update(ctx.repos.medicines.as_ref(), &medicine, &audit)
            .await
            .unwrap();

        let rename = MedicineChanges {
            name: Some("Doliprane 500".into()),
            ..Default::default()
        };
        assert!(UpdateMedicineCommand::new("user-1", medicine.id, rename)
            .execute(&ctx)
            .await
            .is_ok());

        let backdate = MedicineChanges {
            expiry_date: Some(Utc::now() - Duration::days(1)),
            ..Default::default()
        };
        assert_matches!(
            UpdateMedicineCommand::new("user-1", medicine.id, backdate)
                .execute(&ctx)
                .await,
            Err(ServiceError::Validation(ValidationError::ExpiredDate { .. }))
        );
    }

    #[tokio::test]
    async fn threshold_inversion_is_refused() {
        let ctx = context();
        let medicine = seeded(&ctx).await;
        let changes = MedicineChanges {
            warning_threshold: Some(5),
            ..Default::default()
        };
        assert_matches!(
            UpdateMedicineCommand::new("user-1", medicine.id, changes)
                .execute(&ctx)
                .await,
            Err(ServiceError::Validation(ValidationError::InvalidThresholds { critical: 10, warning: 5 }))
        );
    }

    #[tokio::test]
    async fn moving_to_unknown_aisle_is_refused() {
        let ctx = context();
        let medicine = seeded(&ctx).await;
        let changes = MedicineChanges {
            aisle_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        assert_matches!(
            UpdateMedicineCommand::new("user-1", medicine.id, changes)
                .execute(&ctx)
                .await,
            Err(ServiceError::Validation(ValidationError::InvalidAisleReference { .. }))
        );
    }

    #[tokio::test]
    async fn empty_change_set_writes_nothing() {
        let ctx = context();
        let medicine = seeded(&ctx).await;
        let unchanged =
            UpdateMedicineCommand::new("user-1", medicine.id, MedicineChanges::default())
                .execute(&ctx)
                .await
                .unwrap();
        assert_eq!(unchanged, medicine);
        let history = ctx
            .repos
            .history
            .list(&HistoryFilter::for_user("user-1").for_medicine(medicine.id))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }
}
