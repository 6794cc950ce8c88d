use crate::{
    commands::{record_write, Command, CommandContext},
    errors::{MedicineError, ServiceError, StockError},
    events::Event,
    metrics::{STOCK_ADJUSTMENTS, STOCK_ADJUSTMENT_FAILURES},
    models::{HistoryAction, HistoryEntry, Medicine},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::adjust_stock_command::{StockAdjustmentResult, StockChange};

/// Validates an absolute quantity, as entered after a physical count.
pub fn plan_stock_update(medicine: &Medicine, quantity: i32) -> Result<StockChange, StockError> {
    if quantity < 0 {
        return Err(StockError::NegativeTarget {
            requested: quantity,
        });
    }
    if quantity > medicine.max_quantity {
        return Err(StockError::ExceedsMaximum {
            max: medicine.max_quantity,
            requested: quantity,
        });
    }
    Ok(StockChange {
        old_quantity: medicine.current_quantity,
        new_quantity: quantity,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockUpdateRequest {
    pub quantity: i32,
    #[validate(length(max = 200))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateStockCommand {
    pub user_id: String,
    pub medicine_id: Uuid,
    pub quantity: i32,
    pub reason: Option<String>,
}

impl UpdateStockCommand {
    pub fn new(
        user_id: impl Into<String>,
        medicine_id: Uuid,
        quantity: i32,
        reason: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            medicine_id,
            quantity,
            reason,
        }
    }
}

#[async_trait::async_trait]
impl Command for UpdateStockCommand {
    type Result = StockAdjustmentResult;

    #[instrument(skip(self, ctx), fields(medicine_id = %self.medicine_id, quantity = self.quantity))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        let mut medicine = ctx.owned_medicine(&self.user_id, self.medicine_id).await?;

        let change = plan_stock_update(&medicine, self.quantity).map_err(|e| {
            STOCK_ADJUSTMENT_FAILURES.with_label_values(&[e.reason()]).inc();
            warn!("Stock update refused: {}", e);
            ServiceError::from(MedicineError::InvalidQuantity(e))
        })?;

        medicine.current_quantity = change.new_quantity;
        medicine.updated_at = Utc::now();

        let reason = self.reason.as_deref().unwrap_or("Inventaire");
        let entry = HistoryEntry::new(
            &self.user_id,
            HistoryAction::StockSet,
            HistoryEntry::stock_details(reason, change.old_quantity, change.new_quantity),
        )
        .for_medicine(medicine.id)
        .for_aisle(medicine.aisle_id);

        ctx.repos.medicines.update(&medicine, &entry).await?;
        record_write("medicine", "set_stock");
        STOCK_ADJUSTMENTS.with_label_values(&["set"]).inc();

        info!(
            old_quantity = change.old_quantity,
            new_quantity = change.new_quantity,
            "Stock level set"
        );

        ctx.events
            .publish(Event::StockAdjusted {
                user_id: medicine.user_id.clone(),
                medicine_id: medicine.id,
                aisle_id: medicine.aisle_id,
                old_quantity: change.old_quantity,
                new_quantity: change.new_quantity,
                status: medicine.stock_status(),
            })
            .await;

        Ok(StockAdjustmentResult {
            medicine,
            history_entry: entry,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::models::medicine::sample_medicine;
    use crate::repositories::MedicineRepository;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case(-1, false)]
    #[case(0, true)]
    #[case(100, true)]
    #[case(101, false)]
    fn absolute_quantity_stays_within_bounds(#[case] quantity: i32, #[case] accepted: bool) {
        assert_eq!(plan_stock_update(&sample_medicine(), quantity).is_ok(), accepted);
    }

    #[tokio::test]
    async fn count_is_recorded_as_stock_update() {
        let ctx = context();
        let medicine = sample_medicine();
        let seed = HistoryEntry::new("user-1", HistoryAction::MedicineAdded, "seed");
        MedicineRepository::insert(ctx.repos.medicines.as_ref(), &medicine, &seed)
            .await
            .unwrap();

        let result = UpdateStockCommand::new("user-1", medicine.id, 42, None)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result.medicine.current_quantity, 42);
        assert_eq!(result.history_entry.action, "Mise à jour du stock");
        assert_eq!(result.history_entry.details, "Inventaire (stock: 20 → 42)");

        let refused = UpdateStockCommand::new("user-1", medicine.id, -3, None)
            .execute(&ctx)
            .await;
        assert_matches!(
            refused,
            Err(ServiceError::Medicine(MedicineError::InvalidQuantity(StockError::NegativeTarget { requested: -3 })))
        );
    }
}
