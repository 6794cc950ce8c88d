use crate::{
    commands::{record_write, Command, CommandContext},
    errors::{MedicineError, ServiceError, StockError},
    events::Event,
    metrics::{STOCK_ADJUSTMENTS, STOCK_ADJUSTMENT_FAILURES},
    models::{HistoryAction, HistoryEntry, Medicine},
    validation::InventoryPolicy,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Outcome of an accepted stock change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockChange {
    pub old_quantity: i32,
    pub new_quantity: i32,
}

impl StockChange {
    pub fn action(&self) -> HistoryAction {
        if self.new_quantity >= self.old_quantity {
            HistoryAction::StockAdded
        } else {
            HistoryAction::StockRemoved
        }
    }
}

/// Applies a signed adjustment to the medicine's quantity, enforcing the stock rules.
pub fn plan_adjustment(
    medicine: &Medicine,
    adjustment: i32,
    policy: &InventoryPolicy,
) -> Result<StockChange, StockError> {
    if adjustment == 0 {
        return Err(StockError::ZeroAdjustment);
    }

    let current = medicine.current_quantity;
    let requested = match current.checked_add(adjustment) {
        Some(value) => value,
        None if adjustment > 0 => {
            return Err(StockError::ExceedsMaximum {
                max: medicine.max_quantity,
                requested: i32::MAX,
            })
        }
        None => return Err(StockError::Negative { current, adjustment }),
    };

    if requested < 0 {
        return Err(StockError::Negative { current, adjustment });
    }
    if requested > medicine.max_quantity {
        return Err(StockError::ExceedsMaximum {
            max: medicine.max_quantity,
            requested,
        });
    }
    if adjustment < 0
        && policy.block_withdrawal_below_critical
        && requested < medicine.critical_threshold
    {
        return Err(StockError::BelowCritical {
            critical: medicine.critical_threshold,
            requested,
        });
    }

    Ok(StockChange {
        old_quantity: current,
        new_quantity: requested,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentRequest {
    /// Signed quantity: positive to restock, negative to withdraw.
    pub adjustment: i32,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAdjustmentResult {
    pub medicine: Medicine,
    pub history_entry: HistoryEntry,
}

#[derive(Debug, Clone)]
pub struct AdjustStockCommand {
    pub user_id: String,
    pub medicine_id: Uuid,
    pub adjustment: i32,
    pub reason: String,
}

impl AdjustStockCommand {
    pub fn new(
        user_id: impl Into<String>,
        medicine_id: Uuid,
        adjustment: i32,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            medicine_id,
            adjustment,
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl Command for AdjustStockCommand {
    type Result = StockAdjustmentResult;

    #[instrument(skip(self, ctx), fields(medicine_id = %self.medicine_id, adjustment = self.adjustment))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        let mut medicine = ctx.owned_medicine(&self.user_id, self.medicine_id).await?;

        let change = plan_adjustment(&medicine, self.adjustment, &ctx.policy).map_err(|e| {
            STOCK_ADJUSTMENT_FAILURES.with_label_values(&[e.reason()]).inc();
            warn!(
                current = medicine.current_quantity,
                adjustment = self.adjustment,
                "Stock adjustment refused: {}",
                e
            );
            ServiceError::from(MedicineError::InvalidQuantity(e))
        })?;

        medicine.current_quantity = change.new_quantity;
        medicine.updated_at = Utc::now();

        let entry = HistoryEntry::new(
            &self.user_id,
            change.action(),
            HistoryEntry::stock_details(&self.reason, change.old_quantity, change.new_quantity),
        )
        .for_medicine(medicine.id)
        .for_aisle(medicine.aisle_id);

        ctx.repos.medicines.update(&medicine, &entry).await?;
        record_write("medicine", "adjust_stock");
        let direction = if self.adjustment > 0 { "in" } else { "out" };
        STOCK_ADJUSTMENTS.with_label_values(&[direction]).inc();

        info!(
            old_quantity = change.old_quantity,
            new_quantity = change.new_quantity,
            "Stock adjusted"
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
    use crate::events::EventSender;
    use crate::models::medicine::sample_medicine;
    use crate::repositories::{
        HistoryFilter, MedicineRepository, MockMedicineRepository, Repositories,
    };
    use assert_matches::assert_matches;
    use std::sync::Arc;

    async fn seeded(ctx: &CommandContext) -> Medicine {
        let medicine = sample_medicine();
        let audit = HistoryEntry::new("user-1", HistoryAction::MedicineAdded, "seed")
            .for_medicine(medicine.id);
        MedicineRepository::insert(ctx.repos.medicines.as_ref(), &medicine, &audit)
            .await
            .unwrap();
        medicine
    }

    #[test]
    fn withdrawal_below_critical_is_refused() {
        let medicine = sample_medicine();
        assert_eq!(
            plan_adjustment(&medicine, -15, &InventoryPolicy::default()),
            Err(StockError::BelowCritical {
                critical: 10,
                requested: 5
            })
        );
        assert_eq!(
            plan_adjustment(&medicine, -5, &InventoryPolicy::default()),
            Ok(StockChange {
                old_quantity: 20,
                new_quantity: 15
            })
        );
    }

    #[test]
    fn critical_guard_can_be_disabled() {
        let policy = InventoryPolicy {
            block_withdrawal_below_critical: false,
            ..InventoryPolicy::default()
        };
        let change = plan_adjustment(&sample_medicine(), -15, &policy).unwrap();
        assert_eq!(change.new_quantity, 5);
        assert_eq!(change.action(), HistoryAction::StockRemoved);
        assert_matches!(
            plan_adjustment(&sample_medicine(), -21, &policy),
            Err(StockError::Negative { current: 20, adjustment: -21 })
        );
    }

    #[test]
    fn restock_is_capped_by_maximum() {
        let medicine = sample_medicine();
        let policy = InventoryPolicy::default();
        assert_matches!(
            plan_adjustment(&medicine, 81, &policy),
            Err(StockError::ExceedsMaximum { max: 100, requested: 101 })
        );
        assert_matches!(plan_adjustment(&medicine, 0, &policy), Err(StockError::ZeroAdjustment));
        assert_matches!(
            plan_adjustment(&medicine, i32::MAX, &policy),
            Err(StockError::ExceedsMaximum { .. })
        );
    }

    #[tokio::test]
    async fn successful_withdrawal_appends_one_history_entry() {
        let ctx = context();
        let medicine = seeded(&ctx).await;

        let result = AdjustStockCommand::new("user-1", medicine.id, -5, "Dispensation")
            .execute(&ctx)
            .await
            .unwrap();

        assert_eq!(result.medicine.current_quantity, 15);
        assert_eq!(result.history_entry.action, "Retrait de stock");
        assert_eq!(result.history_entry.details, "Dispensation (stock: 20 → 15)");

        let history = ctx
            .repos
            .history
            .list(&HistoryFilter::for_user("user-1").for_medicine(medicine.id))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, result.history_entry.id);
    }

    #[tokio::test]
    async fn refused_withdrawal_leaves_stock_and_history_untouched() {
        let ctx = context();
        let medicine = seeded(&ctx).await;

        let result = AdjustStockCommand::new("user-1", medicine.id, -15, "Dispensation")
            .execute(&ctx)
            .await;
        assert_matches!(
            result,
            Err(ServiceError::Medicine(MedicineError::InvalidQuantity(_)))
        );

        let stored = ctx.repos.medicines.find_by_id(medicine.id).await.unwrap().unwrap();
        assert_eq!(stored.current_quantity, 20);
        let history = ctx
            .repos
            .history
            .list(&HistoryFilter::for_user("user-1").for_medicine(medicine.id))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn another_users_medicine_is_not_found() {
        let ctx = context();
        let medicine = seeded(&ctx).await;
        let result = AdjustStockCommand::new("user-2", medicine.id, 1, "")
            .execute(&ctx)
            .await;
        assert_matches!(result, Err(ServiceError::Medicine(MedicineError::NotFound(id))) if id == medicine.id);
    }

    #[tokio::test]
    async fn repository_receives_the_stock_entry_with_the_update() {
        let medicine = sample_medicine();
        let id = medicine.id;
        let mut repo = MockMedicineRepository::new();
        let stored = medicine.clone();
        repo.expect_find_by_id()
            .withf(move |candidate| *candidate == id)
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update()
            .times(1)
            .withf(|medicine, audit| {
                medicine.current_quantity == 30
                    && audit.action == "Ajout de stock"
                    && audit.details == "Livraison (stock: 20 → 30)"
                    && audit.medicine_id == Some(medicine.id)
            })
            .returning(|_, _| Ok(()));

        let mut repos = Repositories::in_memory();
        repos.medicines = Arc::new(repo);
        let (events, _rx) = EventSender::channel(4);
        let ctx = CommandContext::new(repos, events, InventoryPolicy::default());

        let result = AdjustStockCommand::new("user-1", id, 10, "Livraison")
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(result.medicine.current_quantity, 30);
    }

    #[tokio::test]
    async fn refused_adjustment_never_reaches_the_repository() {
        let medicine = sample_medicine();
        let mut repo = MockMedicineRepository::new();
        let stored = medicine.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        repo.expect_update().times(0);

        let mut repos = Repositories::in_memory();
        repos.medicines = Arc::new(repo);
        let (events, _rx) = EventSender::channel(4);
        let ctx = CommandContext::new(repos, events, InventoryPolicy::default());

        let result = AdjustStockCommand::new("user-1", medicine.id, -25, "")
            .execute(&ctx)
            .await;
        assert!(result.is_err());
    }
}
