use crate::{
    commands::{record_write, Command, CommandContext},
    errors::ServiceError,
    events::Event,
    models::{HistoryAction, HistoryEntry, Medicine},
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Removes a medicine. Its audit trail is kept.
#[derive(Debug, Clone)]
pub struct DeleteMedicineCommand {
    pub user_id: String,
    pub medicine_id: Uuid,
}

impl DeleteMedicineCommand {
    pub fn new(user_id: impl Into<String>, medicine_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            medicine_id,
        }
    }
}

#[async_trait::async_trait]
impl Command for DeleteMedicineCommand {
    type Result = Medicine;

    #[instrument(skip(self, ctx), fields(medicine_id = %self.medicine_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        let medicine = ctx.owned_medicine(&self.user_id, self.medicine_id).await?;

        let audit = HistoryEntry::new(
            &self.user_id,
            HistoryAction::MedicineDeleted,
            format!("{} (stock: {})", medicine.name, medicine.current_quantity),
        )
        .for_medicine(medicine.id)
        .for_aisle(medicine.aisle_id);

        ctx.repos.medicines.delete(medicine.id, &audit).await?;
        record_write("medicine", "delete");

        info!(name = %medicine.name, "Medicine deleted");

        ctx.events
            .publish(Event::MedicineDeleted {
                user_id: medicine.user_id.clone(),
                medicine_id: medicine.id,
                aisle_id: medicine.aisle_id,
            })
            .await;

        Ok(medicine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::errors::MedicineError;
    use crate::models::medicine::sample_medicine;
    use crate::repositories::{HistoryFilter, MedicineRepository};
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn deletion_keeps_history_and_adds_an_entry() {
        let ctx = context();
        let medicine = sample_medicine();
        let seed = HistoryEntry::new("user-1", HistoryAction::MedicineAdded, "seed")
            .for_medicine(medicine.id);
        MedicineRepository::insert(ctx.repos.medicines.as_ref(), &medicine, &seed)
            .await
            .unwrap();

        DeleteMedicineCommand::new("user-1", medicine.id)
            .execute(&ctx)
            .await
            .unwrap();

        let history = ctx
            .repos
            .history
            .list(&HistoryFilter::for_user("user-1").for_medicine(medicine.id))
            .await
            .unwrap();
        let actions: Vec<&str> = history.iter().map(|h| h.action.as_str()).collect();
        assert_eq!(actions, vec!["Suppression médicament", "Ajout médicament"]);

        assert_matches!(
            DeleteMedicineCommand::new("user-1", medicine.id).execute(&ctx).await,
            Err(ServiceError::Medicine(MedicineError::NotFound(_)))
        );
    }
}
