use crate::{
    commands::{record_write, rejected, Command, CommandContext},
    errors::{ServiceError, ValidationError},
    events::Event,
    models::{Aisle, HistoryAction, HistoryEntry},
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Deletes an empty aisle.
#[derive(Debug, Clone)]
pub struct DeleteAisleCommand {
    pub user_id: String,
    pub aisle_id: Uuid,
}

impl DeleteAisleCommand {
    pub fn new(user_id: impl Into<String>, aisle_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            aisle_id,
        }
    }
}

#[async_trait::async_trait]
impl Command for DeleteAisleCommand {
    type Result = Aisle;

    #[instrument(skip(self, ctx), fields(aisle_id = %self.aisle_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        let aisle = ctx.owned_aisle(&self.user_id, self.aisle_id).await?;

        let count = ctx.repos.medicines.count_in_aisle(aisle.id).await?;
        if count > 0 {
            return Err(rejected(ValidationError::AisleContainsMedicines { count }));
        }

        let audit =
            HistoryEntry::new(&self.user_id, HistoryAction::AisleDeleted, aisle.name.clone())
                .for_aisle(aisle.id);
        ctx.repos.aisles.delete(aisle.id, &audit).await?;
        record_write("aisle", "delete");

        info!(name = %aisle.name, "Aisle deleted");

        ctx.events
            .publish(Event::AisleDeleted {
                user_id: aisle.user_id.clone(),
                aisle_id: aisle.id,
            })
            .await;

        Ok(aisle)
    }
}
