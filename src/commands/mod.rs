use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::{
    errors::{MedicineError, ServiceError, ValidationError},
    events::EventSender,
    metrics::{HISTORY_ENTRIES_WRITTEN, MUTATIONS, VALIDATION_FAILURES},
    models::{Aisle, Medicine},
    repositories::Repositories,
    validation::InventoryPolicy,
};

pub mod aisles;
pub mod medicines;

pub use aisles::{AddAisleCommand, DeleteAisleCommand, UpdateAisleCommand};
pub use medicines::{
    AddMedicineCommand, AdjustStockCommand, DeleteMedicineCommand, UpdateMedicineCommand,
    UpdateStockCommand,
};

/// Everything a use-case needs, built once at startup and shared.
#[derive(Clone)]
pub struct CommandContext {
    pub repos: Repositories,
    pub events: EventSender,
    pub policy: InventoryPolicy,
}

impl CommandContext {
    pub fn new(repos: Repositories, events: EventSender, policy: InventoryPolicy) -> Self {
        Self {
            repos,
            events,
            policy,
        }
    }

    /// Loads a medicine owned by `user_id`. Other users' records read as missing.
    pub async fn owned_medicine(&self, user_id: &str, id: Uuid) -> Result<Medicine, ServiceError> {
        match self.repos.medicines.find_by_id(id).await? {
            Some(medicine) if medicine.user_id == user_id => Ok(medicine),
            _ => Err(MedicineError::NotFound(id).into()),
        }
    }

    pub async fn owned_aisle(&self, user_id: &str, id: Uuid) -> Result<Aisle, ServiceError> {
        match self.repos.aisles.find_by_id(id).await? {
            Some(aisle) if aisle.user_id == user_id => Ok(aisle),
            _ => Err(ServiceError::NotFound(format!("Aisle {} not found", id))),
        }
    }

    /// Fails with `InvalidAisleReference` unless the aisle exists and belongs to the user.
    pub async fn ensure_aisle_reference(
        &self,
        user_id: &str,
        aisle_id: Uuid,
    ) -> Result<(), ServiceError> {
        match self.repos.aisles.find_by_id(aisle_id).await? {
            Some(aisle) if aisle.user_id == user_id => Ok(()),
            _ => Err(rejected(ValidationError::InvalidAisleReference { aisle_id })),
        }
    }
}

/// Command trait for implementing the Command Pattern
///
/// Each verb of the inventory workflow is one command: it validates its input,
/// persists the change together with its audit entry, then publishes an event.
#[async_trait]
pub trait Command: Send + Sync {
    /// The return type of the command when executed successfully
    type Result;

    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError>;
}

/// Counts and logs a business-rule violation before it is returned.
pub(crate) fn rejected(err: ValidationError) -> ServiceError {
    VALIDATION_FAILURES.with_label_values(&[err.code()]).inc();
    warn!(code = err.code(), "validation failed: {}", err);
    ServiceError::Validation(err)
}

pub(crate) fn record_write(entity: &str, action: &str) {
    HISTORY_ENTRIES_WRITTEN.inc();
    MUTATIONS.with_label_values(&[entity, action]).inc();
}

/// Trims an optional text field; blank values become `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::aisle::sample_aisle;
    use crate::models::{HistoryAction, HistoryEntry};
    use crate::repositories::AisleRepository;

    pub fn context() -> CommandContext {
        let (events, _rx) = EventSender::channel(64);
        CommandContext::new(Repositories::in_memory(), events, InventoryPolicy::default())
    }

    /// Context whose event receiver is kept so tests can inspect published events.
    pub fn context_with_events() -> (
        CommandContext,
        tokio::sync::mpsc::Receiver<crate::events::Event>,
    ) {
        let (events, rx) = EventSender::channel(64);
        (
            CommandContext::new(Repositories::in_memory(), events, InventoryPolicy::default()),
            rx,
        )
    }

    pub async fn seed_aisle(ctx: &CommandContext, user_id: &str) -> Aisle {
        let mut aisle = sample_aisle();
        aisle.user_id = user_id.to_string();
        let audit = HistoryEntry::new(user_id, HistoryAction::AisleAdded, aisle.name.clone())
            .for_aisle(aisle.id);
        AisleRepository::insert(ctx.repos.aisles.as_ref(), &aisle, &audit)
            .await
            .unwrap();
        aisle
    }
}
