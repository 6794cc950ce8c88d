use tracing::instrument;
use uuid::Uuid;

use crate::{
    commands::{
        aisles::{AisleChanges, NewAisle},
        AddAisleCommand, Command, CommandContext, DeleteAisleCommand, UpdateAisleCommand,
    },
    errors::ServiceError,
    models::{Aisle, AisleView},
    queries::{GetAisleQuery, ListAislesQuery, Query, QueryContext},
};

pub struct AisleService {
    commands: CommandContext,
    queries: QueryContext,
}

impl AisleService {
    pub fn new(commands: CommandContext, queries: QueryContext) -> Self {
        Self { commands, queries }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, user_id: &str, input: NewAisle) -> Result<Aisle, ServiceError> {
        AddAisleCommand::new(user_id, input)
            .execute(&self.commands)
            .await
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        changes: AisleChanges,
    ) -> Result<Aisle, ServiceError> {
        UpdateAisleCommand::new(user_id, id, changes)
            .execute(&self.commands)
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<Aisle, ServiceError> {
        DeleteAisleCommand::new(user_id, id)
            .execute(&self.commands)
            .await
    }

    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<AisleView, ServiceError> {
        GetAisleQuery {
            user_id: user_id.to_string(),
            aisle_id: id,
        }
        .execute(&self.queries)
        .await
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<AisleView>, ServiceError> {
        ListAislesQuery {
            user_id: user_id.to_string(),
        }
        .execute(&self.queries)
        .await
    }
}
