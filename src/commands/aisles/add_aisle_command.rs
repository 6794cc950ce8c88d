use crate::{
    commands::{normalize_optional, record_write, rejected, Command, CommandContext},
    errors::{ServiceError, ValidationError},
    events::Event,
    models::{Aisle, HistoryAction, HistoryEntry},
    validation::validate_aisle,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAisle {
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub color_hex: String,
    pub icon: String,
}

#[derive(Debug, Clone)]
pub struct AddAisleCommand {
    pub user_id: String,
    pub aisle: NewAisle,
}

impl AddAisleCommand {
    pub fn new(user_id: impl Into<String>, aisle: NewAisle) -> Self {
        Self {
            user_id: user_id.into(),
            aisle,
        }
    }
}

#[async_trait::async_trait]
impl Command for AddAisleCommand {
    type Result = Aisle;

    #[instrument(skip(self, ctx), fields(user_id = %self.user_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.aisle.validate()?;

        let now = Utc::now();
        let aisle = Aisle {
            id: Uuid::new_v4(),
            user_id: self.user_id.clone(),
            name: self.aisle.name.trim().to_string(),
            description: normalize_optional(self.aisle.description.clone()),
            color_hex: self.aisle.color_hex.trim().to_string(),
            icon: self.aisle.icon.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        validate_aisle(&aisle).map_err(rejected)?;

        let max = ctx.policy.max_aisles_per_user;
        let owned = ctx.repos.aisles.count_for_user(&self.user_id).await?;
        if owned >= max as u64 {
            return Err(rejected(ValidationError::TooManyAisles { max }));
        }
        if ctx
            .repos
            .aisles
            .find_by_name(&self.user_id, &aisle.name)
            .await?
            .is_some()
        {
            return Err(rejected(ValidationError::DuplicateAisleName {
                name: aisle.name.clone(),
            }));
        }

        let audit = HistoryEntry::new(&self.user_id, HistoryAction::AisleAdded, aisle.name.clone())
            .for_aisle(aisle.id);
        ctx.repos.aisles.insert(&aisle, &audit).await?;
        record_write("aisle", "create");

        info!(aisle_id = %aisle.id, name = %aisle.name, "Aisle added");

        ctx.events
            .publish(Event::AisleCreated {
                user_id: aisle.user_id.clone(),
                aisle_id: aisle.id,
                name: aisle.name.clone(),
            })
            .await;

        Ok(aisle)
    }
}

#[cfg(test)]
pub(crate) fn sample_new_aisle(name: &str) -> NewAisle {
    NewAisle {
        name: name.to_string(),
        description: None,
        color_hex: "#22AA88".to_string(),
        icon: "cross.case".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context;
    use crate::events::EventSender;
    use crate::repositories::Repositories;
    use crate::validation::InventoryPolicy;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn duplicate_names_differ_only_by_case_and_spaces() {
        let ctx = context();
        AddAisleCommand::new("user-1", sample_new_aisle("Antibiotiques"))
            .execute(&ctx)
            .await
            .unwrap();

        let result = AddAisleCommand::new("user-1", sample_new_aisle("  antibiotiques "))
            .execute(&ctx)
            .await;
        assert_matches!(
            result,
            Err(ServiceError::Validation(ValidationError::DuplicateAisleName { .. }))
        );

        // Names are only unique per user.
        assert!(AddAisleCommand::new("user-2", sample_new_aisle("Antibiotiques"))
            .execute(&ctx)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn aisle_count_is_capped_per_user() {
        let (events, _rx) = EventSender::channel(16);
        let policy = InventoryPolicy {
            max_aisles_per_user: 2,
            ..InventoryPolicy::default()
        };
        let ctx = CommandContext::new(Repositories::in_memory(), events, policy);

        for name in ["A", "B"] {
            AddAisleCommand::new("user-1", sample_new_aisle(name))
                .execute(&ctx)
                .await
                .unwrap();
        }
        assert_matches!(
            AddAisleCommand::new("user-1", sample_new_aisle("C")).execute(&ctx).await,
            Err(ServiceError::Validation(ValidationError::TooManyAisles { max: 2 }))
        );
    }

    #[tokio::test]
    async fn malformed_colour_and_icon_are_rejected() {
        let ctx = context();
        let mut input = sample_new_aisle("Pansements");
        input.color_hex = "22AA88".into();
        assert_matches!(
            AddAisleCommand::new("user-1", input).execute(&ctx).await,
            Err(ServiceError::Validation(ValidationError::InvalidColorFormat))
        );

        let mut input = sample_new_aisle("Pansements");
        input.icon = "rocket".into();
        assert_matches!(
            AddAisleCommand::new("user-1", input).execute(&ctx).await,
            Err(ServiceError::Validation(ValidationError::InvalidIcon { .. }))
        );
    }
}
