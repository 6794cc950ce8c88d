use crate::{
    commands::{normalize_optional, record_write, rejected, Command, CommandContext},
    errors::{ServiceError, ValidationError},
    events::Event,
    models::{Aisle, HistoryAction, HistoryEntry},
    validation::validate_aisle,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AisleChanges {
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub color_hex: Option<String>,
    pub icon: Option<String>,
}

impl AisleChanges {
    pub fn apply(&self, current: &Aisle) -> (Aisle, Vec<&'static str>) {
        let mut next = current.clone();
        let mut changed = Vec::new();

        if let Some(name) = &self.name {
            next.name = name.trim().to_string();
            if next.name != current.name {
                changed.push("name");
            }
        }
        if self.description.is_some() {
            next.description = normalize_optional(self.description.clone());
            if next.description != current.description {
                changed.push("description");
            }
        }
        if let Some(color) = &self.color_hex {
            next.color_hex = color.trim().to_string();
            if next.color_hex != current.color_hex {
                changed.push("colorHex");
            }
        }
        if let Some(icon) = &self.icon {
            next.icon = icon.trim().to_string();
            if next.icon != current.icon {
                changed.push("icon");
            }
        }
        (next, changed)
    }
}

#[derive(Debug, Clone)]
pub struct UpdateAisleCommand {
    pub user_id: String,
    pub aisle_id: Uuid,
    pub changes: AisleChanges,
}

impl UpdateAisleCommand {
    pub fn new(user_id: impl Into<String>, aisle_id: Uuid, changes: AisleChanges) -> Self {
        Self {
            user_id: user_id.into(),
            aisle_id,
            changes,
        }
    }
}

#[async_trait::async_trait]
impl Command for UpdateAisleCommand {
    type Result = Aisle;

    #[instrument(skip(self, ctx), fields(aisle_id = %self.aisle_id))]
    async fn execute(&self, ctx: &CommandContext) -> Result<Self::Result, ServiceError> {
        self.changes.validate()?;

        let current = ctx.owned_aisle(&self.user_id, self.aisle_id).await?;
        let (mut next, changed) = self.changes.apply(&current);
        if changed.is_empty() {
            debug!("No field changed; nothing to write");
            return Ok(current);
        }
        validate_aisle(&next).map_err(rejected)?;

        if Aisle::name_key(&next.name) != Aisle::name_key(&current.name) {
            let clash = ctx
                .repos
                .aisles
                .find_by_name(&self.user_id, &next.name)
                .await?;
            if clash.map_or(false, |other| other.id != next.id) {
                return Err(rejected(ValidationError::DuplicateAisleName {
                    name: next.name.clone(),
                }));
            }
        }

        next.updated_at = Utc::now();
        let audit = HistoryEntry::new(
            &self.user_id,
            HistoryAction::AisleUpdated,
            format!("{} : {}", next.name, changed.join(", ")),
        )
        .for_aisle(next.id);
        ctx.repos.aisles.update(&next, &audit).await?;
        record_write("aisle", "update");

        info!(fields = ?changed, "Aisle updated");

        ctx.events
            .publish(Event::AisleUpdated {
                user_id: next.user_id.clone(),
                aisle_id: next.id,
            })
            .await;

        Ok(next)
    }
}
