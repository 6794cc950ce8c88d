use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::models::HistoryEntry;

/// Append-only audit row. Never updated; rows outlive the medicine they reference.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub medicine_id: Option<Uuid>,
    pub aisle_id: Option<Uuid>,
    pub user_id: String,
    pub action: String,
    #[sea_orm(column_type = "Text")]
    pub details: String,
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for HistoryEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            medicine_id: model.medicine_id,
            aisle_id: model.aisle_id,
            user_id: model.user_id,
            action: model.action,
            details: model.details,
            timestamp: model.timestamp,
        }
    }
}

impl From<&HistoryEntry> for ActiveModel {
    fn from(entry: &HistoryEntry) -> Self {
        Self {
            id: Set(entry.id),
            medicine_id: Set(entry.medicine_id),
            aisle_id: Set(entry.aisle_id),
            user_id: Set(entry.user_id.clone()),
            action: Set(entry.action.clone()),
            details: Set(entry.details.clone()),
            timestamp: Set(entry.timestamp),
        }
    }
}
