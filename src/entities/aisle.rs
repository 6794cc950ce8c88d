use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::models::Aisle;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "aisles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub color_hex: String,
    pub icon: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::medicine::Entity")]
    Medicines,
}

impl Related<super::medicine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Medicines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Aisle {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            color_hex: model.color_hex,
            icon: model.icon,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Aisle> for ActiveModel {
    fn from(aisle: &Aisle) -> Self {
        Self {
            id: Set(aisle.id),
            user_id: Set(aisle.user_id.clone()),
            name: Set(aisle.name.clone()),
            description: Set(aisle.description.clone()),
            color_hex: Set(aisle.color_hex.clone()),
            icon: Set(aisle.icon.clone()),
            created_at: Set(aisle.created_at),
            updated_at: Set(aisle.updated_at),
        }
    }
}
