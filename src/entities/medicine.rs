use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use crate::models::Medicine;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "medicines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub reference: Option<String>,
    pub unit: String,
    pub current_quantity: i32,
    pub max_quantity: i32,
    pub warning_threshold: i32,
    pub critical_threshold: i32,
    pub expiry_date: Option<DateTimeUtc>,
    pub aisle_id: Uuid,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::aisle::Entity",
        from = "Column::AisleId",
        to = "super::aisle::Column::Id"
    )]
    Aisle,
}

impl Related<super::aisle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Aisle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Medicine {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            dosage: model.dosage,
            form: model.form,
            reference: model.reference,
            unit: model.unit,
            current_quantity: model.current_quantity,
            max_quantity: model.max_quantity,
            warning_threshold: model.warning_threshold,
            critical_threshold: model.critical_threshold,
            expiry_date: model.expiry_date,
            aisle_id: model.aisle_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Medicine> for ActiveModel {
    fn from(medicine: &Medicine) -> Self {
        Self {
            id: Set(medicine.id),
            user_id: Set(medicine.user_id.clone()),
            name: Set(medicine.name.clone()),
            description: Set(medicine.description.clone()),
            dosage: Set(medicine.dosage.clone()),
            form: Set(medicine.form.clone()),
            reference: Set(medicine.reference.clone()),
            unit: Set(medicine.unit.clone()),
            current_quantity: Set(medicine.current_quantity),
            max_quantity: Set(medicine.max_quantity),
            warning_threshold: Set(medicine.warning_threshold),
            critical_threshold: Set(medicine.critical_threshold),
            expiry_date: Set(medicine.expiry_date),
            aisle_id: Set(medicine.aisle_id),
            created_at: Set(medicine.created_at),
            updated_at: Set(medicine.updated_at),
        }
    }
}
