use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{map_txn_error, BaseRepository, MedicineFilter, MedicineRepository, RepoResult};
use crate::entities::{history_entry, medicine};
use crate::models::{HistoryEntry, Medicine};

/// Medicines stored through SeaORM (Postgres or SQLite).
#[derive(Debug, Clone)]
pub struct SeaOrmMedicineRepository {
    base: BaseRepository,
}

impl SeaOrmMedicineRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl MedicineRepository for SeaOrmMedicineRepository {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Medicine>> {
        let model = medicine::Entity::find_by_id(id)
            .one(self.base.get_db())
            .await?;
        Ok(model.map(Medicine::from))
    }

    async fn list(&self, filter: &MedicineFilter) -> RepoResult<Vec<Medicine>> {
        let mut query =
            medicine::Entity::find().filter(medicine::Column::UserId.eq(filter.user_id.as_str()));
        if let Some(aisle_id) = filter.aisle_id {
            query = query.filter(medicine::Column::AisleId.eq(aisle_id));
        }

        let models = query
            .order_by_asc(medicine::Column::Name)
            .order_by_asc(medicine::Column::CreatedAt)
            .all(self.base.get_db())
            .await?;
        Ok(models.into_iter().map(Medicine::from).collect())
    }

    async fn count_in_aisle(&self, aisle_id: Uuid) -> RepoResult<u64> {
        let count = medicine::Entity::find()
            .filter(medicine::Column::AisleId.eq(aisle_id))
            .count(self.base.get_db())
            .await?;
        Ok(count)
    }

    #[instrument(skip(self, medicine, audit), fields(medicine_id = %medicine.id))]
    async fn insert(&self, medicine: &Medicine, audit: &HistoryEntry) -> RepoResult<()> {
        let model = medicine::ActiveModel::from(medicine);
        let entry = history_entry::ActiveModel::from(audit);

        self.base
            .get_db()
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    model.insert(txn).await?;
                    entry.insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(map_txn_error)
    }

    #[instrument(skip(self, medicine, audit), fields(medicine_id = %medicine.id))]
    async fn update(&self, medicine: &Medicine, audit: &HistoryEntry) -> RepoResult<()> {
        let model = medicine::ActiveModel::from(medicine);
        let entry = history_entry::ActiveModel::from(audit);

        self.base
            .get_db()
            .transaction::<_, (), DbErr>(|txn| {
                Box::pin(async move {
                    model.update(txn).await?;
                    entry.insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(map_txn_error)
    }

    #[instrument(skip(self, audit))]
    async fn delete(&self, id: Uuid, audit: &HistoryEntry) -> RepoResult<()> {
        let entry = history_entry::ActiveModel::from(audit);

        self.base
            .get_db()
            .transaction::<_, (), DbErr>(move |txn| {
                Box::pin(async move {
                    let result = medicine::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Err(DbErr::RecordNotFound(format!("medicine {}", id)));
                    }
                    entry.insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(map_txn_error)
    }
}
