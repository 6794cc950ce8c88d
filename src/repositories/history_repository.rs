use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use std::sync::Arc;

use super::{BaseRepository, HistoryFilter, HistoryRepository, RepoResult};
use crate::entities::history_entry;
use crate::models::HistoryEntry;

#[derive(Debug, Clone)]
pub struct SeaOrmHistoryRepository {
    base: BaseRepository,
}

impl SeaOrmHistoryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl HistoryRepository for SeaOrmHistoryRepository {
    async fn append(&self, entry: &HistoryEntry) -> RepoResult<()> {
        history_entry::ActiveModel::from(entry)
            .insert(self.base.get_db())
            .await?;
        Ok(())
    }

    async fn list(&self, filter: &HistoryFilter) -> RepoResult<Vec<HistoryEntry>> {
        let mut query = history_entry::Entity::find()
            .filter(history_entry::Column::UserId.eq(filter.user_id.as_str()));
        if let Some(medicine_id) = filter.medicine_id {
            query = query.filter(history_entry::Column::MedicineId.eq(medicine_id));
        }
        if let Some(aisle_id) = filter.aisle_id {
            query = query.filter(history_entry::Column::AisleId.eq(aisle_id));
        }

        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let models = query
            .order_by_desc(history_entry::Column::Timestamp)
            .all(self.base.get_db())
            .await?;
        Ok(models.into_iter().map(HistoryEntry::from).collect())
    }
}
