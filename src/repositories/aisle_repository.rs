use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, TransactionTrait,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use super::{map_txn_error, AisleRepository, BaseRepository, RepoResult};
use crate::entities::{aisle, history_entry};
use crate::models::{Aisle, HistoryEntry};

#[derive(Debug, Clone)]
pub struct SeaOrmAisleRepository {
    base: BaseRepository,
}

impl SeaOrmAisleRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl AisleRepository for SeaOrmAisleRepository {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Aisle>> {
        let model = aisle::Entity::find_by_id(id).one(self.base.get_db()).await?;
        Ok(model.map(Aisle::from))
    }

    async fn list_for_user(&self, user_id: &str) -> RepoResult<Vec<Aisle>> {
        let models = aisle::Entity::find()
            .filter(aisle::Column::UserId.eq(user_id))
            .order_by_asc(aisle::Column::Name)
            .order_by_asc(aisle::Column::CreatedAt)
            .all(self.base.get_db())
            .await?;
        Ok(models.into_iter().map(Aisle::from).collect())
    }

    async fn find_by_name(&self, user_id: &str, name: &str) -> RepoResult<Option<Aisle>> {
        // Case folding differs between backends; compare on the normalized key instead.
        let key = Aisle::name_key(name);
        let aisles = self.list_for_user(user_id).await?;
        Ok(aisles
            .into_iter()
            .find(|aisle| Aisle::name_key(&aisle.name) == key))
    }

    async fn count_for_user(&self, user_id: &str) -> RepoResult<u64> {
        let count = aisle::Entity::find()
            .filter(aisle::Column::UserId.eq(user_id))
            .count(self.base.get_db())
            .await?;
        Ok(count)
    }

    #[instrument(skip(self, aisle, audit), fields(aisle_id = %aisle.id))]
    async fn insert(&self, aisle: &Aisle, audit: &HistoryEntry) -> RepoResult<()> {
        let model = aisle::ActiveModel::from(aisle);
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

    #[instrument(skip(self, aisle, audit), fields(aisle_id = %aisle.id))]
    async fn update(&self, aisle: &Aisle, audit: &HistoryEntry) -> RepoResult<()> {
        let model = aisle::ActiveModel::from(aisle);
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
                    let result = aisle::Entity::delete_by_id(id).exec(txn).await?;
                    if result.rows_affected == 0 {
                        return Err(DbErr::RecordNotFound(format!("aisle {}", id)));
                    }
                    entry.insert(txn).await?;
                    Ok(())
                })
            })
            .await
            .map_err(map_txn_error)
    }
}
