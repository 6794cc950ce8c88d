use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::{
    cache::{get_json, set_json, CacheBackend},
    commands::{
        medicines::{MedicineChanges, NewMedicine, StockAdjustmentResult},
        AddMedicineCommand, AdjustStockCommand, Command, CommandContext, DeleteMedicineCommand,
        UpdateMedicineCommand, UpdateStockCommand,
    },
    errors::ServiceError,
    models::{HistoryEntry, Medicine, MedicineView},
    queries::{
        medicine_queries::{expiring, filter_medicines, low_stock},
        GetMedicineQuery, HistoryQuery, MedicineListFilter, Query, QueryContext,
    },
    repositories::MedicineFilter,
    PaginatedResponse,
};

/// Medicine use-cases, with the per-user medicine list kept in the local cache.
pub struct MedicineService {
    commands: CommandContext,
    queries: QueryContext,
    cache: Option<Arc<dyn CacheBackend>>,
    /// Bumped on every invalidation; a list read from the database is only
    /// cached while its user's generation is unchanged.
    generations: DashMap<String, u64>,
}

fn list_cache_key(user_id: &str) -> String {
    format!("medicines:{}", user_id)
}

impl MedicineService {
    pub fn new(
        commands: CommandContext,
        queries: QueryContext,
        cache: Option<Arc<dyn CacheBackend>>,
    ) -> Self {
        Self {
            commands,
            queries,
            cache,
            generations: DashMap::new(),
        }
    }

    fn generation(&self, user_id: &str) -> u64 {
        self.generations.get(user_id).map_or(0, |g| *g)
    }

    /// The caller's medicines ordered by name, served from cache when fresh.
    async fn all_for_user(&self, user_id: &str) -> Result<Vec<Medicine>, ServiceError> {
        let key = list_cache_key(user_id);
        if let Some(cache) = &self.cache {
            match get_json::<Vec<Medicine>>(cache.as_ref(), &key).await {
                Ok(Some(medicines)) => {
                    debug!(user_id, "medicine list served from cache");
                    return Ok(medicines);
                }
                Ok(None) => {}
                Err(e) => warn!(user_id, error = %e, "cache read failed"),
            }
        }

        let generation = self.generation(user_id);
        let medicines = self
            .queries
            .repos
            .medicines
            .list(&MedicineFilter::for_user(user_id))
            .await?;

        if let Some(cache) = &self.cache {
            self.store_list(cache.as_ref(), user_id, generation, &medicines).await;
        }
        Ok(medicines)
    }

    /// Caches a list read at `generation`, unless a write invalidated it meanwhile.
    async fn store_list(
        &self,
        cache: &dyn CacheBackend,
        user_id: &str,
        generation: u64,
        medicines: &[Medicine],
    ) {
        if self.generation(user_id) != generation {
            debug!(user_id, "medicine list changed during read; not cached");
            return;
        }
        let key = list_cache_key(user_id);
        if let Err(e) = set_json(cache, &key, &medicines, None).await {
            warn!(user_id, error = %e, "cache write failed");
            return;
        }
        // An invalidation may have landed between the check and the write.
        if self.generation(user_id) != generation {
            self.delete_list(cache, user_id).await;
        }
    }

    async fn delete_list(&self, cache: &dyn CacheBackend, user_id: &str) {
        if let Err(e) = cache.delete(&list_cache_key(user_id)).await {
            warn!(user_id, error = %e, "cache invalidation failed");
        }
    }

    async fn invalidate(&self, user_id: &str) {
        *self.generations.entry(user_id.to_string()).or_insert(0) += 1;
        if let Some(cache) = &self.cache {
            self.delete_list(cache.as_ref(), user_id).await;
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: &str,
        input: NewMedicine,
    ) -> Result<Medicine, ServiceError> {
        let result = AddMedicineCommand::new(user_id, input)
            .execute(&self.commands)
            .await;
        self.invalidate(user_id).await;
        result
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        user_id: &str,
        id: Uuid,
        changes: MedicineChanges,
    ) -> Result<Medicine, ServiceError> {
        let result = UpdateMedicineCommand::new(user_id, id, changes)
            .execute(&self.commands)
            .await;
        self.invalidate(user_id).await;
        result
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<Medicine, ServiceError> {
        let result = DeleteMedicineCommand::new(user_id, id)
            .execute(&self.commands)
            .await;
        self.invalidate(user_id).await;
        result
    }

    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        user_id: &str,
        id: Uuid,
        adjustment: i32,
        reason: &str,
    ) -> Result<StockAdjustmentResult, ServiceError> {
        let result = AdjustStockCommand::new(user_id, id, adjustment, reason)
            .execute(&self.commands)
            .await;
        self.invalidate(user_id).await;
        result
    }

    #[instrument(skip(self))]
    pub async fn update_stock(
        &self,
        user_id: &str,
        id: Uuid,
        quantity: i32,
        reason: Option<String>,
    ) -> Result<StockAdjustmentResult, ServiceError> {
        let result = UpdateStockCommand::new(user_id, id, quantity, reason)
            .execute(&self.commands)
            .await;
        self.invalidate(user_id).await;
        result
    }

    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<MedicineView, ServiceError> {
        GetMedicineQuery {
            user_id: user_id.to_string(),
            medicine_id: id,
        }
        .execute(&self.queries)
        .await
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        user_id: &str,
        filter: &MedicineListFilter,
        page: u64,
        limit: u64,
    ) -> Result<PaginatedResponse<MedicineView>, ServiceError> {
        let medicines = self.all_for_user(user_id).await?;
        let views = filter_medicines(
            medicines,
            filter,
            Utc::now(),
            self.queries.expiring_soon_days,
        );
        Ok(PaginatedResponse::from_items(views, page, limit))
    }

    pub async fn search(
        &self,
        user_id: &str,
        text: &str,
        aisle_id: Option<Uuid>,
    ) -> Result<Vec<MedicineView>, ServiceError> {
        let filter = MedicineListFilter {
            aisle_id,
            status: None,
            search: Some(text.to_string()),
        };
        let medicines = self.all_for_user(user_id).await?;
        Ok(filter_medicines(
            medicines,
            &filter,
            Utc::now(),
            self.queries.expiring_soon_days,
        ))
    }

    pub async fn low_stock(&self, user_id: &str) -> Result<Vec<MedicineView>, ServiceError> {
        let medicines = self.all_for_user(user_id).await?;
        Ok(low_stock(
            medicines,
            Utc::now(),
            self.queries.expiring_soon_days,
        ))
    }

    pub async fn expiring(
        &self,
        user_id: &str,
        within_days: Option<i64>,
    ) -> Result<Vec<MedicineView>, ServiceError> {
        let window = within_days
            .unwrap_or(self.queries.expiring_soon_days)
            .max(0);
        let medicines = self.all_for_user(user_id).await?;
        Ok(expiring(medicines, Utc::now(), window))
    }

    pub async fn history(
        &self,
        user_id: &str,
        id: Uuid,
        limit: Option<u64>,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        HistoryQuery::for_medicine(user_id, id)
            .with_limit(limit)
            .execute(&self.queries)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::commands::aisles::add_aisle_command::{sample_new_aisle, AddAisleCommand};
    use crate::commands::medicines::add_medicine_command::sample_new_medicine;
    use crate::events::EventSender;
    use crate::repositories::Repositories;
    use crate::validation::InventoryPolicy;

    fn service(cache: Arc<InMemoryCache>) -> MedicineService {
        let repos = Repositories::in_memory();
        let (events, _rx) = EventSender::channel(64);
        let policy = InventoryPolicy::default();
        MedicineService::new(
            CommandContext::new(repos.clone(), events, policy.clone()),
            QueryContext::new(repos, policy.expiring_soon_days),
            Some(cache),
        )
    }

    #[tokio::test]
    async fn list_is_cached_and_invalidated_on_mutation() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service(cache.clone());
        let aisle = AddAisleCommand::new("user-1", sample_new_aisle("Rayon A"))
            .execute(&service.commands)
            .await
            .unwrap();

        let empty = service
            .list("user-1", &MedicineListFilter::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(empty.total, 0);
        assert!(cache.exists("medicines:user-1").await.unwrap());

        let created = service
            .create("user-1", sample_new_medicine(aisle.id))
            .await
            .unwrap();
        assert!(!cache.exists("medicines:user-1").await.unwrap());

        let listed = service
            .list("user-1", &MedicineListFilter::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.items[0].medicine.id, created.id);

        service
            .adjust_stock("user-1", created.id, -5, "Dispensation")
            .await
            .unwrap();
        let low = service.low_stock("user-1").await.unwrap();
        assert_eq!(low[0].medicine.current_quantity, 15);
    }

    #[tokio::test]
    async fn list_read_before_an_invalidation_is_not_cached() {
        let cache = Arc::new(InMemoryCache::new());
        let service = service(cache.clone());

        let stale = service.generation("user-1");
        service.invalidate("user-1").await;
        service.store_list(cache.as_ref(), "user-1", stale, &[]).await;
        assert!(!cache.exists("medicines:user-1").await.unwrap());

        let current = service.generation("user-1");
        service.store_list(cache.as_ref(), "user-1", current, &[]).await;
        assert!(cache.exists("medicines:user-1").await.unwrap());
        assert_eq!(service.generation("user-2"), 0);
    }
}
