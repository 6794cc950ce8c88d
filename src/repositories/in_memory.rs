use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AisleRepository, HistoryFilter, HistoryRepository, MedicineFilter, MedicineRepository,
    RepoResult, UserRepository,
};
use crate::errors::ServiceError;
use crate::models::{Aisle, HistoryEntry, Medicine, User};

#[derive(Debug, Default)]
struct StoreState {
    medicines: HashMap<Uuid, Medicine>,
    aisles: HashMap<Uuid, Aisle>,
    history: Vec<HistoryEntry>,
    users: HashMap<String, User>,
}

/// Process-local store implementing every repository trait.
///
/// A single lock guards all collections, so a record and its audit entry are
/// written together or not at all.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(kind: &str, id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("{} {} not found", kind, id))
}

#[async_trait]
impl MedicineRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Medicine>> {
        Ok(self.state.read().await.medicines.get(&id).cloned())
    }

    async fn list(&self, filter: &MedicineFilter) -> RepoResult<Vec<Medicine>> {
        let state = self.state.read().await;
        let mut medicines: Vec<Medicine> = state
            .medicines
            .values()
            .filter(|m| m.user_id == filter.user_id)
            .filter(|m| filter.aisle_id.map_or(true, |id| m.aisle_id == id))
            .cloned()
            .collect();
        medicines.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(medicines)
    }

    async fn count_in_aisle(&self, aisle_id: Uuid) -> RepoResult<u64> {
        let state = self.state.read().await;
        Ok(state
            .medicines
            .values()
            .filter(|m| m.aisle_id == aisle_id)
            .count() as u64)
    }

    async fn insert(&self, medicine: &Medicine, audit: &HistoryEntry) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if state.medicines.contains_key(&medicine.id) {
            return Err(ServiceError::InternalError(format!(
                "medicine {} already exists",
                medicine.id
            )));
        }
        state.medicines.insert(medicine.id, medicine.clone());
        state.history.push(audit.clone());
        Ok(())
    }

    async fn update(&self, medicine: &Medicine, audit: &HistoryEntry) -> RepoResult<()> {
        let mut state = self.state.write().await;
        match state.medicines.get_mut(&medicine.id) {
            Some(stored) => *stored = medicine.clone(),
            None => return Err(missing("medicine", medicine.id)),
        }
        state.history.push(audit.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid, audit: &HistoryEntry) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if state.medicines.remove(&id).is_none() {
            return Err(missing("medicine", id));
        }
        state.history.push(audit.clone());
        Ok(())
    }
}

#[async_trait]
impl AisleRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Aisle>> {
        Ok(self.state.read().await.aisles.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: &str) -> RepoResult<Vec<Aisle>> {
        let state = self.state.read().await;
        let mut aisles: Vec<Aisle> = state
            .aisles
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        aisles.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(aisles)
    }

    async fn find_by_name(&self, user_id: &str, name: &str) -> RepoResult<Option<Aisle>> {
        let key = Aisle::name_key(name);
        let state = self.state.read().await;
        Ok(state
            .aisles
            .values()
            .find(|a| a.user_id == user_id && Aisle::name_key(&a.name) == key)
            .cloned())
    }

    async fn count_for_user(&self, user_id: &str) -> RepoResult<u64> {
        let state = self.state.read().await;
        Ok(state.aisles.values().filter(|a| a.user_id == user_id).count() as u64)
    }

    async fn insert(&self, aisle: &Aisle, audit: &HistoryEntry) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if state.aisles.contains_key(&aisle.id) {
            return Err(ServiceError::InternalError(format!(
                "aisle {} already exists",
                aisle.id
            )));
        }
        state.aisles.insert(aisle.id, aisle.clone());
        state.history.push(audit.clone());
        Ok(())
    }

    async fn update(&self, aisle: &Aisle, audit: &HistoryEntry) -> RepoResult<()> {
        let mut state = self.state.write().await;
        match state.aisles.get_mut(&aisle.id) {
            Some(stored) => *stored = aisle.clone(),
            None => return Err(missing("aisle", aisle.id)),
        }
        state.history.push(audit.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid, audit: &HistoryEntry) -> RepoResult<()> {
        let mut state = self.state.write().await;
        if state.aisles.remove(&id).is_none() {
            return Err(missing("aisle", id));
        }
        state.history.push(audit.clone());
        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for InMemoryStore {
    async fn append(&self, entry: &HistoryEntry) -> RepoResult<()> {
        self.state.write().await.history.push(entry.clone());
        Ok(())
    }

    async fn list(&self, filter: &HistoryFilter) -> RepoResult<Vec<HistoryEntry>> {
        let state = self.state.read().await;
        // Stored in insertion order; newest first means walking backwards.
        let mut entries: Vec<HistoryEntry> = state
            .history
            .iter()
            .rev()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = filter.limit {
            entries.truncate(limit as usize);
        }
        Ok(entries)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn upsert(&self, user: &User) -> RepoResult<User> {
        let mut state = self.state.write().await;
        let saved = match state.users.get_mut(&user.id) {
            Some(existing) => {
                existing.email = user.email.clone();
                existing.display_name = user.display_name.clone();
                existing.last_seen_at = user.last_seen_at;
                existing.clone()
            }
            None => {
                state.users.insert(user.id.clone(), user.clone());
                user.clone()
            }
        };
        Ok(saved)
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        Ok(self.state.read().await.users.get(id).cloned())
    }
}
