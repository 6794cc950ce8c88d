//! Persistence seams.
//!
//! Use-cases only see the traits below. Every mutating call receives the audit
//! [`HistoryEntry`] that accompanies it and implementations persist both in the
//! same transaction, so a change is never stored without its history line.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DbErr, TransactionError};
use std::sync::Arc;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::models::{Aisle, HistoryEntry, Medicine, User};

pub mod aisle_repository;
pub mod history_repository;
pub mod in_memory;
pub mod medicine_repository;
pub mod user_repository;

pub use aisle_repository::SeaOrmAisleRepository;
pub use history_repository::SeaOrmHistoryRepository;
pub use in_memory::InMemoryStore;
pub use medicine_repository::SeaOrmMedicineRepository;
pub use user_repository::SeaOrmUserRepository;

pub type RepoResult<T> = Result<T, ServiceError>;

/// Owner-scoped medicine listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MedicineFilter {
    pub user_id: String,
    pub aisle_id: Option<Uuid>,
}

impl MedicineFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            aisle_id: None,
        }
    }

    pub fn in_aisle(mut self, aisle_id: Uuid) -> Self {
        self.aisle_id = Some(aisle_id);
        self
    }
}

/// History lookup; results are newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    pub user_id: String,
    pub medicine_id: Option<Uuid>,
    pub aisle_id: Option<Uuid>,
    pub limit: Option<u64>,
}

impl HistoryFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn for_medicine(mut self, medicine_id: Uuid) -> Self {
        self.medicine_id = Some(medicine_id);
        self
    }

    pub fn for_aisle(mut self, aisle_id: Uuid) -> Self {
        self.aisle_id = Some(aisle_id);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        entry.user_id == self.user_id
            && self.medicine_id.map_or(true, |id| entry.medicine_id == Some(id))
            && self.aisle_id.map_or(true, |id| entry.aisle_id == Some(id))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MedicineRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Medicine>>;

    /// Medicines matching the filter, ordered by name.
    async fn list(&self, filter: &MedicineFilter) -> RepoResult<Vec<Medicine>>;

    async fn count_in_aisle(&self, aisle_id: Uuid) -> RepoResult<u64>;

    async fn insert(&self, medicine: &Medicine, audit: &HistoryEntry) -> RepoResult<()>;

    async fn update(&self, medicine: &Medicine, audit: &HistoryEntry) -> RepoResult<()>;

    /// Removes the medicine; its earlier history stays.
    async fn delete(&self, id: Uuid, audit: &HistoryEntry) -> RepoResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AisleRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<Aisle>>;

    /// The user's aisles, ordered by name.
    async fn list_for_user(&self, user_id: &str) -> RepoResult<Vec<Aisle>>;

    /// Case-insensitive lookup on the trimmed name.
    async fn find_by_name(&self, user_id: &str, name: &str) -> RepoResult<Option<Aisle>>;

    async fn count_for_user(&self, user_id: &str) -> RepoResult<u64>;

    async fn insert(&self, aisle: &Aisle, audit: &HistoryEntry) -> RepoResult<()>;

    async fn update(&self, aisle: &Aisle, audit: &HistoryEntry) -> RepoResult<()>;

    async fn delete(&self, id: Uuid, audit: &HistoryEntry) -> RepoResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, entry: &HistoryEntry) -> RepoResult<()>;

    async fn list(&self, filter: &HistoryFilter) -> RepoResult<Vec<HistoryEntry>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the profile or refreshes email, name and `last_seen_at`.
    async fn upsert(&self, user: &User) -> RepoResult<User>;

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>>;
}

/// The four repository handles handed to use-cases and services.
#[derive(Clone)]
pub struct Repositories {
    pub medicines: Arc<dyn MedicineRepository>,
    pub aisles: Arc<dyn AisleRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn sea_orm(db: Arc<DatabaseConnection>) -> Self {
        Self {
            medicines: Arc::new(SeaOrmMedicineRepository::new(db.clone())),
            aisles: Arc::new(SeaOrmAisleRepository::new(db.clone())),
            history: Arc::new(SeaOrmHistoryRepository::new(db.clone())),
            users: Arc::new(SeaOrmUserRepository::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::default());
        Self {
            medicines: store.clone(),
            aisles: store.clone(),
            history: store.clone(),
            users: store,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

pub(crate) fn map_txn_error(err: TransactionError<DbErr>) -> ServiceError {
    match err {
        TransactionError::Connection(e) | TransactionError::Transaction(e) => {
            ServiceError::DatabaseError(e)
        }
    }
}
