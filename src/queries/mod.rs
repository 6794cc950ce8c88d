//! Read-side use-cases.
//!
//! Each query loads the caller's records through the repositories and hands
//! them to a pure function from the matching module, so the services can apply
//! the same logic to a cached snapshot.

use async_trait::async_trait;

use crate::{errors::ServiceError, repositories::Repositories};

pub mod aisle_queries;
pub mod dashboard_queries;
pub mod history_queries;
pub mod medicine_queries;

pub use aisle_queries::{GetAisleQuery, ListAislesQuery};
pub use dashboard_queries::{DashboardQuery, DashboardSummary};
pub use history_queries::{HistoryQuery, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT};
pub use medicine_queries::{
    ExpiringMedicinesQuery, GetMedicineQuery, ListMedicinesQuery, LowStockQuery,
    MedicineListFilter, SearchMedicinesQuery,
};

/// Repositories plus the read-side settings the views depend on.
#[derive(Clone)]
pub struct QueryContext {
    pub repos: Repositories,
    pub expiring_soon_days: i64,
}

impl QueryContext {
    pub fn new(repos: Repositories, expiring_soon_days: i64) -> Self {
        Self {
            repos,
            expiring_soon_days,
        }
    }
}

#[async_trait]
pub trait Query: Send + Sync {
    type Result: Send + Sync;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError>;
}
