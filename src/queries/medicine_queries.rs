use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{Query, QueryContext};
use crate::{
    errors::{MedicineError, ServiceError},
    models::{Medicine, MedicineView, StockStatus},
    repositories::MedicineFilter,
    PaginatedResponse,
};

/// Optional narrowing applied to a user's medicine list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MedicineListFilter {
    pub aisle_id: Option<Uuid>,
    pub status: Option<StockStatus>,
    /// Case-insensitive substring over name, reference and description.
    pub search: Option<String>,
}

fn matches_text(medicine: &Medicine, needle: &str) -> bool {
    let contains = |value: &str| value.to_lowercase().contains(needle);
    contains(&medicine.name)
        || medicine.reference.as_deref().map_or(false, contains)
        || medicine.description.as_deref().map_or(false, contains)
}

/// Applies the filter and derives the status fields. Input order is preserved.
pub fn filter_medicines(
    medicines: Vec<Medicine>,
    filter: &MedicineListFilter,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<MedicineView> {
    let needle = filter
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    medicines
        .into_iter()
        .filter(|m| filter.aisle_id.map_or(true, |id| m.aisle_id == id))
        .filter(|m| filter.status.map_or(true, |status| m.stock_status() == status))
        .filter(|m| needle.as_deref().map_or(true, |n| matches_text(m, n)))
        .map(|m| MedicineView::at(m, now, window_days))
        .collect()
}

/// Medicines below their warning threshold, critical ones first.
pub fn low_stock(
    medicines: Vec<Medicine>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<MedicineView> {
    let mut views: Vec<MedicineView> = medicines
        .into_iter()
        .filter(Medicine::is_low_stock)
        .map(|m| MedicineView::at(m, now, window_days))
        .collect();
    views.sort_by(|a, b| {
        let rank = |v: &MedicineView| match v.stock_status {
            StockStatus::Critical => 0,
            StockStatus::Warning => 1,
            StockStatus::Normal => 2,
        };
        rank(a)
            .cmp(&rank(b))
            .then(a.medicine.current_quantity.cmp(&b.medicine.current_quantity))
            .then(a.medicine.name.cmp(&b.medicine.name))
    });
    views
}

/// Medicines expiring within `window_days` (expired ones included), soonest first.
pub fn expiring(
    medicines: Vec<Medicine>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<MedicineView> {
    let mut views: Vec<MedicineView> = medicines
        .into_iter()
        .filter(|m| m.is_expiring_soon_at(now, window_days))
        .map(|m| MedicineView::at(m, now, window_days))
        .collect();
    views.sort_by_key(|v| v.medicine.expiry_date);
    views
}

async fn load_all(ctx: &QueryContext, user_id: &str) -> Result<Vec<Medicine>, ServiceError> {
    ctx.repos
        .medicines
        .list(&MedicineFilter::for_user(user_id))
        .await
}

#[derive(Debug, Clone)]
pub struct GetMedicineQuery {
    pub user_id: String,
    pub medicine_id: Uuid,
}

#[async_trait]
impl Query for GetMedicineQuery {
    type Result = MedicineView;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        match ctx.repos.medicines.find_by_id(self.medicine_id).await? {
            Some(medicine) if medicine.user_id == self.user_id => {
                Ok(MedicineView::at(medicine, Utc::now(), ctx.expiring_soon_days))
            }
            _ => Err(MedicineError::NotFound(self.medicine_id).into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListMedicinesQuery {
    pub user_id: String,
    pub filter: MedicineListFilter,
    pub page: u64,
    pub limit: u64,
}

#[async_trait]
impl Query for ListMedicinesQuery {
    type Result = PaginatedResponse<MedicineView>;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        let mut filter = MedicineFilter::for_user(&self.user_id);
        filter.aisle_id = self.filter.aisle_id;
        let medicines = ctx.repos.medicines.list(&filter).await?;
        let views = filter_medicines(medicines, &self.filter, Utc::now(), ctx.expiring_soon_days);
        Ok(PaginatedResponse::from_items(views, self.page, self.limit))
    }
}

#[derive(Debug, Clone)]
pub struct SearchMedicinesQuery {
    pub user_id: String,
    pub text: String,
    pub aisle_id: Option<Uuid>,
}

#[async_trait]
impl Query for SearchMedicinesQuery {
    type Result = Vec<MedicineView>;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        let filter = MedicineListFilter {
            aisle_id: self.aisle_id,
            status: None,
            search: Some(self.text.clone()),
        };
        let medicines = load_all(ctx, &self.user_id).await?;
        Ok(filter_medicines(medicines, &filter, Utc::now(), ctx.expiring_soon_days))
    }
}

#[derive(Debug, Clone)]
pub struct LowStockQuery {
    pub user_id: String,
}

#[async_trait]
impl Query for LowStockQuery {
    type Result = Vec<MedicineView>;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        let medicines = load_all(ctx, &self.user_id).await?;
        Ok(low_stock(medicines, Utc::now(), ctx.expiring_soon_days))
    }
}

#[derive(Debug, Clone)]
pub struct ExpiringMedicinesQuery {
    pub user_id: String,
    /// Overrides the configured look-ahead window.
    pub within_days: Option<i64>,
}

#[async_trait]
impl Query for ExpiringMedicinesQuery {
    type Result = Vec<MedicineView>;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        let window = self.within_days.unwrap_or(ctx.expiring_soon_days).max(0);
        let medicines = load_all(ctx, &self.user_id).await?;
        Ok(expiring(medicines, Utc::now(), window))
    }
}
