use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Query, QueryContext};
use crate::{
    errors::ServiceError,
    models::{HistoryEntry, Medicine, StockStatus},
    repositories::{HistoryFilter, MedicineFilter},
};

/// Figures shown on the home screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_medicines: u64,
    pub total_aisles: u64,
    pub total_units: i64,
    pub critical_count: u64,
    pub warning_count: u64,
    pub expiring_soon_count: u64,
    pub expired_count: u64,
    pub recent_history: Vec<HistoryEntry>,
}

impl DashboardSummary {
    /// Stock figures over a user's medicines; aisle total and history are filled by the caller.
    pub fn from_medicines(medicines: &[Medicine], now: DateTime<Utc>, window_days: i64) -> Self {
        let mut summary = Self {
            total_medicines: medicines.len() as u64,
            ..Self::default()
        };
        for medicine in medicines {
            summary.total_units += i64::from(medicine.current_quantity);
            match medicine.stock_status() {
                StockStatus::Critical => summary.critical_count += 1,
                StockStatus::Warning => summary.warning_count += 1,
                StockStatus::Normal => {}
            }
            if medicine.is_expired_at(now) {
                summary.expired_count += 1;
            } else if medicine.is_expiring_soon_at(now, window_days) {
                summary.expiring_soon_count += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Clone)]
pub struct DashboardQuery {
    pub user_id: String,
    pub recent_limit: u64,
}

impl DashboardQuery {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            recent_limit: 10,
        }
    }
}

#[async_trait]
impl Query for DashboardQuery {
    type Result = DashboardSummary;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        let medicines = ctx
            .repos
            .medicines
            .list(&MedicineFilter::for_user(&self.user_id))
            .await?;
        let mut summary =
            DashboardSummary::from_medicines(&medicines, Utc::now(), ctx.expiring_soon_days);
        summary.total_aisles = ctx.repos.aisles.count_for_user(&self.user_id).await?;
        summary.recent_history = ctx
            .repos
            .history
            .list(&HistoryFilter::for_user(&self.user_id).limit(self.recent_limit))
            .await?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::medicine::sample_medicine;
    use chrono::Duration;

    #[test]
    fn expired_stock_is_not_counted_as_expiring() {
        let now = Utc::now();
        let mut expired = sample_medicine();
        expired.expiry_date = Some(now - Duration::days(1));
        expired.current_quantity = 5;
        let mut soon = sample_medicine();
        soon.expiry_date = Some(now + Duration::days(3));
        soon.current_quantity = 15;
        let mut fine = sample_medicine();
        fine.current_quantity = 80;

        let summary = DashboardSummary::from_medicines(&[expired, soon, fine], now, 30);
        assert_eq!(summary.total_medicines, 3);
        assert_eq!(summary.total_units, 100);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.warning_count, 1);
        assert_eq!(summary.expired_count, 1);
        assert_eq!(summary.expiring_soon_count, 1);
    }
}
