use async_trait::async_trait;
use uuid::Uuid;

use super::{Query, QueryContext};
use crate::{errors::ServiceError, models::HistoryEntry, repositories::HistoryFilter};

pub const DEFAULT_HISTORY_LIMIT: u64 = 50;
pub const MAX_HISTORY_LIMIT: u64 = 500;

/// Audit entries of the caller, newest first, optionally for one medicine or aisle.
///
/// Entries of deleted medicines stay readable.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub user_id: String,
    pub medicine_id: Option<Uuid>,
    pub aisle_id: Option<Uuid>,
    pub limit: Option<u64>,
}

impl HistoryQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            medicine_id: None,
            aisle_id: None,
            limit: None,
        }
    }

    pub fn for_medicine(user_id: impl Into<String>, medicine_id: Uuid) -> Self {
        Self {
            medicine_id: Some(medicine_id),
            ..Self::for_user(user_id)
        }
    }

    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    fn filter(&self) -> HistoryFilter {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        HistoryFilter {
            user_id: self.user_id.clone(),
            medicine_id: self.medicine_id,
            aisle_id: self.aisle_id,
            limit: Some(limit),
        }
    }
}

#[async_trait]
impl Query for HistoryQuery {
    type Result = Vec<HistoryEntry>;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        ctx.repos.history.list(&self.filter()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HistoryAction;
    use crate::repositories::Repositories;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(HistoryQuery::for_user("u").filter().limit, Some(DEFAULT_HISTORY_LIMIT));
        assert_eq!(
            HistoryQuery::for_user("u").with_limit(Some(0)).filter().limit,
            Some(1)
        );
        assert_eq!(
            HistoryQuery::for_user("u").with_limit(Some(10_000)).filter().limit,
            Some(MAX_HISTORY_LIMIT)
        );
    }

    #[tokio::test]
    async fn history_is_scoped_to_the_caller() {
        let ctx = QueryContext::new(Repositories::in_memory(), 30);
        let medicine_id = Uuid::new_v4();
        for user in ["user-1", "user-2"] {
            let entry =
                HistoryEntry::new(user, HistoryAction::StockAdded, "x").for_medicine(medicine_id);
            ctx.repos.history.append(&entry).await.unwrap();
        }

        let entries = HistoryQuery::for_medicine("user-1", medicine_id)
            .execute(&ctx)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, "user-1");
    }
}
