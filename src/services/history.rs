use uuid::Uuid;

use crate::{
    errors::ServiceError,
    models::HistoryEntry,
    queries::{HistoryQuery, Query, QueryContext},
};

/// Read access to the audit trail.
pub struct HistoryService {
    queries: QueryContext,
}

impl HistoryService {
    pub fn new(queries: QueryContext) -> Self {
        Self { queries }
    }

    pub async fn list(
        &self,
        user_id: &str,
        medicine_id: Option<Uuid>,
        aisle_id: Option<Uuid>,
        limit: Option<u64>,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        HistoryQuery {
            user_id: user_id.to_string(),
            medicine_id,
            aisle_id,
            limit,
        }
        .execute(&self.queries)
        .await
    }
}
