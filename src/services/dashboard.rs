use tracing::instrument;

use crate::{
    errors::ServiceError,
    queries::{DashboardQuery, DashboardSummary, Query, QueryContext},
};

pub struct DashboardService {
    queries: QueryContext,
}

impl DashboardService {
    pub fn new(queries: QueryContext) -> Self {
        Self { queries }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self, user_id: &str) -> Result<DashboardSummary, ServiceError> {
        DashboardQuery::new(user_id).execute(&self.queries).await
    }
}
