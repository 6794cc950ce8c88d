use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use super::{Query, QueryContext};
use crate::{
    errors::ServiceError,
    models::{Aisle, AisleView, Medicine},
    repositories::MedicineFilter,
};

/// Pairs each aisle with the number of medicines referencing it.
pub fn with_counts(aisles: Vec<Aisle>, medicines: &[Medicine]) -> Vec<AisleView> {
    let mut counts: HashMap<Uuid, u64> = HashMap::new();
    for medicine in medicines {
        *counts.entry(medicine.aisle_id).or_default() += 1;
    }
    aisles
        .into_iter()
        .map(|aisle| AisleView {
            medicine_count: counts.get(&aisle.id).copied().unwrap_or(0),
            aisle,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct GetAisleQuery {
    pub user_id: String,
    pub aisle_id: Uuid,
}

#[async_trait]
impl Query for GetAisleQuery {
    type Result = AisleView;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        let aisle = match ctx.repos.aisles.find_by_id(self.aisle_id).await? {
            Some(aisle) if aisle.user_id == self.user_id => aisle,
            _ => {
                return Err(ServiceError::NotFound(format!(
                    "Aisle {} not found",
                    self.aisle_id
                )))
            }
        };
        let medicine_count = ctx.repos.medicines.count_in_aisle(aisle.id).await?;
        Ok(AisleView {
            aisle,
            medicine_count,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ListAislesQuery {
    pub user_id: String,
}

#[async_trait]
impl Query for ListAislesQuery {
    type Result = Vec<AisleView>;

    async fn execute(&self, ctx: &QueryContext) -> Result<Self::Result, ServiceError> {
        let aisles = ctx.repos.aisles.list_for_user(&self.user_id).await?;
        let medicines = ctx
            .repos
            .medicines
            .list(&MedicineFilter::for_user(&self.user_id))
            .await?;
        Ok(with_counts(aisles, &medicines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::aisle::sample_aisle;
    use crate::models::medicine::sample_medicine;

    #[test]
    fn counts_include_empty_aisles() {
        let full = sample_aisle();
        let empty = sample_aisle();
        let medicines: Vec<Medicine> = (0..3)
            .map(|_| {
                let mut m = sample_medicine();
                m.aisle_id = full.id;
                m
            })
            .collect();

        let views = with_counts(vec![full.clone(), empty.clone()], &medicines);
        assert_eq!(views[0].medicine_count, 3);
        assert_eq!(views[1].medicine_count, 0);
    }
}
