use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use utoipa::ToSchema;
use uuid::Uuid;

/// Audit labels written by the use-cases. Stored as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum HistoryAction {
    #[strum(serialize = "Ajout de stock")]
    StockAdded,
    #[strum(serialize = "Retrait de stock")]
    StockRemoved,
    #[strum(serialize = "Mise à jour du stock")]
    StockSet,
    #[strum(serialize = "Ajout médicament")]
    MedicineAdded,
    #[strum(serialize = "Modification médicament")]
    MedicineUpdated,
    #[strum(serialize = "Suppression médicament")]
    MedicineDeleted,
    #[strum(serialize = "Ajout rayon")]
    AisleAdded,
    #[strum(serialize = "Modification rayon")]
    AisleUpdated,
    #[strum(serialize = "Suppression rayon")]
    AisleDeleted,
}

/// Immutable audit record of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub medicine_id: Option<Uuid>,
    pub aisle_id: Option<Uuid>,
    pub user_id: String,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(
        user_id: impl Into<String>,
        action: HistoryAction,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            medicine_id: None,
            aisle_id: None,
            user_id: user_id.into(),
            action: action.to_string(),
            details: details.into(),
            timestamp: Utc::now(),
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

    /// Details line for a stock change, e.g. `Dispensation (stock: 20 → 15)`.
    pub fn stock_details(reason: &str, old_quantity: i32, new_quantity: i32) -> String {
        let reason = reason.trim();
        if reason.is_empty() {
            format!("stock: {} → {}", old_quantity, new_quantity)
        } else {
            format!("{} (stock: {} → {})", reason, old_quantity, new_quantity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_product_wording() {
        assert_eq!(HistoryAction::StockRemoved.to_string(), "Retrait de stock");
        assert_eq!(HistoryAction::StockAdded.as_ref(), "Ajout de stock");
        assert_eq!(HistoryAction::AisleDeleted.to_string(), "Suppression rayon");
    }

    #[test]
    fn stock_details_encode_both_quantities() {
        assert_eq!(
            HistoryEntry::stock_details("Dispensation", 20, 15),
            "Dispensation (stock: 20 → 15)"
        );
        assert_eq!(HistoryEntry::stock_details("  ", 3, 4), "stock: 3 → 4");
    }
}
