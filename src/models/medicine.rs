use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Default look-ahead window used by [`Medicine::is_expiring_soon`].
pub const EXPIRING_SOON_DAYS: i64 = 30;

/// Low-stock classification derived from the quantity and the two thresholds.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StockStatus {
    Normal,
    Warning,
    Critical,
}

/// A medicine stocked in one of the user's aisles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub form: Option<String>,
    pub reference: Option<String>,
    pub unit: String,
    pub current_quantity: i32,
    pub max_quantity: i32,
    pub warning_threshold: i32,
    pub critical_threshold: i32,
    pub expiry_date: Option<DateTime<Utc>>,
    pub aisle_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medicine {
    pub fn stock_status(&self) -> StockStatus {
        if self.current_quantity <= self.critical_threshold {
            StockStatus::Critical
        } else if self.current_quantity <= self.warning_threshold {
            StockStatus::Warning
        } else {
            StockStatus::Normal
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry_date.map_or(false, |expiry| expiry <= now)
    }

    pub fn is_expiring_soon_at(&self, now: DateTime<Utc>, window_days: i64) -> bool {
        self.expiry_date
            .map_or(false, |expiry| expiry <= now + Duration::days(window_days))
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expiring_soon(&self) -> bool {
        self.is_expiring_soon_at(Utc::now(), EXPIRING_SOON_DAYS)
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock_status() != StockStatus::Normal
    }
}

/// API representation: the stored record plus its derived status fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineView {
    #[serde(flatten)]
    pub medicine: Medicine,
    pub stock_status: StockStatus,
    pub is_expired: bool,
    pub is_expiring_soon: bool,
}

impl MedicineView {
    pub fn at(medicine: Medicine, now: DateTime<Utc>, window_days: i64) -> Self {
        Self {
            stock_status: medicine.stock_status(),
            is_expired: medicine.is_expired_at(now),
            is_expiring_soon: medicine.is_expiring_soon_at(now, window_days),
            medicine,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_medicine() -> Medicine {
    let now = Utc::now();
    Medicine {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        name: "Doliprane".to_string(),
        description: Some("Paracétamol".to_string()),
        dosage: Some("500 mg".to_string()),
        form: Some("Comprimé".to_string()),
        reference: Some("DOL-500".to_string()),
        unit: "boîte".to_string(),
        current_quantity: 20,
        max_quantity: 100,
        warning_threshold: 20,
        critical_threshold: 10,
        expiry_date: Some(now + Duration::days(365)),
        aisle_id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, StockStatus::Critical)]
    #[case(10, StockStatus::Critical)]
    #[case(11, StockStatus::Warning)]
    #[case(20, StockStatus::Warning)]
    #[case(21, StockStatus::Normal)]
    fn stock_status_follows_thresholds(#[case] quantity: i32, #[case] expected: StockStatus) {
        let mut medicine = sample_medicine();
        medicine.current_quantity = quantity;
        assert_eq!(medicine.stock_status(), expected);
    }

    #[test]
    fn expiry_boundaries_are_inclusive() {
        let now = Utc::now();
        let mut medicine = sample_medicine();

        medicine.expiry_date = Some(now);
        assert!(medicine.is_expired_at(now));
        assert!(medicine.is_expiring_soon_at(now, EXPIRING_SOON_DAYS));

        medicine.expiry_date = Some(now + Duration::days(30));
        assert!(!medicine.is_expired_at(now));
        assert!(medicine.is_expiring_soon_at(now, EXPIRING_SOON_DAYS));

        medicine.expiry_date = Some(now + Duration::days(30) + Duration::seconds(1));
        assert!(!medicine.is_expiring_soon_at(now, EXPIRING_SOON_DAYS));
    }

    #[test]
    fn missing_expiry_never_expires() {
        let mut medicine = sample_medicine();
        medicine.expiry_date = None;
        assert!(!medicine.is_expired());
        assert!(!medicine.is_expiring_soon());
    }

    #[test]
    fn view_serializes_camel_case_with_status() {
        let now = Utc::now();
        let mut medicine = sample_medicine();
        medicine.current_quantity = 5;
        let json =
            serde_json::to_value(MedicineView::at(medicine, now, EXPIRING_SOON_DAYS)).unwrap();
        assert_eq!(json["stockStatus"], "critical");
        assert_eq!(json["currentQuantity"], 5);
        assert_eq!(json["isExpired"], false);
    }
}
