use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Icons an aisle may use. Names are SF Symbols identifiers shared with the mobile client.
pub const ALLOWED_ICONS: &[&str] = &[
    "pills",
    "pills.fill",
    "capsule",
    "capsule.fill",
    "cross.case",
    "cross.case.fill",
    "bandage",
    "bandage.fill",
    "syringe",
    "syringe.fill",
    "heart",
    "heart.fill",
    "staroflife",
    "staroflife.fill",
    "thermometer",
    "drop",
    "drop.fill",
    "tray",
    "tray.fill",
    "archivebox",
    "archivebox.fill",
    "shippingbox",
    "shippingbox.fill",
    "folder",
    "folder.fill",
];

/// Named storage location grouping medicines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Aisle {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color_hex: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Aisle {
    /// Key used for per-user name uniqueness.
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }
}

/// Aisle with the number of medicines it currently holds.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AisleView {
    #[serde(flatten)]
    pub aisle: Aisle,
    pub medicine_count: u64,
}

#[cfg(test)]
pub(crate) fn sample_aisle() -> Aisle {
    let now = Utc::now();
    Aisle {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        name: "Antalgiques".to_string(),
        description: None,
        color_hex: "#3366FF".to_string(),
        icon: "pills".to_string(),
        created_at: now,
        updated_at: now,
    }
}
