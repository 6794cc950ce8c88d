//! Business rules for medicines and aisles.
//!
//! Everything here is pure: callers pass the candidate record, the current time
//! and the active [`InventoryPolicy`]. Rules that need stored data (aisle
//! references, name uniqueness, aisle counts) are evaluated by the use-cases,
//! which report them through the same [`ValidationError`] type.

use crate::models::{Aisle, Medicine, ALLOWED_ICONS};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

pub const MEDICINE_NAME_MAX_LEN: usize = 100;
pub const AISLE_NAME_MAX_LEN: usize = 50;

lazy_static! {
    static ref COLOR_HEX: Regex = Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("color pattern compiles");
}

/// Business-rule violations. User-correctable; surfaced to clients as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("name exceeds {max} characters")]
    NameTooLong { max: usize },

    #[error("color must use the #RRGGBB format")]
    InvalidColorFormat,

    #[error("icon '{icon}' is not allowed")]
    InvalidIcon { icon: String },

    #[error("{field} must not be negative")]
    NegativeQuantity { field: String },

    #[error("maximum quantity must be greater than zero")]
    InvalidMaxQuantity,

    #[error("current quantity {current} exceeds maximum {max}")]
    QuantityExceedsMax { current: i32, max: i32 },

    #[error("critical threshold ({critical}) must be lower than warning threshold ({warning})")]
    InvalidThresholds { critical: i32, warning: i32 },

    #[error("expiry date {date} is in the past")]
    ExpiredDate { date: DateTime<Utc> },

    #[error("aisle {aisle_id} does not exist")]
    InvalidAisleReference { aisle_id: Uuid },

    #[error("an aisle named '{name}' already exists")]
    DuplicateAisleName { name: String },

    #[error("a user may not own more than {max} aisles")]
    TooManyAisles { max: usize },

    #[error("aisle still contains {count} medicine(s)")]
    AisleContainsMedicines { count: u64 },

    #[error("missing required field: {field}")]
    MissingRequiredField { field: String },
}

impl ValidationError {
    /// Machine-readable identifier, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::NameTooLong { .. } => "name_too_long",
            Self::InvalidColorFormat => "invalid_color_format",
            Self::InvalidIcon { .. } => "invalid_icon",
            Self::NegativeQuantity { .. } => "negative_quantity",
            Self::InvalidMaxQuantity => "invalid_max_quantity",
            Self::QuantityExceedsMax { .. } => "quantity_exceeds_max",
            Self::InvalidThresholds { .. } => "invalid_thresholds",
            Self::ExpiredDate { .. } => "expired_date",
            Self::InvalidAisleReference { .. } => "invalid_aisle_reference",
            Self::DuplicateAisleName { .. } => "duplicate_aisle_name",
            Self::TooManyAisles { .. } => "too_many_aisles",
            Self::AisleContainsMedicines { .. } => "aisle_contains_medicines",
            Self::MissingRequiredField { .. } => "missing_required_field",
        }
    }

    /// Message shown to end users (the product ships in French).
    pub fn localized_message(&self) -> String {
        match self {
            Self::EmptyName => "Le nom ne peut pas être vide.".to_string(),
            Self::NameTooLong { max } => {
                format!("Le nom ne peut pas dépasser {} caractères.", max)
            }
            Self::InvalidColorFormat => {
                "La couleur doit être au format #RRGGBB.".to_string()
            }
            Self::InvalidIcon { icon } => format!("L'icône « {} » n'est pas autorisée.", icon),
            Self::NegativeQuantity { field } => {
                format!("Le champ {} ne peut pas être négatif.", field)
            }
            Self::InvalidMaxQuantity => {
                "La quantité maximale doit être supérieure à zéro.".to_string()
            }
            Self::QuantityExceedsMax { current, max } => format!(
                "La quantité actuelle ({}) dépasse la quantité maximale ({}).",
                current, max
            ),
            Self::InvalidThresholds { critical, warning } => format!(
                "Le seuil critique ({}) doit être inférieur au seuil d'alerte ({}).",
                critical, warning
            ),
            Self::ExpiredDate { date } => format!(
                "La date d'expiration ({}) est déjà passée.",
                date.format("%d/%m/%Y")
            ),
            Self::InvalidAisleReference { .. } => "Le rayon sélectionné n'existe pas.".to_string(),
            Self::DuplicateAisleName { name } => {
                format!("Un rayon nommé « {} » existe déjà.", name)
            }
            Self::TooManyAisles { max } => {
                format!("Vous ne pouvez pas créer plus de {} rayons.", max)
            }
            Self::AisleContainsMedicines { count } => format!(
                "Impossible de supprimer ce rayon : il contient {} médicament(s).",
                count
            ),
            Self::MissingRequiredField { field } => {
                format!("Le champ {} est obligatoire.", field)
            }
        }
    }
}

/// Tunable rules applied by the validators and the stock use-cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryPolicy {
    pub max_aisles_per_user: usize,
    pub expiring_soon_days: i64,
    /// Reject expiry dates that are already past when they are set.
    pub reject_past_expiry: bool,
    /// Refuse withdrawals that would take stock under the critical threshold.
    pub block_withdrawal_below_critical: bool,
}

impl Default for InventoryPolicy {
    fn default() -> Self {
        Self {
            max_aisles_per_user: 50,
            expiring_soon_days: crate::models::EXPIRING_SOON_DAYS,
            reject_past_expiry: true,
            block_withdrawal_below_critical: true,
        }
    }
}

/// How the expiry date of a candidate should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryCheck {
    /// New record, or the expiry date changed: a past date is refused.
    Enforce,
    /// Existing record whose expiry did not change: expired stock may still be edited.
    Skip,
}

pub fn validate_name(name: &str, max_len: usize) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > max_len {
        return Err(ValidationError::NameTooLong { max: max_len });
    }
    Ok(())
}

pub fn validate_non_negative(field: &str, value: i32) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeQuantity {
            field: field.to_string(),
        });
    }
    Ok(())
}

pub fn validate_thresholds(critical: i32, warning: i32) -> Result<(), ValidationError> {
    validate_non_negative("criticalThreshold", critical)?;
    validate_non_negative("warningThreshold", warning)?;
    if critical >= warning {
        return Err(ValidationError::InvalidThresholds { critical, warning });
    }
    Ok(())
}

pub fn validate_color_hex(color: &str) -> Result<(), ValidationError> {
    if COLOR_HEX.is_match(color) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColorFormat)
    }
}

pub fn validate_icon(icon: &str) -> Result<(), ValidationError> {
    if ALLOWED_ICONS.contains(&icon) {
        Ok(())
    } else {
        Err(ValidationError::InvalidIcon {
            icon: icon.to_string(),
        })
    }
}

pub fn validate_medicine(
    medicine: &Medicine,
    now: DateTime<Utc>,
    policy: &InventoryPolicy,
    expiry: ExpiryCheck,
) -> Result<(), ValidationError> {
    validate_name(&medicine.name, MEDICINE_NAME_MAX_LEN)?;
    if medicine.unit.trim().is_empty() {
        return Err(ValidationError::MissingRequiredField {
            field: "unit".to_string(),
        });
    }
    validate_non_negative("currentQuantity", medicine.current_quantity)?;
    if medicine.max_quantity <= 0 {
        return Err(ValidationError::InvalidMaxQuantity);
    }
    if medicine.current_quantity > medicine.max_quantity {
        return Err(ValidationError::QuantityExceedsMax {
            current: medicine.current_quantity,
            max: medicine.max_quantity,
        });
    }
    validate_thresholds(medicine.critical_threshold, medicine.warning_threshold)?;
    if expiry == ExpiryCheck::Enforce && policy.reject_past_expiry {
        if let Some(date) = medicine.expiry_date {
            if date <= now {
                return Err(ValidationError::ExpiredDate { date });
            }
        }
    }
    Ok(())
}

pub fn validate_aisle(aisle: &Aisle) -> Result<(), ValidationError> {
    validate_name(&aisle.name, AISLE_NAME_MAX_LEN)?;
    validate_color_hex(&aisle.color_hex)?;
    validate_icon(&aisle.icon)
}
