//! Domain records shared by the repositories, use-cases and handlers.

pub mod aisle;
pub mod history;
pub mod medicine;
pub mod user;

pub use aisle::{Aisle, AisleView, ALLOWED_ICONS};
pub use history::{HistoryAction, HistoryEntry};
pub use medicine::{Medicine, MedicineView, StockStatus, EXPIRING_SOON_DAYS};
pub use user::User;
