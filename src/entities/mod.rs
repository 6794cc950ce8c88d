//! SeaORM entities backing the repositories.

pub mod aisle;
pub mod history_entry;
pub mod medicine;
pub mod user;
