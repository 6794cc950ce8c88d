pub mod add_aisle_command;
pub mod delete_aisle_command;
pub mod update_aisle_command;

pub use add_aisle_command::{AddAisleCommand, NewAisle};
pub use delete_aisle_command::DeleteAisleCommand;
pub use update_aisle_command::{AisleChanges, UpdateAisleCommand};
