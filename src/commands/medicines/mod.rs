pub mod add_medicine_command;
pub mod adjust_stock_command;
pub mod delete_medicine_command;
pub mod update_medicine_command;
pub mod update_stock_command;

pub use add_medicine_command::{AddMedicineCommand, NewMedicine};
pub use adjust_stock_command::{
    plan_adjustment, AdjustStockCommand, StockAdjustmentRequest, StockAdjustmentResult, StockChange,
};
pub use delete_medicine_command::DeleteMedicineCommand;
pub use update_medicine_command::{MedicineChanges, UpdateMedicineCommand};
pub use update_stock_command::{plan_stock_update, StockUpdateRequest, UpdateStockCommand};
