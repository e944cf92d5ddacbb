pub mod dashboard;
pub mod inventory;
pub mod layout;
pub mod reports;
pub mod theme;

pub use dashboard::{DashboardController, DashboardView};
pub use inventory::{InventoryController, InventoryFilter, InventoryView, SortColumn, SortDirection};
pub use layout::{Layout, Page};
pub use reports::ReportsController;
pub use theme::{Theme, ThemeManager};
