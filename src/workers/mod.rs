pub mod dashboard_refresh;

pub use dashboard_refresh::{DashboardRefreshWorker, Visibility};
