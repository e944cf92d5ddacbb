pub mod auth;
pub mod dashboard;
pub(crate) mod de;
pub mod inventory;
pub mod listing;
pub mod report;
pub mod session;
