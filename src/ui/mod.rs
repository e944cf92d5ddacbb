pub mod format;
pub mod modal;
pub mod navigation;
pub mod table;
pub mod toast;
pub mod validate;

pub use modal::{Confirm, FixedAnswer, TerminalPrompt};
pub use navigation::{HistoryNavigator, Navigator, Route};
pub use toast::{Toast, ToastLevel, ToastManager};
