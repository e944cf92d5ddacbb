use std::fmt::Debug;
use std::sync::{Mutex, PoisonError};

/// Client entry points that a forced navigation can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Inventory,
    Reports,
    Alerts,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/",
            Self::Dashboard => "/dashboard/",
            Self::Inventory => "/inventory/",
            Self::Reports => "/reports/",
            Self::Alerts => "/alerts/",
        }
    }
}

pub trait Navigator: Send + Sync + Debug {
    /// Leaves the current view for `route`. Pending work of the current view is abandoned.
    fn redirect(&self, route: Route);
}

/// Navigator that logs and remembers every redirect.
#[derive(Debug, Default)]
pub struct HistoryNavigator {
    history: Mutex<Vec<Route>>,
}

impl HistoryNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).last().copied()
    }

    #[must_use]
    pub fn history(&self) -> Vec<Route> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for HistoryNavigator {
    fn redirect(&self, route: Route) {
        tracing::info!(path = route.path(), "Navigating");
        self.history.lock().unwrap_or_else(PoisonError::into_inner).push(route);
    }
}
