#![forbid(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::todo)]
#![warn(clippy::panic)]
#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::clone_on_ref_ptr)]
#![warn(unreachable_pub)]
#![warn(missing_debug_implementations)]
#![warn(unused_qualifications)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod services;
pub mod storage;
pub mod telemetry;
pub mod ui;
pub mod views;
pub mod workers;

use crate::adapters::ApiClient;
use crate::config::Config;
use crate::services::SessionService;
use crate::storage::{CredentialStore, FileStore, KeyValueStore};
use crate::ui::{Confirm, FixedAnswer, HistoryNavigator, Navigator, TerminalPrompt, ToastManager};
use crate::views::{
    DashboardController, InventoryController, InventoryView, Layout, Page, ReportsController, ThemeManager,
};
use crate::workers::{DashboardRefreshWorker, Visibility};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Explicitly wired client services. Controllers are created on demand and share them.
#[derive(Debug, Clone)]
pub struct App {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub credentials: Arc<CredentialStore>,
    pub navigator: Arc<dyn Navigator>,
    pub api: Arc<ApiClient>,
    pub toasts: Arc<ToastManager>,
    pub confirm: Arc<dyn Confirm>,
    pub session: SessionService,
    pub themes: Arc<ThemeManager>,
}

impl App {
    #[must_use]
    pub fn dashboard(&self) -> DashboardController {
        DashboardController::new(Arc::clone(&self.api), self.session.clone(), Arc::clone(&self.toasts))
    }

    #[must_use]
    pub fn inventory(&self) -> InventoryController {
        let view = InventoryView::new(self.config.inventory.page_size, self.config.inventory.default_reorder_level);
        InventoryController::new(
            Arc::clone(&self.api),
            self.session.clone(),
            Arc::clone(&self.toasts),
            Arc::clone(&self.confirm),
            view,
        )
    }

    #[must_use]
    pub fn reports(&self) -> ReportsController {
        ReportsController::new(Arc::clone(&self.api), self.session.clone(), Arc::clone(&self.toasts))
    }

    #[must_use]
    pub fn layout(&self, page: Page) -> Layout {
        Layout::new(&self.session.session(), self.themes.theme(), page)
    }

    #[must_use]
    pub fn dashboard_worker(&self, visibility: Visibility) -> DashboardRefreshWorker {
        DashboardRefreshWorker::new(self.dashboard(), self.config.dashboard.clone(), visibility)
    }
}

pub struct AppBuilder {
    config: Config,
    store: Option<Arc<dyn KeyValueStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    confirm: Option<Arc<dyn Confirm>>,
    toast_sink: Option<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("navigator", &self.navigator)
            .field("confirm", &self.confirm)
            .finish_non_exhaustive()
    }
}

impl AppBuilder {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config, store: None, navigator: None, confirm: None, toast_sink: None }
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    #[must_use]
    pub fn with_confirm(mut self, confirm: Arc<dyn Confirm>) -> Self {
        self.confirm = Some(confirm);
        self
    }

    #[must_use]
    pub fn with_toast_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.toast_sink = Some(sink);
        self
    }

    /// Wires the services. Without an explicit store the configured state file is opened.
    ///
    /// # Errors
    /// Returns an error if the state file is unreadable or the HTTP client cannot be built.
    pub fn build(self) -> error::Result<App> {
        let config = self.config;

        let store: Arc<dyn KeyValueStore> = match self.store {
            Some(store) => store,
            None => Arc::new(FileStore::open(&config.storage.state_file)?),
        };
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(HistoryNavigator::new()));
        let confirm: Arc<dyn Confirm> = self.confirm.unwrap_or_else(|| {
            if config.ui.assume_yes { Arc::new(FixedAnswer(true)) } else { Arc::new(TerminalPrompt) }
        });
        let toasts = Arc::new(ToastManager::new(
            Duration::from_millis(config.ui.toast_duration_ms),
            self.toast_sink.unwrap_or_else(|| Box::new(std::io::stderr())),
        ));

        let credentials = Arc::new(CredentialStore::new(Arc::clone(&store)));
        let api = Arc::new(ApiClient::new(&config.api, Arc::clone(&credentials), Arc::clone(&navigator))?);
        let session = SessionService::new(Arc::clone(&api), Arc::clone(&toasts));
        let themes = Arc::new(ThemeManager::new(Arc::clone(&store)));

        Ok(App { config, store, credentials, navigator, api, toasts, confirm, session, themes })
    }
}

/// Routes panics through tracing so they reach the configured log output.
pub fn setup_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "Panic occurred");
    }));
}

/// Flips the shutdown flag on Ctrl-C.
pub fn spawn_signal_handler(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(true);
    });
}
