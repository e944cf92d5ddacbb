use crate::config::DashboardConfig;
use crate::views::{DashboardController, DashboardView};
use opentelemetry::{global, metrics::Counter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;

#[derive(Clone, Debug)]
struct Metrics {
    fetches: Counter<u64>,
    failures: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("invento-client");
        Self {
            fetches: meter
                .u64_counter("dashboard_refresh_total")
                .with_description("Total number of periodic dashboard fetches started")
                .build(),
            failures: meter
                .u64_counter("dashboard_refresh_errors_total")
                .with_description("Total number of periodic dashboard fetches that failed")
                .build(),
        }
    }
}

/// Shared flag standing in for page visibility. Ticks are skipped while hidden.
#[derive(Debug, Clone)]
pub struct Visibility(Arc<AtomicBool>);

impl Default for Visibility {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl Visibility {
    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Re-fetches the dashboard on a fixed interval and publishes each completed view.
///
/// Fetches are spawned without waiting for earlier ones, so a slow response may land after a
/// newer one; whichever completes last is what subscribers see.
#[derive(Debug)]
pub struct DashboardRefreshWorker {
    controller: DashboardController,
    config: DashboardConfig,
    visibility: Visibility,
    publisher: Arc<watch::Sender<Option<DashboardView>>>,
    metrics: Metrics,
}

impl DashboardRefreshWorker {
    #[must_use]
    pub fn new(controller: DashboardController, config: DashboardConfig, visibility: Visibility) -> Self {
        let (publisher, _) = watch::channel(None);
        Self { controller, config, visibility, publisher: Arc::new(publisher), metrics: Metrics::new() }
    }

    /// A receiver for the most recently loaded view.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<DashboardView>> {
        self.publisher.subscribe()
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.config.refresh_interval_secs.max(1)));

        while !*shutdown.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if !self.controller.session().is_authenticated() {
                        tracing::info!("Session ended, stopping dashboard refresh");
                        break;
                    }
                    if self.visibility.is_visible() {
                        self.spawn_fetch();
                    } else {
                        tracing::trace!("Dashboard hidden, skipping refresh");
                    }
                }
                res = shutdown.changed() => {
                    if res.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Dashboard refresh loop shutting down...");
    }

    fn spawn_fetch(&self) {
        self.metrics.fetches.add(1, &[]);
        let controller = self.controller.clone();
        let publisher = Arc::clone(&self.publisher);
        let metrics = self.metrics.clone();

        tokio::spawn(
            async move {
                match controller.load().await {
                    Ok(view) => {
                        publisher.send_replace(Some(view));
                    }
                    Err(e) => {
                        metrics.failures.add(1, &[]);
                        tracing::warn!(error = %e, "Dashboard refresh failed");
                    }
                }
            }
            .instrument(tracing::info_span!("dashboard_refresh_iteration")),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_defaults_to_visible() {
        let visibility = Visibility::default();
        assert!(visibility.is_visible());

        let shared = visibility.clone();
        shared.set(false);
        assert!(!visibility.is_visible());
    }
}
