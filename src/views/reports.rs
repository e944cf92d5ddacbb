use crate::adapters::{ApiClient, RequestDescriptor};
use crate::domain::report::{ReportFilter, ReportFormat, ReportSummary};
use crate::error::{ApiError, Result};
use crate::services::SessionService;
use crate::ui::ToastManager;
use crate::ui::format::{format_currency, format_date_str};
use reqwest::Method;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

pub const SUMMARY_PATH: &str = "/reports/summary/";
pub const DOWNLOAD_PATH: &str = "/reports/download/";

/// Writes a report summary as label/value lines.
///
/// # Errors
/// Returns any error from the underlying writer.
pub fn render_summary(summary: &ReportSummary, out: &mut dyn Write) -> io::Result<()> {
    writeln!(out, "Total Items      {}", summary.total_items)?;
    writeln!(out, "Total Value      {}", format_currency(summary.total_value))?;
    writeln!(out, "Low Stock Items  {}", summary.low_stock_count)?;
    writeln!(out, "Expired Items    {}", summary.expired_count)?;
    for (key, value) in &summary.filters_applied {
        if !value.is_null() {
            writeln!(out, "Filter {key}: {}", value.as_str().map_or_else(|| value.to_string(), format_date_str))?;
        }
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ReportsController {
    api: Arc<ApiClient>,
    session: SessionService,
    toasts: Arc<ToastManager>,
}

impl ReportsController {
    #[must_use]
    pub const fn new(api: Arc<ApiClient>, session: SessionService, toasts: Arc<ToastManager>) -> Self {
        Self { api, session, toasts }
    }

    /// # Errors
    /// Propagates request failures after reporting them with a toast.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn summary(&self, filter: &ReportFilter) -> Result<ReportSummary> {
        let request = RequestDescriptor::new(Method::GET, SUMMARY_PATH)
            .with_query(filter.query_pairs().into_iter().map(|(k, v)| (k.to_string(), v)));

        self.api.send_json(request).await.inspect_err(|_| {
            self.toasts.error("Error", "Failed to load report summary");
        })
    }

    /// Exports the filtered inventory to `dest` in the requested format.
    ///
    /// # Errors
    /// `Forbidden` for viewers; request and file failures are reported with a toast and returned.
    #[tracing::instrument(skip(self, dest), err(level = "debug"))]
    pub async fn download(&self, format: ReportFormat, filter: &ReportFilter, dest: &Path) -> Result<u64> {
        if self.session.is_viewer() {
            self.toasts.error("Access Denied", "Admin access required");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        let mut query = vec![("file_format".to_string(), format.as_str().to_string())];
        query.extend(filter.query_pairs().into_iter().map(|(k, v)| (k.to_string(), v)));

        match self.api.download(DOWNLOAD_PATH, query, dest).await {
            Ok(bytes) => {
                self.toasts.success("Success", "Report downloaded successfully");
                Ok(bytes)
            }
            Err(e) => {
                self.toasts.error("Error", &e.to_string());
                Err(e)
            }
        }
    }
}
