use crate::adapters::ApiClient;
use crate::domain::dashboard::DashboardSummary;
use crate::domain::de::parse_date;
use crate::error::Result;
use crate::services::SessionService;
use crate::ui::ToastManager;
use crate::ui::format::{format_chart_label, format_currency};
use std::io::{self, Write};
use std::sync::Arc;

pub const DASHBOARD_PATH: &str = "/dashboard/";

pub const CHART_PALETTE: [&str; 6] = ["#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899"];
pub const TREND_LINE_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub title: &'static str,
    pub value: String,
    pub caption: String,
}

/// Labels and values ready to hand to a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSeries {
    pub label: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<u64>,
    pub colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub cards: Vec<KpiCard>,
    pub stock_trend: ChartSeries,
    pub categories: ChartSeries,
}

impl DashboardView {
    #[must_use]
    pub fn from_summary(summary: &DashboardSummary) -> Self {
        let cards = vec![
            KpiCard {
                title: "Total Items",
                value: summary.total_items.to_string(),
                caption: format!("{} items in stock", summary.total_items),
            },
            KpiCard {
                title: "Low Stock",
                value: summary.low_stock_items.to_string(),
                caption: "Requires attention".to_string(),
            },
            KpiCard {
                title: "Expired",
                value: summary.expired_items.to_string(),
                caption: if summary.expired_items > 0 { "Action needed" } else { "All good" }.to_string(),
            },
            KpiCard {
                title: "Stock Value",
                value: format_currency(summary.total_stock_value),
                caption: "Current inventory value".to_string(),
            },
        ];

        Self { cards, stock_trend: trend_series(summary), categories: category_series(summary) }
    }

    /// Writes the KPI cards and both chart series as text.
    ///
    /// # Errors
    /// Returns any error from the underlying writer.
    pub fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        for card in &self.cards {
            writeln!(out, "{:<12} {:>16}  {}", card.title, card.value, card.caption)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", self.stock_trend.label)?;
        for (label, value) in self.stock_trend.labels.iter().zip(&self.stock_trend.values) {
            writeln!(out, "  {label:<8} {value}")?;
        }

        writeln!(out)?;
        writeln!(out, "{}", self.categories.label)?;
        for (label, value) in self.categories.labels.iter().zip(&self.categories.values) {
            writeln!(out, "  {label:<20} {value}")?;
        }
        Ok(())
    }
}

fn trend_series(summary: &DashboardSummary) -> ChartSeries {
    let (labels, values) = if summary.stock_trend.is_empty() {
        ((1..=7).map(|d| format!("Day {d}")).collect(), vec![0; 7])
    } else {
        summary
            .stock_trend
            .iter()
            .map(|p| (parse_date(&p.date).map_or_else(|_| p.date.clone(), format_chart_label), p.total_items))
            .unzip()
    };

    ChartSeries { label: "Total Items", labels, values, colors: vec![TREND_LINE_COLOR] }
}

fn category_series(summary: &DashboardSummary) -> ChartSeries {
    let (labels, values) = if summary.category_distribution.is_empty() {
        (vec!["No Data".to_string()], vec![1])
    } else {
        summary
            .category_distribution
            .iter()
            .map(|c| (c.category_name.clone().unwrap_or_else(|| "Unknown".to_string()), c.count))
            .unzip()
    };

    ChartSeries { label: "Items by Category", labels, values, colors: CHART_PALETTE.to_vec() }
}

/// Loads the dashboard summary and turns it into a [`DashboardView`].
#[derive(Debug, Clone)]
pub struct DashboardController {
    api: Arc<ApiClient>,
    session: SessionService,
    toasts: Arc<ToastManager>,
}

impl DashboardController {
    #[must_use]
    pub const fn new(api: Arc<ApiClient>, session: SessionService, toasts: Arc<ToastManager>) -> Self {
        Self { api, session, toasts }
    }

    #[must_use]
    pub const fn session(&self) -> &SessionService {
        &self.session
    }

    /// Fetches the summary. A failure is reported with a toast and returned.
    ///
    /// # Errors
    /// Propagates request and decode failures.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn load(&self) -> Result<DashboardView> {
        match self.api.get_json::<DashboardSummary>(DASHBOARD_PATH).await {
            Ok(summary) => Ok(DashboardView::from_summary(&summary)),
            Err(e) => {
                self.toasts.error("Error", "Failed to load dashboard data");
                Err(e)
            }
        }
    }
}
