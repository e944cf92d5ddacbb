use crate::domain::de;
use clap::ValueEnum;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use time::Date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ReportFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock status filter understood by both the inventory list and the report endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusFilter {
    InStock,
    LowStock,
    Expired,
}

impl StatusFilter {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStock => "in_stock",
            Self::LowStock => "low_stock",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: Option<StatusFilter>,
}

impl ReportFilter {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(d) = self.start_date {
            pairs.push(("start_date", de::format_iso_date(d)));
        }
        if let Some(d) = self.end_date {
            pairs.push(("end_date", de::format_iso_date(d)));
        }
        if let Some(s) = self.status {
            pairs.push(("status", s.as_str().to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReportSummary {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default, deserialize_with = "de::decimal")]
    pub total_value: f64,
    #[serde(default)]
    pub low_stock_count: u64,
    #[serde(default)]
    pub expired_count: u64,
    #[serde(default)]
    pub filters_applied: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn test_query_pairs() {
        let filter = ReportFilter {
            start_date: Some(Date::from_calendar_date(2026, Month::January, 5).unwrap()),
            end_date: None,
            status: Some(StatusFilter::LowStock),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![("start_date", "2026-01-05".to_string()), ("status", "low_stock".to_string())]
        );
        assert!(ReportFilter::default().query_pairs().is_empty());
    }
}
