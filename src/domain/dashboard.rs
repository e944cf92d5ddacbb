use crate::domain::de;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DashboardSummary {
    #[serde(default)]
    pub total_items: u64,
    #[serde(default, alias = "low_stock_count")]
    pub low_stock_items: u64,
    #[serde(default, alias = "expired_items_count")]
    pub expired_items: u64,
    #[serde(default, deserialize_with = "de::decimal")]
    pub total_stock_value: f64,
    #[serde(default)]
    pub stock_trend: Vec<TrendPoint>,
    #[serde(default)]
    pub category_distribution: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrendPoint {
    pub date: String,
    #[serde(default)]
    pub total_items: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CategoryCount {
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub count: u64,
}
