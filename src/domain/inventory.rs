use crate::domain::de;
use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::Date;

/// Highest unit price the server accepts (`DecimalField(max_digits=10, decimal_places=2)`).
pub const MAX_UNIT_PRICE: f64 = 100_000_000.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, deserialize_with = "de::decimal")]
    pub unit_price: f64,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub reorder_level: Option<u32>,
    #[serde(default, deserialize_with = "de::opt_date")]
    pub expiry_date: Option<Date>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockStatus {
    InStock,
    LowStock,
    Expired,
}

impl StockStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::InStock => "In Stock",
            Self::LowStock => "Low Stock",
            Self::Expired => "Expired",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl InventoryItem {
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category_name.as_deref().or(self.category.as_deref()).filter(|c| !c.is_empty())
    }

    #[must_use]
    pub fn supplier(&self) -> Option<&str> {
        self.supplier_name.as_deref().or(self.supplier.as_deref()).filter(|s| !s.is_empty())
    }

    /// The item's reorder level; a zero or missing level uses `default_level`.
    #[must_use]
    pub fn reorder_level_or(&self, default_level: u32) -> i64 {
        i64::from(self.reorder_level.filter(|l| *l > 0).unwrap_or(default_level))
    }

    #[must_use]
    pub fn is_low_stock(&self, default_level: u32) -> bool {
        self.quantity <= self.reorder_level_or(default_level)
    }

    #[must_use]
    pub fn is_expired(&self, today: Date) -> bool {
        self.expiry_date.is_some_and(|d| d < today)
    }

    /// Classifies the item. Expiry takes priority over stock level.
    #[must_use]
    pub fn stock_status(&self, today: Date, default_level: u32) -> StockStatus {
        if self.is_expired(today) {
            StockStatus::Expired
        } else if self.is_low_stock(default_level) {
            StockStatus::LowStock
        } else {
            StockStatus::InStock
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_value(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Payload for creating or updating an inventory item.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(rename = "category_name", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(rename = "supplier_name", skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<u32>,
    #[serde(with = "de::iso_date::option", skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ItemDraft {
    /// Checks a draft for a new item: name, SKU, quantity and price are all required.
    ///
    /// # Errors
    /// Returns `ApiError::Validation` naming the first offending field.
    pub fn validate_new(&self) -> Result<()> {
        if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
            return Err(ApiError::Validation("Item name is required.".into()));
        }
        if self.sku.as_deref().is_none_or(|s| s.trim().is_empty()) {
            return Err(ApiError::Validation("SKU is required.".into()));
        }
        if self.quantity.is_none() {
            return Err(ApiError::Validation("Quantity is required.".into()));
        }
        if self.unit_price.is_none() {
            return Err(ApiError::Validation("Unit price is required.".into()));
        }
        self.validate_update()
    }

    /// Checks only the fields present, as a partial update does.
    ///
    /// # Errors
    /// Returns `ApiError::Validation` naming the first offending field.
    pub fn validate_update(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::Validation("Item name is required.".into()));
        }
        if self.sku.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ApiError::Validation("SKU is required.".into()));
        }
        if self.quantity.is_some_and(|q| q < 0) {
            return Err(ApiError::Validation("Quantity cannot be negative.".into()));
        }
        if let Some(price) = self.unit_price {
            if !price.is_finite() {
                return Err(ApiError::Validation("Invalid price format.".into()));
            }
            if price < 0.0 {
                return Err(ApiError::Validation("Price cannot be negative.".into()));
            }
            if price >= MAX_UNIT_PRICE {
                return Err(ApiError::Validation(
                    "Price exceeds maximum allowed value (99,999,999.99).".into(),
                ));
            }
        }
        Ok(())
    }

    /// Trims the text fields the server trims.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.name = self.name.map(|n| n.trim().to_string());
        self.sku = self.sku.map(|s| s.trim().to_string());
        self
    }
}
