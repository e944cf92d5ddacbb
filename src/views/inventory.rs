use crate::adapters::ApiClient;
use crate::domain::inventory::{InventoryItem, ItemDraft, StockStatus};
use crate::domain::listing::Listing;
use crate::domain::report::StatusFilter;
use crate::error::{ApiError, Result};
use crate::services::SessionService;
use crate::ui::format::{format_currency, format_date, format_relative_time};
use crate::ui::table::Table;
use crate::ui::{Confirm, ToastManager};
use clap::ValueEnum;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const INVENTORY_PATH: &str = "/inventory/";

fn item_path(id: i64) -> String {
    format!("{INVENTORY_PATH}{id}/")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortColumn {
    Sku,
    Name,
    Category,
    Quantity,
    UnitPrice,
    ExpiryDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryFilter {
    pub search: String,
    pub category: Option<String>,
    pub status: Option<StatusFilter>,
}

/// Position within the filtered rows, 1-based for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub start: usize,
    pub end: usize,
    pub total: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageInfo {
    #[must_use]
    pub fn summary(&self) -> String {
        format!("Showing {} to {} of {} results", self.start, self.end, self.total)
    }
}

/// Client-side view of the inventory list: the fetched snapshot plus filter, sort and page state.
#[derive(Debug, Clone)]
pub struct InventoryView {
    items: Vec<InventoryItem>,
    filtered: Vec<InventoryItem>,
    total_items: usize,
    filter: InventoryFilter,
    sort: Option<(SortColumn, SortDirection)>,
    page: usize,
    page_size: usize,
    default_reorder_level: u32,
    now: OffsetDateTime,
}

impl InventoryView {
    #[must_use]
    pub fn new(page_size: usize, default_reorder_level: u32) -> Self {
        Self {
            items: Vec::new(),
            filtered: Vec::new(),
            total_items: 0,
            filter: InventoryFilter::default(),
            sort: None,
            page: 1,
            page_size: page_size.max(1),
            default_reorder_level,
            now: OffsetDateTime::now_utc(),
        }
    }

    /// Fixes the clock used for expiry checks and "updated" times.
    pub fn set_clock(&mut self, now: OffsetDateTime) {
        self.now = now;
        self.apply();
    }

    /// Replaces the snapshot and re-applies the current filters.
    pub fn set_items(&mut self, items: Vec<InventoryItem>, total_items: usize) {
        self.items = items;
        self.total_items = total_items;
        self.apply();
    }

    #[must_use]
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    /// Total reported by the server, which may exceed the fetched snapshot.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    #[must_use]
    pub fn find(&self, id: i64) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Distinct category names in the snapshot, sorted.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.items.iter().filter_map(InventoryItem::category).map(str::to_string).collect::<BTreeSet<_>>().into_iter().collect()
    }

    #[must_use]
    pub const fn filter(&self) -> &InventoryFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: InventoryFilter) {
        self.filter = filter;
        self.apply();
    }

    #[must_use]
    pub const fn sort(&self) -> Option<(SortColumn, SortDirection)> {
        self.sort
    }

    /// Sorts by `column`. The current column flips direction; a new column starts ascending.
    pub fn sort_by(&mut self, column: SortColumn) {
        self.sort = match self.sort {
            Some((current, direction)) if current == column => Some((column, direction.reversed())),
            _ => Some((column, SortDirection::Asc)),
        };
        self.apply();
    }

    pub fn set_sort(&mut self, column: SortColumn, direction: SortDirection) {
        self.sort = Some((column, direction));
        self.apply();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Moves to `page`, clamped to the available pages.
    pub fn go_to_page(&mut self, page: usize) {
        let last = self.filtered.len().div_ceil(self.page_size).max(1);
        self.page = page.clamp(1, last);
    }

    pub fn next_page(&mut self) -> bool {
        if self.page_info().has_next {
            self.page += 1;
            return true;
        }
        false
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            return true;
        }
        false
    }

    #[must_use]
    pub fn filtered(&self) -> &[InventoryItem] {
        &self.filtered
    }

    #[must_use]
    pub fn page_items(&self) -> &[InventoryItem] {
        let start = ((self.page - 1) * self.page_size).min(self.filtered.len());
        let end = (start + self.page_size).min(self.filtered.len());
        &self.filtered[start..end]
    }

    #[must_use]
    pub fn page_info(&self) -> PageInfo {
        let total = self.filtered.len();
        let end = (self.page * self.page_size).min(total);
        let start = if total == 0 { 0 } else { (self.page - 1) * self.page_size + 1 };
        PageInfo { start, end, total, has_prev: self.page > 1, has_next: end < total }
    }

    #[must_use]
    pub fn status_of(&self, item: &InventoryItem) -> StockStatus {
        item.stock_status(self.now.date(), self.default_reorder_level)
    }

    fn updated(&self, item: &InventoryItem) -> String {
        item.updated_at
            .as_deref()
            .and_then(|raw| OffsetDateTime::parse(raw, &Rfc3339).ok())
            .map_or_else(|| "N/A".to_string(), |at| format_relative_time(at, self.now))
    }

    fn matches(&self, item: &InventoryItem) -> bool {
        let search = self.filter.search.trim().to_lowercase();
        let matches_search = search.is_empty()
            || item.name.to_lowercase().contains(&search)
            || item.sku.to_lowercase().contains(&search);

        let matches_category =
            self.filter.category.as_deref().is_none_or(|c| c.is_empty() || item.category() == Some(c));

        let matches_status = match self.filter.status {
            None => true,
            Some(StatusFilter::LowStock) => item.is_low_stock(self.default_reorder_level),
            Some(StatusFilter::Expired) => item.is_expired(self.now.date()),
            Some(StatusFilter::InStock) => !item.is_low_stock(self.default_reorder_level),
        };

        matches_search && matches_category && matches_status
    }

    fn apply(&mut self) {
        let mut filtered: Vec<InventoryItem> = self.items.iter().filter(|i| self.matches(i)).cloned().collect();
        if let Some((column, direction)) = self.sort {
            filtered.sort_by(|a, b| {
                let ord = compare(a, b, column);
                match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        self.filtered = filtered;
        self.page = 1;
    }

    /// Writes the current page, or an empty-state message, followed by the pagination line.
    ///
    /// # Errors
    /// Returns any error from the underlying writer.
    pub fn render(&self, out: &mut dyn Write, can_edit: bool) -> io::Result<()> {
        let rows = self.page_items();
        if rows.is_empty() {
            writeln!(out, "No inventory items found")?;
            writeln!(out, "Try adjusting your filters or add a new item.")?;
        } else {
            let mut table =
                Table::new(["ID", "SKU", "Name", "Category", "Qty", "Unit Price", "Total Value", "Expiry", "Status", "Updated"]);
            for item in rows {
                table.push_row(vec![
                    item.id.to_string(),
                    item.sku.clone(),
                    item.name.clone(),
                    item.category().unwrap_or("N/A").to_string(),
                    item.quantity.to_string(),
                    format_currency(item.unit_price),
                    format_currency(item.total_value()),
                    item.expiry_date.map_or_else(|| "N/A".to_string(), format_date),
                    self.status_of(item).to_string(),
                    self.updated(item),
                ]);
            }
            table.render(out)?;
        }

        writeln!(out, "{}", self.page_info().summary())?;
        if !can_edit {
            writeln!(out, "Edit and delete: Admin access required")?;
        }
        Ok(())
    }
}

fn compare(a: &InventoryItem, b: &InventoryItem, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Sku => a.sku.cmp(&b.sku),
        SortColumn::Name => a.name.cmp(&b.name),
        SortColumn::Category => a.category().cmp(&b.category()),
        SortColumn::Quantity => a.quantity.cmp(&b.quantity),
        SortColumn::UnitPrice => a.unit_price.total_cmp(&b.unit_price),
        SortColumn::ExpiryDate => a.expiry_date.cmp(&b.expiry_date),
    }
}

/// Inventory list and item actions.
#[derive(Debug)]
pub struct InventoryController {
    api: Arc<ApiClient>,
    session: SessionService,
    toasts: Arc<ToastManager>,
    confirm: Arc<dyn Confirm>,
    view: InventoryView,
}

impl InventoryController {
    #[must_use]
    pub const fn new(
        api: Arc<ApiClient>,
        session: SessionService,
        toasts: Arc<ToastManager>,
        confirm: Arc<dyn Confirm>,
        view: InventoryView,
    ) -> Self {
        Self { api, session, toasts, confirm, view }
    }

    #[must_use]
    pub const fn view(&self) -> &InventoryView {
        &self.view
    }

    pub const fn view_mut(&mut self) -> &mut InventoryView {
        &mut self.view
    }

    #[must_use]
    pub fn can_edit(&self) -> bool {
        self.session.is_admin()
    }

    /// Fetches the inventory list into the snapshot.
    ///
    /// # Errors
    /// Propagates request failures after reporting them with a toast.
    #[tracing::instrument(skip(self), fields(items = tracing::field::Empty), err(level = "debug"))]
    pub async fn load(&mut self) -> Result<()> {
        match self.api.get_json::<Listing<InventoryItem>>(INVENTORY_PATH).await {
            Ok(listing) => {
                let (items, total) = listing.into_parts();
                tracing::Span::current().record("items", items.len());
                self.view.set_items(items, total);
                Ok(())
            }
            Err(e) => {
                self.toasts.error("Error", "Failed to load inventory data");
                Err(e)
            }
        }
    }

    /// Asks for confirmation, then deletes the item and reloads the list.
    ///
    /// Returns `Ok(false)` when the user cancelled.
    ///
    /// # Errors
    /// `Forbidden` for non-admins; request failures are reported with a toast and returned.
    #[tracing::instrument(skip(self), err(level = "debug"))]
    pub async fn delete_item(&mut self, id: i64) -> Result<bool> {
        self.require_admin()?;

        let name = self.view.find(id).map_or_else(|| format!("#{id}"), |i| i.name.clone());
        let message = format!("Are you sure you want to delete \"{name}\"? This action cannot be undone.");
        let confirm = Arc::clone(&self.confirm);
        let confirmed = tokio::task::spawn_blocking(move || confirm.confirm("Delete Item", &message))
            .await
            .unwrap_or(false);
        if !confirmed {
            tracing::debug!("Delete cancelled");
            return Ok(false);
        }

        if let Err(e) = self.api.delete(&item_path(id)).await {
            self.toasts.error("Error", "Failed to delete item");
            return Err(e);
        }

        self.toasts.success("Success", "Item deleted successfully");
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Reload after delete failed");
        }
        Ok(true)
    }

    /// Creates an item after validating it locally.
    ///
    /// # Errors
    /// `Validation` for a rejected draft, `Forbidden` for non-admins, or the request failure.
    #[tracing::instrument(skip(self, draft), err(level = "debug"))]
    pub async fn create_item(&mut self, draft: ItemDraft) -> Result<InventoryItem> {
        self.require_admin()?;
        let draft = draft.normalized();
        if let Err(e) = draft.validate_new() {
            self.toasts.error("Validation Error", &e.to_string());
            return Err(e);
        }

        let value = match self.api.post(INVENTORY_PATH, &draft).await {
            Ok(v) => v,
            Err(e) => {
                self.toasts.error("Error", &e.to_string());
                return Err(e);
            }
        };
        let item: InventoryItem = serde_json::from_value(value)?;

        self.toasts.success("Success", "Item added successfully");
        let mut items = self.view.items().to_vec();
        items.push(item.clone());
        let total = self.view.total_items() + 1;
        self.view.set_items(items, total);
        Ok(item)
    }

    /// Applies the fields present in `draft` to an existing item.
    ///
    /// # Errors
    /// `Validation` for a rejected draft, `Forbidden` for non-admins, or the request failure.
    #[tracing::instrument(skip(self, draft), err(level = "debug"))]
    pub async fn update_item(&mut self, id: i64, draft: ItemDraft) -> Result<InventoryItem> {
        self.require_admin()?;
        let draft = draft.normalized();
        if let Err(e) = draft.validate_update() {
            self.toasts.error("Validation Error", &e.to_string());
            return Err(e);
        }

        let value = match self.api.patch(&item_path(id), &draft).await {
            Ok(v) => v,
            Err(e) => {
                self.toasts.error("Error", &e.to_string());
                return Err(e);
            }
        };
        let item: InventoryItem = serde_json::from_value(value)?;

        self.toasts.success("Success", "Item updated successfully");
        let mut items = self.view.items().to_vec();
        match items.iter_mut().find(|i| i.id == id) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        let total = self.view.total_items().max(items.len());
        self.view.set_items(items, total);
        Ok(item)
    }

    fn require_admin(&self) -> Result<()> {
        self.session.ensure_admin().inspect_err(|e| {
            if matches!(e, ApiError::Forbidden(_)) {
                self.toasts.error("Access Denied", "Admin access required");
            }
        })
    }
}
