use clap::{Args, Parser, Subcommand};
use invento_client::config::Config;
use invento_client::domain::inventory::ItemDraft;
use invento_client::domain::report::{ReportFilter, ReportFormat, StatusFilter};
use invento_client::ui::validate::{validate_number, validate_positive_number};
use invento_client::views::{Page, SortColumn};
use std::path::PathBuf;
use time::Date;
use time::format_description::well_known::Iso8601;

#[derive(Debug, Parser)]
#[command(name = "invento", version, about = "Terminal client for the Invento inventory API")]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: Config,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Sign in and store the session
    Login {
        #[arg(long, env = "INVENTO_EMAIL")]
        email: String,
        #[arg(long, env = "INVENTO_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Reload the profile from the server first
        #[arg(long)]
        refresh: bool,
    },
    /// Show dashboard KPIs and chart data
    Dashboard {
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// List and manage inventory items
    #[command(subcommand)]
    Inventory(InventoryCommand),
    /// Report summaries and exports
    #[command(subcommand)]
    Report(ReportCommand),
    /// Show or switch the colour theme
    #[command(subcommand)]
    Theme(ThemeCommand),
    /// Show the navigation layout for a page
    Layout {
        #[arg(long, value_enum, default_value_t = Page::Dashboard)]
        page: Page,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum InventoryCommand {
    List(ListArgs),
    Add(ItemArgs),
    Update {
        id: i64,
        #[command(flatten)]
        item: ItemArgs,
    },
    Delete {
        id: i64,
    },
}

#[derive(Debug, Args)]
pub(crate) struct ListArgs {
    /// Case-insensitive match on name or SKU
    #[arg(long, default_value = "")]
    pub(crate) search: String,
    #[arg(long)]
    pub(crate) category: Option<String>,
    #[arg(long, value_enum)]
    pub(crate) status: Option<StatusFilter>,
    #[arg(long, value_enum)]
    pub(crate) sort: Option<SortColumn>,
    /// Sort descending
    #[arg(long, requires = "sort")]
    pub(crate) desc: bool,
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,
    /// Overrides the configured page size
    #[arg(long, value_parser = parse_page_size)]
    pub(crate) page_size: Option<usize>,
}

#[derive(Debug, Args)]
pub(crate) struct ItemArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    sku: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    quantity: Option<i64>,
    #[arg(long, allow_negative_numbers = true, value_parser = parse_price)]
    unit_price: Option<f64>,
    #[arg(long)]
    supplier: Option<String>,
    #[arg(long)]
    reorder_level: Option<u32>,
    #[arg(long, value_parser = parse_date)]
    expiry_date: Option<Date>,
    #[arg(long)]
    description: Option<String>,
}

impl From<ItemArgs> for ItemDraft {
    fn from(args: ItemArgs) -> Self {
        Self {
            name: args.name,
            sku: args.sku,
            category: args.category,
            quantity: args.quantity,
            unit_price: args.unit_price,
            supplier: args.supplier,
            reorder_level: args.reorder_level,
            expiry_date: args.expiry_date,
            description: args.description,
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum ReportCommand {
    Summary(FilterArgs),
    Download {
        #[arg(long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
        /// Destination file; defaults to `inventory_report.<format>`
        #[arg(long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Debug, Args)]
pub(crate) struct FilterArgs {
    #[arg(long, value_parser = parse_date)]
    start_date: Option<Date>,
    #[arg(long, value_parser = parse_date)]
    end_date: Option<Date>,
    #[arg(long, value_enum)]
    status: Option<StatusFilter>,
}

impl From<FilterArgs> for ReportFilter {
    fn from(args: FilterArgs) -> Self {
        Self { start_date: args.start_date, end_date: args.end_date, status: args.status }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum ThemeCommand {
    Show,
    Toggle,
}

fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw, &Iso8601::DATE).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_price(raw: &str) -> Result<f64, String> {
    if !validate_number(raw) {
        return Err("Invalid price format.".to_string());
    }
    raw.trim().parse().map_err(|e| format!("{e}"))
}

fn parse_page_size(raw: &str) -> Result<usize, String> {
    if !validate_positive_number(raw) {
        return Err("page size must be a positive number".to_string());
    }
    raw.trim().parse().map_err(|e| format!("expected a whole number: {e}"))
}
