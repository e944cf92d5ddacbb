use clap::{Args, ValueEnum};
use std::path::PathBuf;

#[derive(Clone, Debug, Default, Args)]
pub struct Config {
    #[command(flatten)]
    pub api: ApiConfig,

    #[command(flatten)]
    pub storage: StorageConfig,

    #[command(flatten)]
    pub dashboard: DashboardConfig,

    #[command(flatten)]
    pub inventory: InventoryConfig,

    #[command(flatten)]
    pub ui: UiConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ApiConfig {
    /// Base URL of the Invento API, including the `/api` prefix
    #[arg(long, env = "INVENTO_API_URL", default_value = "http://localhost:8000/api")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "INVENTO_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct StorageConfig {
    /// File holding persisted client state (tokens, cached profile, theme)
    #[arg(long, env = "INVENTO_STATE_FILE", default_value = ".invento/state.json")]
    pub state_file: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct DashboardConfig {
    /// How often the dashboard is re-fetched in watch mode
    #[arg(long, env = "INVENTO_DASHBOARD_REFRESH_SECS", default_value_t = 30)]
    pub refresh_interval_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct InventoryConfig {
    /// Reorder level applied to items that do not carry their own
    #[arg(long, env = "INVENTO_DEFAULT_REORDER_LEVEL", default_value_t = 10)]
    pub default_reorder_level: u32,

    /// Number of rows per inventory page
    #[arg(long, env = "INVENTO_PAGE_SIZE", default_value_t = 25)]
    pub page_size: usize,
}

#[derive(Clone, Debug, Args)]
pub struct UiConfig {
    /// How long a toast stays active, in milliseconds
    #[arg(long, env = "INVENTO_TOAST_DURATION_MS", default_value_t = 4000)]
    pub toast_duration_ms: u64,

    /// Answer yes to every confirmation prompt
    #[arg(long, short = 'y', env = "INVENTO_ASSUME_YES", default_value_t = false)]
    pub assume_yes: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "INVENTO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Default log filter when RUST_LOG is not set
    #[arg(long, env = "INVENTO_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// OTLP gRPC endpoint for traces and metrics (disabled when unset)
    #[arg(long, env = "INVENTO_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { api_url: "http://localhost:8000/api".to_string(), request_timeout_secs: 30 }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self { default_reorder_level: 10, page_size: 25 }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { toast_duration_ms: 4000, assume_yes: false }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { refresh_interval_secs: 30 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { state_file: PathBuf::from(".invento/state.json") }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { log_format: LogFormat::Text, log_level: "warn".to_string(), otlp_endpoint: None }
    }
}
