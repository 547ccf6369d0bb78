use crate::scraper::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    pub discovery: DiscoveryConfig,
    pub breakdown: BreakdownConfig,
    #[serde(default)]
    pub dates: DateConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Base used to complete relative hrefs.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    /// Extra attempts on transient failures. 0 means a failed fetch fails the caller.
    #[serde(default)]
    pub max_retries: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Index page: where the "All Contests" links live
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscoveryConfig {
    pub index_url: String,
    pub heading_selector: String,
    pub heading_text: String,
    pub link_tag: String,
    pub link_class: String,
    pub name_prefix: String,
    pub female_markers: Vec<String>,
}

/// Group pages, tour detail pages and classics tables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BreakdownConfig {
    pub container_class: String,
    pub tour_marker_class: String,
    pub womens_classics_marker: String,
    pub noise_tokens: Vec<String>,
    pub male_tour_rename: RenameRule,
    pub female_tour_rename: RenameRule,
    pub link_class: String,
    /// 1-indexed position of the start-date `span` inside a tour container.
    pub start_date_span: usize,
    pub tour_date_format: String,
    pub classic_date_format: String,
    pub detail_suffix: String,
    pub stages_table_class: String,
    pub stage_exclude_markers: Vec<String>,
    pub grand_tour_stages: u32,
    pub grand_tour_rest_days: u32,
    pub classic_columns: ClassicColumns,
}

/// `from` may carry the `@yyyy@` marker; the matched year is re-inserted into `to`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RenameRule {
    pub from: String,
    pub to: String,
}

/// 0-indexed cell positions in the classics table
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClassicColumns {
    pub ordinal: usize,
    pub date: usize,
    pub name: usize,
    pub category: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DateConfig {
    #[serde(default = "default_generic_format")]
    pub generic_format: String,

    /// Year used to complete "14 August"-style dates. Current year when unset.
    #[serde(default)]
    pub season_year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_true")]
    pub fail_fast: bool,

    #[serde(default = "default_true")]
    pub expand_spawned: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

/// Log file sink. The console sink always exists.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub file_output: bool,

    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,

    /// Level for `velo_calendar` events in the log file.
    #[serde(default = "default_file_level")]
    pub file_level: String,

    /// Console level when neither `-v` nor `RUST_LOG` is given.
    #[serde(default = "default_console_level")]
    pub console_level: String,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Rotated files kept on disk; 0 keeps them all.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_base_url() -> String {
    "https://www.velogames.com/".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    500
}
fn default_jitter_ms() -> u64 {
    250
}
fn default_user_agent() -> String {
    "velo-calendar/0.1 (season calendar sync)".to_string()
}
fn default_generic_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}
fn default_db_path() -> PathBuf {
    PathBuf::from("data/calendar.duckdb")
}
fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
fn default_file_level() -> String {
    "debug".to_string()
}
fn default_console_level() -> String {
    "info".to_string()
}
fn default_max_files() -> usize {
    10
}
fn default_true() -> bool {
    true
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            max_retries: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            generic_format: default_generic_format(),
            season_year: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fail_fast: true,
            expand_spawned: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            run_migrations: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_output: true,
            dir: default_log_dir(),
            file_level: default_file_level(),
            console_level: default_console_level(),
            rotation: LogRotation::default(),
            max_files: default_max_files(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides.
    ///
    /// `discovery` and `breakdown` have no defaults: a missing key fails here
    /// instead of surfacing mid-run.
    pub fn load() -> Result<Self, ScrapeError> {
        dotenv::dotenv().ok();

        let builder = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("VELO").separator("__"));

        Self::from_builder(builder)
    }

    /// Parse a TOML document, without files or environment.
    pub fn from_toml_str(toml: &str) -> Result<Self, ScrapeError> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml));
        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ScrapeError> {
        let app_cfg: AppConfig = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(config_error)?;
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    fn validate(&self) -> Result<(), ScrapeError> {
        if self.breakdown.start_date_span == 0 {
            return Err(ScrapeError::configuration(
                "breakdown.start_date_span",
                "positions are 1-indexed, 0 is not a valid span",
            ));
        }
        if self.breakdown.grand_tour_stages == 0 {
            return Err(ScrapeError::configuration(
                "breakdown.grand_tour_stages",
                "a grand tour needs at least one stage",
            ));
        }
        for (key, value) in [
            ("discovery.index_url", &self.discovery.index_url),
            ("breakdown.container_class", &self.breakdown.container_class),
            ("breakdown.tour_marker_class", &self.breakdown.tour_marker_class),
            ("breakdown.tour_date_format", &self.breakdown.tour_date_format),
            ("breakdown.classic_date_format", &self.breakdown.classic_date_format),
            ("dates.generic_format", &self.dates.generic_format),
        ] {
            if value.trim().is_empty() {
                return Err(ScrapeError::configuration(key, "must not be empty"));
            }
        }
        for (key, level) in [
            ("logging.file_level", &self.logging.file_level),
            ("logging.console_level", &self.logging.console_level),
        ] {
            if level.parse::<LevelFilter>().is_err() {
                return Err(ScrapeError::configuration(
                    key,
                    format!("`{level}` is not a log level"),
                ));
            }
        }
        Ok(())
    }

    /// Two-level `section.key` lookup over the effective configuration.
    ///
    /// Strings come back verbatim, anything else as its JSON rendering.
    /// Unset optional values (`null`) count as missing.
    pub fn value(&self, section: &str, key: &str) -> Option<String> {
        let tree = serde_json::to_value(self).ok()?;
        match tree.get(section)?.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn config_error(err: config::ConfigError) -> ScrapeError {
    let key = match &err {
        config::ConfigError::NotFound(key) => key.clone(),
        config::ConfigError::Type { key: Some(key), .. } => key.clone(),
        _ => "config".to_string(),
    };
    ScrapeError::configuration(key, err.to_string())
}

#[cfg(test)]
pub(crate) fn sample() -> AppConfig {
    let mut cfg = AppConfig::from_toml_str(include_str!("../../config/default.toml"))
        .expect("shipped config/default.toml must load");
    cfg.dates.season_year = Some(2024);
    cfg.http.request_delay_ms = 0;
    cfg.http.jitter_ms = 0;
    cfg
}
