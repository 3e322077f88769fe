//! Service settings.
//!
//! Sources, later ones winning: built-in defaults, `config/default.toml`,
//! `config/{RUN_ENV}.toml`, then `APP__*` environment variables
//! (`APP__DATABASE_URL`, `APP__PORT`, ...).

use std::env;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};
use validator::{Validate, ValidationError};

const CONFIG_DIR: &str = "config";
const DEFAULT_PROFILE: &str = "development";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    #[validate(range(min = 1))]
    pub port: u16,
    /// Profile name; `production` disables statement logging.
    pub environment: String,

    #[validate(custom = "validate_log_level")]
    pub log_level: String,
    /// Emit logs as JSON lines.
    pub log_json: bool,
    /// Apply pending migrations before serving.
    pub auto_migrate: bool,

    #[validate(range(min = 1))]
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_connect_timeout_secs: u64,
    pub db_idle_timeout_secs: u64,
    pub db_acquire_timeout_secs: u64,

    /// Buffer of the in-process domain event channel.
    #[validate(custom = "validate_nonzero_capacity")]
    pub event_channel_capacity: usize,

    #[validate(range(min = 1))]
    pub api_default_page_size: u64,
    #[validate(range(min = 1, max = 1000))]
    pub api_max_page_size: u64,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://procurement.db?mode=rwc".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: DEFAULT_PROFILE.to_string(),
            log_level: "info".to_string(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: 10,
            db_min_connections: 1,
            db_connect_timeout_secs: 30,
            db_idle_timeout_secs: 600,
            db_acquire_timeout_secs: 8,
            event_channel_capacity: 1024,
            api_default_page_size: 20,
            api_max_page_size: 100,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            ..Self::default()
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Page size for a list request: the default when none is asked for,
    /// never below 1 or above `api_max_page_size`.
    pub fn page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.api_default_page_size)
            .clamp(1, self.api_max_page_size.max(1))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Error, Debug)]
pub enum AppConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    if LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        return Ok(());
    }
    let mut err = ValidationError::new("log_level");
    err.message = Some(format!("expected one of {}", LOG_LEVELS.join(", ")).into());
    Err(err)
}

fn validate_nonzero_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity > 0 {
        Ok(())
    } else {
        Err(ValidationError::new("event_channel_capacity"))
    }
}

/// Installs the global subscriber. `RUST_LOG`, when set, replaces the
/// crate-level default built from `level`.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let directives = env::var("RUST_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| format!("practice_procurement={level},tower_http=info"));

    let builder = fmt().with_env_filter(EnvFilter::new(directives));
    // A second call (tests) keeps the first subscriber.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    let profile = env::var("RUN_ENV").unwrap_or_else(|_| DEFAULT_PROFILE.to_string());
    if !config_dir.is_dir() {
        warn!(dir = %config_dir.display(), "No config directory; using defaults and APP__ variables");
    }

    let base = config_dir.join("default");
    let overlay = config_dir.join(&profile);
    let settings = Config::builder()
        .set_default("environment", profile.as_str())?
        .add_source(File::from(base).required(false))
        .add_source(File::from(overlay).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let cfg: AppConfig = settings.try_deserialize()?;
    if let Err(errors) = cfg.validate() {
        error!(%errors, "Rejected configuration");
        return Err(errors.into());
    }

    info!(profile = %profile, environment = %cfg.environment, "Configuration loaded");
    Ok(cfg)
}
