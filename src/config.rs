use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::info;
use validator::Validate;

use crate::errors::ServiceError;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_APP_BASE_URL: &str = "http://localhost:8080";

/// How approval actions are routed to managers.
///
/// The original system carried both behaviors implicitly; here it is an
/// explicit deployment choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRouting {
    /// Only the manager configured for the request's cost center (or an
    /// admin) may approve or reject it.
    PerCostCenter,
    /// Any manager-role actor may approve or reject any pending request.
    AnyManager,
}

impl Default for ApprovalRouting {
    fn default() -> Self {
        Self::PerCostCenter
    }
}

/// SMTP settings for the notifier.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: String,
    #[validate(email)]
    pub from_email: String,
    #[serde(default)]
    pub from_name: String,
    /// Fixed recipient for release notifications.
    #[validate(email)]
    pub warehouse_email: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from_email: "warranty@example.com".to_string(),
            from_name: "Warranty Parts".to_string(),
            warehouse_email: "warehouse@example.com".to_string(),
        }
    }
}

/// Application configuration, layered from `config/default.toml`,
/// `config/<environment>.toml` and `APP_*` environment variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL (PostgreSQL or SQLite).
    #[validate(length(min = 1))]
    pub database_url: String,

    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging).
    #[serde(default)]
    pub log_json: bool,

    /// Run migrations on startup.
    #[serde(default)]
    pub auto_migrate: bool,

    /// Base URL used in notification links.
    #[serde(default = "default_app_base_url")]
    pub app_base_url: String,

    #[serde(default)]
    pub approval_routing: ApprovalRouting,

    #[serde(default)]
    #[validate]
    pub smtp: SmtpConfig,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_app_base_url() -> String {
    DEFAULT_APP_BASE_URL.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl AppConfig {
    /// Loads configuration for the environment named by `APP_ENVIRONMENT`
    /// (defaulting to `development`).
    pub fn load() -> Result<Self, ServiceError> {
        let environment =
            env::var("APP_ENVIRONMENT").unwrap_or_else(|_| DEFAULT_ENV.to_string());

        let mut builder = Config::builder()
            .set_default("environment", environment.clone())
            .map_err(|e| ServiceError::ConfigError(e.to_string()))?;

        let default_path = Path::new(CONFIG_DIR).join("default.toml");
        builder = builder.add_source(File::from(default_path).required(false));

        let env_path = Path::new(CONFIG_DIR).join(format!("{environment}.toml"));
        builder = builder.add_source(File::from(env_path).required(false));

        builder = builder.add_source(Environment::with_prefix("APP").separator("__"));

        let config: AppConfig = builder
            .build()
            .map_err(|e| ServiceError::ConfigError(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ServiceError::ConfigError(e.to_string()))?;

        config
            .validate()
            .map_err(|e| ServiceError::ConfigError(e.to_string()))?;

        info!(environment = %config.environment, "Configuration loaded");
        Ok(config)
    }
}

/// Initializes the global tracing subscriber from the configured level,
/// honoring `RUST_LOG` when set.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}
