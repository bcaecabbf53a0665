//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub session: SessionConfig,
    pub stage: StageConfig,
    pub logging: LoggingConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
}

/// Which store keeps the sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Memory,
    Redis,
    Sqlite,
}

/// Session storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    pub backend: SessionBackend,
    pub redis: RedisConfig,
    pub sqlite_path: String,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    /// Key expiry applied on every write; `None` keeps sessions forever
    pub ttl_seconds: Option<u64>,
}

/// Scene stage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StageConfig {
    /// Default lifetime of an entered scene
    pub ttl_seconds: Option<u64>,
    /// Scene treated as current when the session names none
    pub default_scene: Option<String>,
    /// Scene probed right after the current one for callback data
    pub entry_scene: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
    pub log_updates: bool,
    pub slow_update_ms: u64,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("SCENEBRIDGE").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::BridgeError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
            },
            session: SessionConfig {
                backend: SessionBackend::Memory,
                redis: RedisConfig {
                    url: "redis://localhost:6379".to_string(),
                    prefix: "scenebridge:".to_string(),
                    ttl_seconds: None,
                },
                sqlite_path: "sessions.db".to_string(),
            },
            stage: StageConfig {
                ttl_seconds: None,
                default_scene: None,
                entry_scene: Some("greeter".to_string()),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                json: false,
                log_updates: true,
                slow_update_ms: 1000,
            },
        }
    }
}
