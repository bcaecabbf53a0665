//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{BridgeError, Result};
use super::{Settings, SessionBackend};

/// Upper bound for configured TTLs (ten years)
pub const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_session_config(&settings.session)?;
    validate_stage_config(&settings.stage)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(BridgeError::Config(
            "Bot token is required".to_string()
        ));
    }

    Ok(())
}

/// Validate session storage configuration
fn validate_session_config(config: &super::SessionConfig) -> Result<()> {
    match config.backend {
        SessionBackend::Memory => {}
        SessionBackend::Redis => {
            if config.redis.url.is_empty() {
                return Err(BridgeError::Config(
                    "Redis URL is required for the redis session backend".to_string()
                ));
            }
            if config.redis.ttl_seconds == Some(0) {
                return Err(BridgeError::Config(
                    "Redis session TTL must be greater than 0".to_string()
                ));
            }
            if config.redis.ttl_seconds.is_some_and(|ttl| ttl > MAX_TTL_SECONDS) {
                return Err(BridgeError::Config(
                    format!("Redis session TTL cannot exceed {} seconds", MAX_TTL_SECONDS)
                ));
            }
        }
        SessionBackend::Sqlite => {
            if config.sqlite_path.is_empty() {
                return Err(BridgeError::Config(
                    "SQLite path is required for the sqlite session backend".to_string()
                ));
            }
        }
    }

    Ok(())
}

/// Validate stage configuration
fn validate_stage_config(config: &super::StageConfig) -> Result<()> {
    if config.ttl_seconds == Some(0) {
        return Err(BridgeError::Config(
            "Scene TTL must be greater than 0".to_string()
        ));
    }

    if config.ttl_seconds.is_some_and(|ttl| ttl > MAX_TTL_SECONDS) {
        return Err(BridgeError::Config(
            format!("Scene TTL cannot exceed {} seconds", MAX_TTL_SECONDS)
        ));
    }

    if matches!(config.default_scene.as_deref(), Some("")) {
        return Err(BridgeError::Config(
            "Default scene id cannot be empty".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(BridgeError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(BridgeError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
