//! Error handling for SceneBridge
//!
//! This module defines the main error type used throughout the bridge
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for SceneBridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Session database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session is not available for this update (is the session middleware registered?)")]
    SessionUnavailable,

    #[error("Scene stage is not attached to this update (is the stage middleware registered?)")]
    StageUnavailable,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Handler failed: {0}")]
    Handler(String),
}

/// Result type alias for SceneBridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl From<config::ConfigError> for BridgeError {
    fn from(err: config::ConfigError) -> Self {
        BridgeError::Config(err.to_string())
    }
}

impl BridgeError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            BridgeError::Telegram(_) => true,
            BridgeError::Redis(_) => true,
            BridgeError::Database(_) => true,
            BridgeError::Config(_) => false,
            BridgeError::SessionUnavailable => false,
            BridgeError::StageUnavailable => false,
            BridgeError::Serialization(_) => false,
            BridgeError::Io(_) => true,
            BridgeError::UrlParse(_) => false,
            BridgeError::InvalidInput(_) => false,
            BridgeError::Handler(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BridgeError::Config(_) => ErrorSeverity::Critical,
            BridgeError::SessionUnavailable | BridgeError::StageUnavailable => ErrorSeverity::Critical,
            BridgeError::Redis(_) | BridgeError::Database(_) => ErrorSeverity::Critical,
            BridgeError::Telegram(_) => ErrorSeverity::Warning,
            BridgeError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_and_recovery() {
        assert_eq!(BridgeError::SessionUnavailable.severity(), ErrorSeverity::Critical);
        assert_eq!(BridgeError::InvalidInput("x".into()).severity(), ErrorSeverity::Info);
        assert_eq!(BridgeError::Handler("boom".into()).severity(), ErrorSeverity::Error);
        assert!(!BridgeError::Handler("boom".into()).is_recoverable());
        assert_eq!(ErrorSeverity::Warning.to_string(), "WARN");
    }
}
