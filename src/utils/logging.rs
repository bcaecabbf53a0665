//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the bridge.

use std::path::Path;
use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::{BridgeError, Result};

/// Initialize logging based on configuration.
///
/// When a log file is configured the returned guard must be held for the
/// lifetime of the process, otherwise buffered lines are lost on exit.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| BridgeError::Config(format!("Invalid log filter: {}", e)))?;

    let (file_layer, guard) = match config.file_path.as_deref() {
        Some(file_path) => {
            let path = Path::new(file_path);
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "scenebridge.log".into());

            let file_appender = tracing_appender::rolling::daily(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // Exactly one of the stdout layers is active
    let json_layer = config
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stdout));
    let text_layer = (!config.json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BridgeError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log a scene transition
pub fn log_scene_transition(session_key: Option<&str>, from: Option<&str>, to: Option<&str>) {
    info!(
        session_key = session_key,
        from = from,
        to = to,
        "Scene transition"
    );
}

/// Log a session store operation
pub fn log_store_operation(operation: &str, key: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            key = key,
            duration_ms = duration_ms,
            "Session store operation completed"
        );
    } else {
        warn!(
            operation = operation,
            key = key,
            duration_ms = duration_ms,
            "Session store operation failed"
        );
    }
}
