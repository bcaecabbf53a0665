//! Logging middleware
//!
//! This module provides the pipeline step that traces every update: a
//! per-update request id span, timing, slow update warnings and error
//! context.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::LoggingConfig;
use crate::models::Update;
use crate::state::UpdateContext;
use crate::utils::errors::{ErrorSeverity, Result};
use crate::utils::helpers::{generate_uuid, truncate_text};
use super::pipeline::{Middleware, Next};

/// Logging middleware for bot interactions
#[derive(Debug, Clone)]
pub struct LoggingMiddleware {
    log_updates: bool,
    slow_threshold: Duration,
}

impl LoggingMiddleware {
    /// Create a new LoggingMiddleware instance
    pub fn new(log_updates: bool, slow_threshold: Duration) -> Self {
        Self {
            log_updates,
            slow_threshold,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.log_updates, Duration::from_millis(config.slow_update_ms))
    }

    /// Log incoming update
    fn log_update(&self, update: &Update) {
        if !self.log_updates {
            return;
        }

        match (update.callback_data(), update.text()) {
            (Some(data), _) => info!(
                user_id = update.user_id(),
                chat_id = update.chat_id(),
                callback_data = data,
                "Callback query received"
            ),
            (None, Some(text)) => info!(
                user_id = update.user_id(),
                chat_id = update.chat_id(),
                text = %truncate_text(text, 64),
                "Text message received"
            ),
            (None, None) => debug!(
                user_id = update.user_id(),
                chat_id = update.chat_id(),
                "Other update type received"
            ),
        }
    }

    /// Log performance metrics
    fn log_performance(&self, duration: Duration, success: bool) {
        let duration_ms = duration.as_millis() as u64;

        if success {
            debug!(duration_ms = duration_ms, "Update processed");
        } else {
            warn!(duration_ms = duration_ms, "Update processing failed");
        }

        if duration > self.slow_threshold {
            warn!(
                duration_ms = duration_ms,
                threshold_ms = self.slow_threshold.as_millis() as u64,
                "Slow update detected"
            );
        }
    }
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self::new(true, Duration::from_millis(1000))
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(&self, ctx: &mut UpdateContext, next: Next<'_>) -> Result<()> {
        let span = info_span!(
            "update",
            request_id = %generate_uuid(),
            update_id = ctx.update().update_id,
            kind = %ctx.update().kind
        );

        async move {
            self.log_update(ctx.update());
            let started = Instant::now();

            let result = next.run(ctx).await;
            self.log_performance(started.elapsed(), result.is_ok());

            if let Err(e) = &result {
                match e.severity() {
                    ErrorSeverity::Critical | ErrorSeverity::Error => error!(
                        error = %e,
                        severity = %e.severity(),
                        user_id = ctx.update().user_id(),
                        "Error while processing update"
                    ),
                    _ => warn!(
                        error = %e,
                        severity = %e.severity(),
                        user_id = ctx.update().user_id(),
                        "Error while processing update"
                    ),
                }
            }
            result
        }
        .instrument(span)
        .await
    }
}
