//! Test helpers module
//!
//! This module provides a recording `BotApi` and a pipeline harness that
//! runs updates through session, stage and fallback the way the binary does.

#![allow(dead_code)]

pub mod recording_api;
pub mod test_context;

pub use recording_api::*;
pub use test_context::*;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (called once)
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}
