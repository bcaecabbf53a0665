//! Middleware module
//!
//! This module contains the update pipeline and the steps that run in it

pub mod logging;
pub mod pipeline;
pub mod session;

// Re-export commonly used middleware
pub use logging::LoggingMiddleware;
pub use pipeline::{handler, Handler, Middleware, Next, Pipeline};
pub use session::{default_session_key, SessionMiddleware};
