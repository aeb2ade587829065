//! Shared utilities for Splitline.

pub mod logging;
pub mod time;

pub use logging::{init_logging, LogFormat, LoggingError};
pub use time::elapsed_ms;
