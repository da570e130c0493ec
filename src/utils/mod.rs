//! Utility module
//!
//! Shared helpers used across the application.

mod logger;

pub use logger::init_logger;
