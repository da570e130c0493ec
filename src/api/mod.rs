//! TestLab Web API module
//!
//! HTTP client and the transport seam the executor polls through.

mod client;

pub use client::{ApiClient, ApiError, RunTransport, ScreenshotOptions};
