//! Library surface of the TestLab API client
//!
//! The binary in `main.rs` wires these modules to the CLI; integration
//! tests drive them directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod executor;
pub mod models;
pub mod output;
pub mod settings;
pub mod upload;
pub mod utils;
