//! Logging utilities
//!
//! Provides logging configuration for the CLI.

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Log level for the given verbosity flag
fn level_for(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Initialize the logger
///
/// Progress output goes to stdout separately; logging stays on stderr so
/// the two streams can be consumed independently in CI.
pub fn init_logger(verbose: bool) {
    let filter = EnvFilter::new(format!("testlab_api_client={}", level_for(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
