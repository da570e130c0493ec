//! Output module
//!
//! Progress reporting for batch run polling.

mod progress;

pub use progress::{ConsoleSink, MemorySink, ProgressSink};
