//! Batch run execution engine
//!
//! Launch, polling, and outcome aggregation for batch runs.

mod outcome;
mod runner;

pub use outcome::{ExecutorError, RunOutcome};
pub use runner::{BatchRunExecutor, PollPolicy};
