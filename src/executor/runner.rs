//! Batch run execution
//!
//! Launches batch runs and polls them to a terminal state, one run at a
//! time in launch order, under a shared time budget.

use std::time::Duration;
use tracing::{info, warn};

use crate::api::RunTransport;
use crate::executor::{ExecutorError, RunOutcome};
use crate::models::{BatchRun, RunStatus};
use crate::output::ProgressSink;
use crate::settings;

/// Default wait budget per test case when no wait limit is given
const BUDGET_PER_TEST: Duration = Duration::from_secs(10 * 60);

/// Polling cadence and time budget
#[derive(Clone, Copy, Debug)]
pub struct PollPolicy {
    /// Poll interval while the loop is young
    pub initial_interval: Duration,
    /// Poll interval once `backoff_threshold` has elapsed
    pub steady_interval: Duration,
    /// Elapsed time at which polling switches to the steady interval
    pub backoff_threshold: Duration,
    /// Overall budget; zero means "derive from the group's test count"
    pub wait_limit: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(10),
            steady_interval: Duration::from_secs(60),
            backoff_threshold: Duration::from_secs(120),
            wait_limit: Duration::ZERO,
        }
    }
}

impl PollPolicy {
    /// Set an explicit wait limit in seconds (0 keeps the derived budget)
    pub fn with_wait_limit_secs(mut self, secs: u64) -> Self {
        self.wait_limit = Duration::from_secs(secs);
        self
    }

    /// Budget for a group with the given total test count
    fn budget_for(&self, total_test_count: u64) -> Duration {
        if self.wait_limit.is_zero() {
            BUDGET_PER_TEST * total_test_count as u32
        } else {
            self.wait_limit
        }
    }

    /// Interval to sleep after the given elapsed time
    fn interval_at(&self, elapsed: Duration) -> Duration {
        if elapsed < self.backoff_threshold {
            self.initial_interval
        } else {
            self.steady_interval
        }
    }
}

/// Drives batch runs from launch to aggregate outcome
pub struct BatchRunExecutor<'a, T> {
    transport: T,
    sink: &'a dyn ProgressSink,
    policy: PollPolicy,
}

impl<'a, T: RunTransport + Sync> BatchRunExecutor<'a, T> {
    pub fn new(transport: T, sink: &'a dyn ProgressSink) -> Self {
        Self {
            transport,
            sink,
            policy: PollPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start batch run(s) and wait for completion with progress output.
    ///
    /// With `wait_for_result` false, returns right after printing the
    /// result page URLs. A failed status fetch gives up on that run only;
    /// an exhausted time budget abandons the whole group.
    pub async fn execute(
        &self,
        settings_number: u64,
        setting: &str,
        wait_for_result: bool,
    ) -> Result<RunOutcome, ExecutorError> {
        let resolved = settings::resolve(settings_number, setting)?;
        info!(
            is_group = resolved.is_group,
            "starting batch run with payload {}", resolved.payload
        );

        let mut runs = self
            .transport
            .start_batch_run(&resolved.payload, resolved.is_group)
            .await
            .map_err(ExecutorError::Launch)?;

        self.sink.line("test result page:");
        let mut group_total = 0u64;
        for run in &runs {
            self.sink.line(&run.url);
            group_total += run.test_cases.total;
        }

        if !wait_for_result {
            return Ok(RunOutcome::default());
        }

        let budget = self.policy.budget_for(group_total);
        // One elapsed counter for the whole group, advanced by the slept
        // interval and never reset between runs.
        let mut elapsed = Duration::ZERO;
        let mut outcome = RunOutcome::default();

        for index in 0..runs.len() {
            let run_number = runs[index].batch_run_number;
            self.sink.line(&format!(
                "\n#{run_number} wait until {} tests to be finished.. ",
                runs[index].test_cases.total
            ));
            let mut prev_finished = 0u64;

            loop {
                match self.transport.get_batch_run(run_number).await {
                    Ok(fresh) => runs[index] = fresh,
                    Err(err) => {
                        // One unreachable run does not stop the rest of the
                        // group from being polled.
                        self.sink.line(&err.to_string());
                        warn!("giving up waiting on batch run #{run_number}: {err}");
                        outcome.has_error = true;
                        break;
                    }
                }

                let run = &runs[index];
                self.sink.dot();

                let finished = run.test_cases.finished();
                if finished != prev_finished {
                    self.sink.line(&progress_line(run));
                    prev_finished = finished;
                }

                if run.status.is_terminal() {
                    if run.test_cases.unresolved > 0 {
                        outcome.has_unresolved = true;
                    }
                    match &run.status {
                        RunStatus::Succeeded => self.sink.line("batch run succeeded"),
                        RunStatus::Failed => {
                            self.sink.line(&failed_line(run));
                            outcome.has_error = true;
                        }
                        RunStatus::Unresolved => self.sink.line(&format!(
                            "batch run unresolved ({} unresolved)",
                            run.test_cases.unresolved
                        )),
                        RunStatus::Aborted => {
                            self.sink.line("batch run aborted");
                            outcome.has_error = true;
                        }
                        RunStatus::Unknown(status) => {
                            // The server is authoritative; mapping an
                            // unrecognized status to success or failure
                            // would be a guess.
                            panic!(
                                "server reported unknown status {status:?} for batch run #{run_number}"
                            );
                        }
                        RunStatus::Running => unreachable!("running is not terminal"),
                    }
                    break;
                }

                if elapsed > budget {
                    return Err(ExecutorError::NeverFinished { waited: elapsed });
                }
                let interval = self.policy.interval_at(elapsed);
                tokio::time::sleep(interval).await;
                elapsed += interval;
            }
        }

        Ok(outcome)
    }
}

/// Progress line for a changed finished count, e.g. `5/8 finished (1 failed)`
fn progress_line(run: &BatchRun) -> String {
    let counts = &run.test_cases;
    let mut breakdown = String::new();
    if counts.failed > 0 {
        breakdown.push_str(&format!("{} failed", counts.failed));
    }
    if counts.unresolved > 0 {
        if !breakdown.is_empty() {
            breakdown.push_str(", ");
        }
        breakdown.push_str(&format!("{} unresolved", counts.unresolved));
    }
    if breakdown.is_empty() {
        format!("{}/{} finished", counts.finished(), counts.total)
    } else {
        format!("{}/{} finished ({breakdown})", counts.finished(), counts.total)
    }
}

/// Terminal line for a failed run
fn failed_line(run: &BatchRun) -> String {
    let counts = &run.test_cases;
    if counts.failed == 0 {
        "batch run failed".to_string()
    } else if counts.unresolved > 0 {
        format!(
            "batch run failed ({} failed, {} unresolved)",
            counts.failed, counts.unresolved
        )
    } else {
        format!("batch run failed ({} failed)", counts.failed)
    }
}
