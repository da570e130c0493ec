//! Batch run models
//!
//! Wire types for batch runs executed on the TestLab server.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Server-reported state of a batch run
///
/// `Running` is the only non-terminal value. Anything the server reports
/// outside the five known states is carried as `Unknown` so the caller can
/// decide how hard to fail; deserialization itself never rejects a status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
    Unresolved,
    Aborted,
    Unknown(String),
}

impl RunStatus {
    /// Parse a wire status string
    pub fn from_wire(s: &str) -> Self {
        match s {
            "running" => RunStatus::Running,
            "succeeded" => RunStatus::Succeeded,
            "failed" => RunStatus::Failed,
            "unresolved" => RunStatus::Unresolved,
            "aborted" => RunStatus::Aborted,
            other => RunStatus::Unknown(other.to_string()),
        }
    }

    /// True for every state except `Running`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl<'de> Deserialize<'de> for RunStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(RunStatus::from_wire(&s))
    }
}

impl Default for RunStatus {
    fn default() -> Self {
        RunStatus::Running
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Unresolved => write!(f, "unresolved"),
            RunStatus::Aborted => write!(f, "aborted"),
            RunStatus::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// Per-run test case counters
///
/// Counters only grow until the run is terminal. `total` is fixed at launch.
/// Aborted runs may finish with `finished() < total`; that is accepted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestCaseCounts {
    #[serde(default)]
    pub succeeded: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub aborted: u64,
    // Older servers did not report unresolved counts at all.
    #[serde(default)]
    pub unresolved: u64,
    #[serde(default)]
    pub total: u64,
}

impl TestCaseCounts {
    /// Number of test cases that reached any terminal outcome
    pub fn finished(&self) -> u64 {
        self.succeeded + self.failed + self.aborted + self.unresolved
    }
}

/// One batch run executed on the server
#[derive(Clone, Debug, Deserialize)]
pub struct BatchRun {
    /// Human-facing result page link
    #[serde(default)]
    pub url: String,
    /// Current server-reported state
    #[serde(default)]
    pub status: RunStatus,
    /// Stable identifier used to re-fetch status
    pub batch_run_number: u64,
    #[serde(default)]
    pub test_cases: TestCaseCounts,
}

/// Wrapper shape returned by the cross batch run endpoint
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BatchRunList {
    #[serde(default)]
    pub batch_runs: Vec<BatchRun>,
}

/// Response shape of the file upload endpoint
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct UploadedFile {
    pub file_no: u64,
}
