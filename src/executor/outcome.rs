//! Batch run outcome aggregation
//!
//! Collapses heterogeneous per-run results into the two flags the exit
//! code is derived from.

use std::time::Duration;
use thiserror::Error;

use crate::api::ApiError;
use crate::settings::SettingsError;

/// Errors that abort the whole batch run operation
#[derive(Error, Debug)]
pub enum ExecutorError {
    /// Selector/setting validation failed; no network call was made
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The start request failed; no runs were launched
    #[error(transparent)]
    Launch(ApiError),

    /// The shared time budget ran out before every run finished
    #[error("batch run never finished (waited {}s)", .waited.as_secs())]
    NeverFinished { waited: Duration },
}

/// Aggregate outcome of a batch run operation
///
/// `has_error` wins over `has_unresolved` in the exit code mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Any run failed or aborted, or a status fetch was given up on
    pub has_error: bool,
    /// Any run finished with unresolved test cases left over
    pub has_unresolved: bool,
}

impl RunOutcome {
    /// Process exit code: 0 clean, 1 error, 2 unresolved without error
    pub fn exit_code(&self) -> i32 {
        if self.has_error {
            1
        } else if self.has_unresolved {
            2
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_mapping() {
        let clean = RunOutcome::default();
        assert_eq!(clean.exit_code(), 0);

        let unresolved = RunOutcome {
            has_error: false,
            has_unresolved: true,
        };
        assert_eq!(unresolved.exit_code(), 2);

        let error = RunOutcome {
            has_error: true,
            has_unresolved: false,
        };
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn error_wins_over_unresolved() {
        let both = RunOutcome {
            has_error: true,
            has_unresolved: true,
        };
        assert_eq!(both.exit_code(), 1);
    }
}
