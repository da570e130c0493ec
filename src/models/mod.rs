//! Data models for the TestLab API
//!
//! This module contains the wire types shared across the application.

mod batch_run;

pub use batch_run::{BatchRun, BatchRunList, RunStatus, TestCaseCounts, UploadedFile};
