//! Data models for XLT test runs
//!
//! Work items fed to the scheduler and the outcomes it reports.

mod outcome;
mod work_item;

pub use outcome::{ItemOutcome, ItemStatus, RunSummary};
pub use work_item::{apply_overrides, ParamOverride, RunParams, WorkItem};
