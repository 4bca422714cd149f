//! Sequential test execution
//!
//! Runs test classes one after the other. Every class runs even after a
//! failure; the result is the AND of all of them.

use chrono::Utc;
use std::time::Duration;
use tracing::info;

use crate::config::XltPaths;
use crate::error::XltResult;
use crate::files::find_test_case_classes;
use crate::invoker::Invoker;
use crate::models::{ItemOutcome, ParamOverride, RunParams, RunSummary};

use super::pool::{build_work_items, run_item};

/// Runs test classes sequentially
pub struct TestRunner<I> {
    invoker: I,
    paths: XltPaths,
    timeout: Option<Duration>,
}

impl<I: Invoker> TestRunner<I> {
    pub fn new(invoker: I, paths: XltPaths) -> Self {
        Self {
            invoker,
            paths,
            timeout: None,
        }
    }

    /// Kill and fail classes that run longer than `secs`; 0 disables
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// Run one class by fully qualified name, e.g. `tests.TSearch`
    pub async fn run_test(&self, target: &str, params: &RunParams) -> ItemOutcome {
        info!("Running {}", target);
        run_item(&self.invoker, target, params, self.timeout).await
    }

    /// Run every compiled test case one after the other
    pub async fn run_all(&self, overrides: &[ParamOverride]) -> XltResult<RunSummary> {
        let started_at = Utc::now();
        let items = build_work_items(find_test_case_classes(&self.paths)?, overrides)?;

        info!("Running {} test case(s) sequentially", items.len());

        let mut outcomes = Vec::with_capacity(items.len());
        for item in &items {
            let target = item.target_name(self.paths.classes_dir_name());
            let outcome = self.run_test(&target, &item.params).await;
            info!("  {}", outcome);
            outcomes.push(outcome);
        }

        let peak = usize::from(!outcomes.is_empty());
        Ok(RunSummary::new(started_at, 1, peak, outcomes))
    }
}
