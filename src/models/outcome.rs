//! Run outcome models
//!
//! Per-item outcomes and the summary of one scheduling run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome status of a single test class invocation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pass,
    Fail,
    Error,
    Timeout,
}

impl ItemStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            ItemStatus::Pass => "✓",
            ItemStatus::Fail => "✗",
            ItemStatus::Error => "!",
            ItemStatus::Timeout => "⧗",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemStatus::Pass)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Pass => write!(f, "PASS"),
            ItemStatus::Fail => write!(f, "FAIL"),
            ItemStatus::Error => write!(f, "ERROR"),
            ItemStatus::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// Result of a single test class invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ItemOutcome {
    pub target: String,
    pub status: ItemStatus,
    pub duration_ms: u64,
    pub message: Option<String>,
}

impl ItemOutcome {
    pub fn pass(target: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            target: target.into(),
            status: ItemStatus::Pass,
            duration_ms,
            message: None,
        }
    }

    pub fn fail(target: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            target: target.into(),
            status: ItemStatus::Fail,
            duration_ms,
            message: None,
        }
    }

    pub fn error(target: impl Into<String>, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status: ItemStatus::Error,
            duration_ms,
            message: Some(error.into()),
        }
    }

    pub fn timeout(target: impl Into<String>, duration_ms: u64, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            status: ItemStatus::Timeout,
            duration_ms,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.target,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Summary of one scheduling run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub concurrency: usize,
    pub peak_active: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub timeouts: usize,
    /// Wall time from the start of the run until the summary was built
    pub total_duration_ms: u64,
    /// Logical AND of every item result; true for an empty run
    pub success: bool,
    pub outcomes: Vec<ItemOutcome>,
}

impl RunSummary {
    /// Summarise a run that started at `started_at` and has just finished
    pub fn new(
        started_at: DateTime<Utc>,
        concurrency: usize,
        peak_active: usize,
        outcomes: Vec<ItemOutcome>,
    ) -> Self {
        let count = |status: ItemStatus| outcomes.iter().filter(|o| o.status == status).count();

        Self {
            started_at,
            concurrency,
            peak_active,
            total: outcomes.len(),
            passed: count(ItemStatus::Pass),
            failed: count(ItemStatus::Fail),
            errors: count(ItemStatus::Error),
            timeouts: count(ItemStatus::Timeout),
            total_duration_ms: (Utc::now() - started_at).num_milliseconds().max(0) as u64,
            success: outcomes.iter().all(ItemOutcome::is_success),
            outcomes,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run started {} (concurrency {})",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.concurrency
        )?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        for outcome in &self.outcomes {
            writeln!(f, "  {outcome}")?;
        }
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {} | Timeout: {}",
            self.total, self.passed, self.failed, self.errors, self.timeouts
        )?;
        writeln!(
            f,
            "Result: {} | Pass Rate: {:.1}% | Duration: {}ms",
            if self.success { "OK" } else { "FAILED" },
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}
