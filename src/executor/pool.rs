//! Bounded process pool
//!
//! Runs a backlog of test classes with at most `limit` JVMs alive at once and
//! folds their results into a single pass/fail.
//!
//! Each run owns its backlog and counters. `min(limit, n)` workers pop items
//! off the shared backlog until it is empty and post one outcome per item to
//! the collector. The run is over once every worker has exited, which means
//! the backlog is drained and nothing is in flight.

use chrono::Utc;
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::XltPaths;
use crate::error::{XltError, XltResult};
use crate::files::find_test_case_classes;
use crate::invoker::Invoker;
use crate::models::{apply_overrides, ItemOutcome, ParamOverride, RunParams, RunSummary, WorkItem};
use crate::utils::Timer;

/// Number of processing units on this host, at least 1
pub fn host_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Concurrency limit for a run; `None` means host parallelism
pub fn effective_limit(limit: Option<usize>) -> usize {
    match limit {
        Some(n) => n.max(1),
        None => host_parallelism(),
    }
}

/// Build work items from class files, applying pattern overrides in order
pub fn build_work_items(
    classes: impl IntoIterator<Item = PathBuf>,
    overrides: &[ParamOverride],
) -> XltResult<Vec<WorkItem>> {
    let mut items: Vec<WorkItem> = classes
        .into_iter()
        .map(|p| WorkItem::new(p.to_string_lossy()))
        .collect();
    apply_overrides(&mut items, overrides)?;
    Ok(items)
}

/// Run one target, killing it after `timeout`, and classify the result
pub(super) async fn run_item<I: Invoker + ?Sized>(
    invoker: &I,
    target: &str,
    params: &RunParams,
    timeout: Option<Duration>,
) -> ItemOutcome {
    let timer = Timer::start(target);

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, invoker.run(target, params)).await {
            Ok(result) => result,
            Err(_) => Err(XltError::Timeout {
                target: target.to_string(),
                secs: limit.as_secs(),
            }),
        },
        None => invoker.run(target, params).await,
    };

    let elapsed = timer.stop().as_millis() as u64;
    match result {
        Ok(true) => ItemOutcome::pass(target, elapsed),
        Ok(false) => ItemOutcome::fail(target, elapsed),
        Err(e @ XltError::Timeout { .. }) => {
            warn!("{}", e);
            ItemOutcome::timeout(target, elapsed, e.to_string())
        }
        Err(e) => {
            error!("{}: {}", target, e);
            ItemOutcome::error(target, elapsed, e.to_string())
        }
    }
}

/// State of one scheduling run
struct RunState {
    backlog: Mutex<Vec<WorkItem>>,
    active: AtomicUsize,
    peak: AtomicUsize,
    aggregate: AtomicBool,
}

impl RunState {
    fn new(items: Vec<WorkItem>) -> Self {
        Self {
            backlog: Mutex::new(items),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            aggregate: AtomicBool::new(true),
        }
    }

    async fn next(&self) -> Option<WorkItem> {
        self.backlog.lock().await.pop()
    }

    fn begin(&self) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);
    }

    fn finish(&self, passed: bool) {
        self.aggregate.fetch_and(passed, Ordering::SeqCst);
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Bounded-concurrency scheduler for test class invocations
pub struct ProcessPool<I> {
    invoker: Arc<I>,
    classes_dir: String,
    timeout: Option<Duration>,
}

impl<I> Clone for ProcessPool<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
            classes_dir: self.classes_dir.clone(),
            timeout: self.timeout,
        }
    }
}

impl<I: Invoker + 'static> ProcessPool<I> {
    /// `classes_dir` is the directory name stripped from item paths to get
    /// the class name
    pub fn new(invoker: I, classes_dir: impl Into<String>) -> Self {
        Self {
            invoker: Arc::new(invoker),
            classes_dir: classes_dir.into(),
            timeout: None,
        }
    }

    /// Kill and fail items that run longer than `secs`; 0 disables
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// Start a run in the background.
    ///
    /// Returns immediately. `on_done` is called once with the aggregate
    /// result after the last item finished; the handle yields the summary.
    pub fn schedule_all<F>(
        &self,
        items: Vec<WorkItem>,
        limit: Option<usize>,
        on_done: F,
    ) -> JoinHandle<RunSummary>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let pool = self.clone();
        tokio::spawn(async move {
            let summary = pool.run(items, limit).await;
            on_done(summary.success);
            summary
        })
    }

    /// Discover compiled test classes and start a run over them.
    ///
    /// `classes` replaces discovery when given. Fails before anything is
    /// spawned if discovery or an override pattern is invalid.
    pub fn schedule_batch<F>(
        &self,
        paths: &XltPaths,
        classes: Option<Vec<PathBuf>>,
        overrides: &[ParamOverride],
        limit: Option<usize>,
        on_done: F,
    ) -> XltResult<JoinHandle<RunSummary>>
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let classes = match classes {
            Some(classes) => classes,
            None => find_test_case_classes(paths)?,
        };
        let items = build_work_items(classes, overrides)?;
        Ok(self.schedule_all(items, limit, on_done))
    }

    /// Run every item and wait for the summary
    pub async fn run(&self, items: Vec<WorkItem>, limit: Option<usize>) -> RunSummary {
        let limit = effective_limit(limit);
        let started_at = Utc::now();
        let workers = limit.min(items.len());

        info!(
            "Scheduling {} test case(s), max {} concurrent",
            items.len(),
            limit
        );

        let state = Arc::new(RunState::new(items));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let pool = self.clone();
                let state = Arc::clone(&state);
                let tx = tx.clone();
                tokio::spawn(async move { pool.worker(id, state, tx).await })
            })
            .collect();
        drop(tx);

        let mut outcomes = Vec::new();
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("Worker terminated abnormally: {}", e);
                state.aggregate.store(false, Ordering::SeqCst);
            }
        }

        let leftover = state.backlog.lock().await.len();
        if leftover > 0 {
            error!("{} test case(s) were never started", leftover);
            state.aggregate.store(false, Ordering::SeqCst);
        }

        let mut summary = RunSummary::new(
            started_at,
            limit,
            state.peak.load(Ordering::SeqCst),
            outcomes,
        );
        summary.success &= state.aggregate.load(Ordering::SeqCst);

        info!(
            "Run finished: {}/{} passed, peak {} concurrent - {}",
            summary.passed,
            summary.total,
            summary.peak_active,
            if summary.success { "OK" } else { "FAILED" }
        );

        summary
    }

    async fn worker(
        &self,
        id: usize,
        state: Arc<RunState>,
        tx: mpsc::UnboundedSender<ItemOutcome>,
    ) {
        while let Some(item) = state.next().await {
            let target = item.target_name(&self.classes_dir);
            state.begin();
            debug!("Worker {} starting {}", id, target);

            let outcome = run_item(&*self.invoker, &target, &item.params, self.timeout).await;

            state.finish(outcome.is_success());
            if tx.send(outcome).is_err() {
                warn!("Outcome collector closed before {} was reported", target);
            }
        }
        debug!("Worker {} idle, backlog empty", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::oneshot;

    /// Scripted invoker: result per class name, tracks concurrency
    #[derive(Default)]
    struct FakeInvoker {
        results: HashMap<String, bool>,
        spawn_errors: HashSet<String>,
        hang: HashSet<String>,
        delay_ms: u64,
        /// Per-target delay, overrides `delay_ms`
        delays: HashMap<String, u64>,
        /// Targets in the order they returned
        finished: StdMutex<Vec<String>>,
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: StdMutex<Vec<(String, RunParams)>>,
    }

    impl FakeInvoker {
        fn with_results(results: &[(&str, bool)]) -> Self {
            Self {
                results: results.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                delay_ms: 20,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl Invoker for FakeInvoker {
        async fn run(&self, target: &str, params: &RunParams) -> XltResult<bool> {
            self.calls
                .lock()
                .unwrap()
                .push((target.to_string(), params.clone()));

            if self.spawn_errors.contains(target) {
                return Err(XltError::Spawn {
                    command: format!("java {target}"),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "java"),
                });
            }

            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            if self.hang.contains(target) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            } else {
                let delay = self.delays.get(target).copied().unwrap_or(self.delay_ms);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.lock().unwrap().push(target.to_string());
            Ok(self.results.get(target).copied().unwrap_or(true))
        }
    }

    fn items(names: &[&str]) -> Vec<WorkItem> {
        names
            .iter()
            .map(|n| WorkItem::new(format!("base/classes/{}.class", n.replace('.', "/"))))
            .collect()
    }

    fn pool(invoker: FakeInvoker) -> ProcessPool<FakeInvoker> {
        ProcessPool::new(invoker, "classes")
    }

    #[tokio::test]
    async fn test_mixed_results_respect_limit() {
        let pool = pool(FakeInvoker::with_results(&[
            ("a.TA", true),
            ("a.TB", false),
            ("a.TC", true),
        ]));

        let summary = pool.run(items(&["a.TA", "a.TB", "a.TC"]), Some(2)).await;

        assert!(!summary.success);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.failed, 1);
        assert!(summary.peak_active <= 2);
        assert!(pool.invoker.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_peak_never_exceeds_min_of_limit_and_items() {
        for (n, k) in [(1usize, 4usize), (3, 3), (10, 3), (7, 1)] {
            let names: Vec<String> = (0..n).map(|i| format!("p.T{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let pool = pool(FakeInvoker::with_results(&[]));

            let summary = pool.run(items(&refs), Some(k)).await;

            assert!(summary.success);
            assert_eq!(summary.total, n);
            assert!(summary.peak_active <= k.min(n), "n={n} k={k}");
            assert!(pool.invoker.peak.load(Ordering::SeqCst) <= k.min(n));
        }
    }

    #[tokio::test]
    async fn test_saturates_limit() {
        let pool = pool(FakeInvoker {
            delay_ms: 100,
            ..Default::default()
        });
        let summary = pool
            .run(items(&["a.T1", "a.T2", "a.T3", "a.T4", "a.T5", "a.T6"]), Some(3))
            .await;
        assert_eq!(summary.peak_active, 3);
    }

    #[tokio::test]
    async fn test_empty_backlog_completes_true() {
        let pool = pool(FakeInvoker::default());
        let (tx, rx) = oneshot::channel();

        let handle = pool.schedule_all(Vec::new(), Some(4), move |ok| {
            let _ = tx.send(ok);
        });

        assert!(rx.await.unwrap());
        let summary = handle.await.unwrap();
        assert_eq!(summary.total, 0);
        assert!(pool.invoker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_callback_fires_once_after_everything_finished() {
        let pool = pool(FakeInvoker::with_results(&[("a.TB", false)]));
        let fired = Arc::new(AtomicUsize::new(0));
        let seen_calls = Arc::new(AtomicUsize::new(0));

        let invoker = Arc::clone(&pool.invoker);
        let counter = Arc::clone(&fired);
        let calls = Arc::clone(&seen_calls);
        let handle = pool.schedule_all(items(&["a.TA", "a.TB", "a.TC", "a.TD"]), Some(2), move |ok| {
            assert!(!ok);
            assert_eq!(invoker.active.load(Ordering::SeqCst), 0);
            calls.store(invoker.calls.lock().unwrap().len(), Ordering::SeqCst);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let summary = handle.await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(seen_calls.load(Ordering::SeqCst), 4);
        assert!(!summary.success);
    }

    #[tokio::test]
    async fn test_schedule_all_returns_before_completion() {
        let pool = pool(FakeInvoker {
            delay_ms: 200,
            ..Default::default()
        });
        let done = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&done);

        let handle = pool.schedule_all(items(&["a.TA"]), Some(1), move |_| {
            flag.store(true, Ordering::SeqCst);
        });

        assert!(!done.load(Ordering::SeqCst));
        handle.await.unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_aggregate_independent_of_completion_order() {
        tokio::time::pause();

        let names = ["a.TA", "a.TB", "a.TC"];
        let cases = [
            ([10, 50, 90], ["a.TA", "a.TB", "a.TC"]),
            ([90, 50, 10], ["a.TC", "a.TB", "a.TA"]),
            ([50, 10, 90], ["a.TB", "a.TA", "a.TC"]),
        ];

        for (delays, expected_order) in cases {
            let mut invoker =
                FakeInvoker::with_results(&[("a.TA", true), ("a.TB", false), ("a.TC", true)]);
            invoker.delays = names
                .iter()
                .zip(delays)
                .map(|(name, delay)| (name.to_string(), delay))
                .collect();
            let pool = pool(invoker);

            let summary = pool.run(items(&names), Some(3)).await;

            assert_eq!(*pool.invoker.finished.lock().unwrap(), expected_order);
            assert!(!summary.success, "order {expected_order:?}");
            assert_eq!(summary.failed, 1);
        }

        let summary = pool(FakeInvoker::with_results(&[]))
            .run(items(&["a.TA", "a.TB", "a.TC", "a.TD"]), Some(3))
            .await;
        assert!(summary.success);
    }

    #[tokio::test]
    async fn test_duration_is_wall_time() {
        let pool = pool(FakeInvoker {
            delay_ms: 100,
            ..Default::default()
        });

        let summary = pool.run(items(&["a.T1", "a.T2", "a.T3"]), Some(3)).await;

        let busy: u64 = summary.outcomes.iter().map(|o| o.duration_ms).sum();
        assert!(busy >= 300);
        assert!(summary.total_duration_ms < busy);
    }

    #[tokio::test]
    async fn test_backlog_pops_from_end() {
        let pool = pool(FakeInvoker::default());
        pool.run(items(&["a.TA", "a.TB", "a.TC"]), Some(1)).await;

        let calls = pool.invoker.calls.lock().unwrap();
        let order: Vec<_> = calls.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(order, vec!["a.TC", "a.TB", "a.TA"]);
    }

    #[tokio::test]
    async fn test_spawn_error_counts_as_failure() {
        let mut invoker = FakeInvoker::default();
        invoker.spawn_errors.insert("a.TB".to_string());
        let pool = pool(invoker);

        let summary = pool.run(items(&["a.TA", "a.TB", "a.TC"]), Some(2)).await;

        assert!(!summary.success);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.passed, 2);
    }

    #[tokio::test]
    async fn test_timeout_frees_slot_and_fails() {
        tokio::time::pause();

        let mut invoker = FakeInvoker::default();
        invoker.hang.insert("a.THang".to_string());
        let pool = pool(invoker).with_timeout(5);

        let summary = pool.run(items(&["a.THang", "a.TA", "a.TB"]), Some(1)).await;

        assert!(!summary.success);
        assert_eq!(summary.timeouts, 1);
        assert_eq!(summary.passed, 2);
    }

    #[tokio::test]
    async fn test_zero_limit_is_clamped() {
        let summary = pool(FakeInvoker::default())
            .run(items(&["a.TA", "a.TB"]), Some(0))
            .await;
        assert!(summary.success);
        assert_eq!(summary.concurrency, 1);
        assert_eq!(summary.peak_active, 1);
    }

    #[tokio::test]
    async fn test_schedule_batch_applies_overrides() {
        let pool = pool(FakeInvoker::default());
        let classes = vec![
            PathBuf::from("base/classes/shop/TSearch.class"),
            PathBuf::from("base/classes/shop/TCheckout.class"),
        ];
        let overrides = vec![
            ParamOverride::new("shop/", RunParams::new().driver("firefox")),
            ParamOverride::new("TCheckout", RunParams::new().driver("chrome")),
        ];
        let (tx, rx) = oneshot::channel();

        let handle = pool
            .schedule_batch(&XltPaths::default(), Some(classes), &overrides, Some(2), move |ok| {
                let _ = tx.send(ok);
            })
            .unwrap();

        assert!(rx.await.unwrap());
        handle.await.unwrap();

        let calls = pool.invoker.calls.lock().unwrap();
        let params: HashMap<_, _> = calls.iter().cloned().collect();
        assert_eq!(params["shop.TSearch"].driver.as_deref(), Some("firefox"));
        assert_eq!(params["shop.TCheckout"].driver.as_deref(), Some("chrome"));
    }

    #[tokio::test]
    async fn test_schedule_batch_rejects_bad_override() {
        let pool = pool(FakeInvoker::default());
        let overrides = vec![ParamOverride::new("(", RunParams::new())];

        let result = pool.schedule_batch(
            &XltPaths::default(),
            Some(vec![PathBuf::from("classes/TA.class")]),
            &overrides,
            None,
            |_| {},
        );

        assert!(matches!(result, Err(XltError::Configuration(_))));
        assert!(pool.invoker.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_effective_limit() {
        assert_eq!(effective_limit(Some(3)), 3);
        assert_eq!(effective_limit(Some(0)), 1);
        assert!(effective_limit(None) >= 1);
    }
}
