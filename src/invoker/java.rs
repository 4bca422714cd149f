//! Test class invocation
//!
//! Runs a compiled test class through JUnit and decides pass/fail from its
//! captured output.

use async_trait::async_trait;
use regex::Regex;
use std::io::Read;
use std::process::{Child, ExitStatus, Stdio};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::command::CommandBuilder;
use crate::config::XltPaths;
use crate::error::{XltError, XltResult};
use crate::models::RunParams;

/// JUnit prints `OK (<n> test)` / `OK (<n> tests)` when every test passed
static SUCCESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"OK \(\d+ tests?\)").expect("constant regex pattern is valid"));

/// How often a blocking run checks whether the JVM has exited
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs one test target and reports whether it passed.
///
/// `Ok(false)` is a functional failure. `Err` means the process could not be
/// run at all.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn run(&self, target: &str, params: &RunParams) -> XltResult<bool>;
}

pub fn is_success_output(stdout: &str) -> bool {
    SUCCESS_PATTERN.is_match(stdout)
}

/// Invoker backed by a real JVM
#[derive(Clone, Debug)]
pub struct JavaInvoker {
    commands: CommandBuilder,
}

impl JavaInvoker {
    pub fn new(commands: CommandBuilder) -> Self {
        Self { commands }
    }

    pub fn paths(&self) -> &XltPaths {
        self.commands.paths()
    }

    /// Blocking variant for callers outside the runtime.
    ///
    /// With a `timeout` the JVM is killed once it runs longer and the call
    /// fails with [`XltError::Timeout`].
    pub fn run_blocking(
        &self,
        target: &str,
        params: &RunParams,
        timeout: Option<Duration>,
    ) -> XltResult<bool> {
        let cmd = self.commands.run(target, params);
        info!("{}", cmd);

        let mut child = cmd
            .to_std()
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| XltError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        // Drained on its own thread so the JVM never stalls on a full pipe
        let reader = child.stdout.take().map(|mut out| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = out.read_to_end(&mut buf);
                buf
            })
        });

        let status = match timeout {
            Some(limit) => match wait_until(&mut child, limit)? {
                Some(status) => status,
                None => {
                    warn!("Killing {} after {}s", target, limit.as_secs());
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(XltError::Timeout {
                        target: target.to_string(),
                        secs: limit.as_secs(),
                    });
                }
            },
            None => child.wait()?,
        };

        let output = reader.and_then(|r| r.join().ok()).unwrap_or_default();
        let stdout = String::from_utf8_lossy(&output);
        debug!("{} output:\n{}", target, stdout);

        Ok(judge(target, status.success(), &stdout))
    }
}

/// Wait for the child to exit; `None` once `limit` has passed
fn wait_until(child: &mut Child, limit: Duration) -> XltResult<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[async_trait]
impl Invoker for JavaInvoker {
    async fn run(&self, target: &str, params: &RunParams) -> XltResult<bool> {
        let cmd = self.commands.run(target, params);
        info!("{}", cmd);

        // Dropping the future (timeout) kills the JVM
        let output = cmd
            .to_tokio()
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| XltError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!("{} output:\n{}", target, stdout);

        Ok(judge(target, output.status.success(), &stdout))
    }
}

fn judge(target: &str, exited_ok: bool, stdout: &str) -> bool {
    let matched = is_success_output(stdout);
    let passed = exited_ok && matched;
    if !passed {
        warn!(
            "{} failed (exit ok: {}, success line found: {})",
            target, exited_ok, matched
        );
    }
    passed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::XltOptions;
    use std::path::Path;
    use tempfile::tempdir;

    fn invoker_with_home(base: &Path, java_home: &Path) -> JavaInvoker {
        let paths = XltPaths::from_options(&XltOptions {
            base_dir: Some(base.to_path_buf()),
            ..Default::default()
        });
        JavaInvoker::new(CommandBuilder::new(paths).java_home(java_home))
    }

    /// Installs `<home>/bin/java` as a shell script with the given body
    #[cfg(unix)]
    fn fake_java(home: &Path, body: &str) {
        use std::os::unix::fs::PermissionsExt;

        let bin = home.join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let java = bin.join("java");
        std::fs::write(&java, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn test_success_pattern() {
        assert!(is_success_output("JUnit version 4.12\n.\nTime: 1.2\n\nOK (1 test)\n"));
        assert!(is_success_output("OK (12 tests)"));
        assert!(!is_success_output("FAILURES!!!\nTests run: 1,  Failures: 1"));
        assert!(!is_success_output(""));
    }

    #[test]
    fn test_judge() {
        assert!(judge("a.TA", true, "OK (1 test)"));
        assert!(!judge("a.TA", false, "OK (1 test)"));
        assert!(!judge("a.TA", true, "Tests run: 1,  Failures: 1"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let dir = tempdir().unwrap();
        let invoker = invoker_with_home(dir.path(), &dir.path().join("no-such-jdk"));

        let err = invoker.run("a.TA", &RunParams::new()).await.unwrap_err();
        assert!(matches!(err, XltError::Spawn { .. }));

        let err = invoker
            .run_blocking("a.TA", &RunParams::new(), None)
            .unwrap_err();
        assert!(matches!(err, XltError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_blocking_reads_junit_output() {
        let dir = tempdir().unwrap();
        let home = dir.path().join("jdk");
        fake_java(&home, "echo 'OK (3 tests)'");
        let invoker = invoker_with_home(dir.path(), &home);

        let passed = invoker
            .run_blocking("a.TA", &RunParams::new(), Some(Duration::from_secs(30)))
            .unwrap();
        assert!(passed);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_blocking_kills_hung_jvm() {
        let dir = tempdir().unwrap();
        let home = dir.path().join("jdk");
        fake_java(&home, "exec sleep 30");
        let invoker = invoker_with_home(dir.path(), &home);

        let started = Instant::now();
        let err = invoker
            .run_blocking("a.THang", &RunParams::new(), Some(Duration::from_millis(200)))
            .unwrap_err();

        assert!(matches!(err, XltError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_async_run_checks_exit_status() {
        let dir = tempdir().unwrap();
        let home = dir.path().join("jdk");
        fake_java(&home, "echo 'OK (1 test)'; exit 1");
        let invoker = invoker_with_home(dir.path(), &home);

        assert!(!invoker.run("a.TA", &RunParams::new()).await.unwrap());
    }
}
