//! # SyncInvoker: one module's synchronization, with the retry policy.
//!
//! [`SyncInvoker`] performs all attempts for one pulled module and decides
//! retries. Execution itself goes through the [`SyncRunner`] seam so the
//! policy can be exercised without an external tool.
//!
//! ## Attempt flow
//! ```text
//! sync_module(m)
//!   ├─► publish SyncStarting(attempt=1)
//!   ├─► runner.sync(m) ──► exit status
//!   ├─► append attempt line + command to worker log, flush
//!   ├─► transient status (30/35)?
//!   │     ├─ yes ─► publish RetryScheduled → sleep(cooldown)
//!   │     │         ├─► publish SyncStarting(attempt=2)
//!   │     │         ├─► runner.sync(m) ──► exit status (final, whatever it is)
//!   │     │         └─► append "2nd attempt" line, flush
//!   │     └─ no ──► status is final
//!   └─► publish SyncSucceeded / SyncFailed, return ItemOutcome
//! ```
//!
//! ## Rules
//! - Statuses 30 and 35 (the tool's timeout classes) are transient and
//!   worth exactly one retry after a fixed cooldown; they are treated
//!   identically.
//! - No status is retried more than once; the second attempt's status is
//!   final regardless of value, and any other non-zero status is final
//!   immediately.
//! - Every attempt is flushed to the worker log before the cooldown sleep
//!   or the return, so a crash mid-run leaves a readable partial log.
//! - A runner that cannot even start the tool is a terminal failure for
//!   that module (recorded with a synthetic status), never a worker death.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::config::Config;
use crate::events::{Bus, Event, EventKind};
use crate::module::ModuleId;

/// Exit statuses of the sync tool that warrant the single retry
/// (its connection/transfer timeout classes).
pub const TRANSIENT_STATUSES: [i32; 2] = [30, 35];

/// Synthetic status recorded when the tool could not be spawned at all.
pub const SPAWN_FAILED_STATUS: i32 = -1;

/// Returns true if the status is worth one retry.
pub fn is_transient(status: i32) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// Result of a single attempt, as recorded in the worker log.
#[derive(Clone, Debug)]
pub struct AttemptResult {
    /// Module the attempt was for.
    pub module: ModuleId,
    /// Attempt number: 1 or 2.
    pub attempt: u32,
    /// Exit status of the tool (or [`SPAWN_FAILED_STATUS`]).
    pub status: i32,
    /// Worker log the attempt line was appended to.
    pub log: PathBuf,
}

/// Terminal outcome for one module, after all attempts.
///
/// Converted straight into a notification message (on success) and
/// dropped; nothing about it persists beyond the log file.
#[derive(Clone, Debug)]
pub struct ItemOutcome {
    /// The mirrored module.
    pub module: ModuleId,
    /// Exit status of the last attempt.
    pub status: i32,
    /// Local destination tree the tool wrote into.
    pub output: PathBuf,
    /// Per-module transfer log.
    pub log: PathBuf,
}

impl ItemOutcome {
    /// True if the final attempt reported success.
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }
}

/// # Execution seam for one synchronization attempt.
///
/// The real implementation ([`RsyncRunner`]) spawns the external tool;
/// tests script exit statuses to drive the retry policy.
#[async_trait]
pub trait SyncRunner: Send + Sync + 'static {
    /// Runs one attempt for `module`, returning the tool's exit status.
    ///
    /// `worker_log` receives the tool's stderr (appended); an `Err` means
    /// the tool could not be executed at all.
    async fn sync(&self, module: &ModuleId, worker_log: &Path) -> io::Result<i32>;

    /// The exact command line an attempt executes, for the worker log.
    fn describe(&self, module: &ModuleId) -> String;
}

/// Spawns the external synchronization tool for one module.
///
/// The invocation mirrors the classic coordinator command:
/// `<tool> -airz --del --timeout=<t> rsync://<module>/ <repo_root>/<module>`
/// with stdout captured into the per-module transfer log and stderr
/// appended to the calling worker's log.
pub struct RsyncRunner {
    cfg: Arc<Config>,
}

impl RsyncRunner {
    /// Creates a runner over the run configuration.
    pub fn new(cfg: Arc<Config>) -> Self {
        Self { cfg }
    }

    fn args(&self, module: &ModuleId) -> Vec<String> {
        vec![
            "-airz".to_string(),
            "--del".to_string(),
            format!("--timeout={}", self.cfg.transfer_timeout.as_secs()),
            format!("rsync://{module}/"),
            self.cfg.dest_dir(module).display().to_string(),
        ]
    }
}

#[async_trait]
impl SyncRunner for RsyncRunner {
    async fn sync(&self, module: &ModuleId, worker_log: &Path) -> io::Result<i32> {
        let stdout = std::fs::File::create(self.cfg.module_log(module))?;
        let stderr = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(worker_log)?;

        let status = Command::new(&self.cfg.tool)
            .args(self.args(module))
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .await?;

        // A signal-terminated tool has no code; fold it into the synthetic
        // spawn-failure status, which is terminal and non-transient.
        Ok(status.code().unwrap_or(SPAWN_FAILED_STATUS))
    }

    fn describe(&self, module: &ModuleId) -> String {
        format!(
            "{} {}",
            self.cfg.tool.display(),
            self.args(module).join(" ")
        )
    }
}

/// Applies the retry policy around a [`SyncRunner`] for one worker.
pub struct SyncInvoker {
    cfg: Arc<Config>,
    runner: Arc<dyn SyncRunner>,
    bus: Bus,
    worker: usize,
    worker_log: PathBuf,
}

impl SyncInvoker {
    /// Creates the invoker for one worker slot.
    pub fn new(cfg: Arc<Config>, runner: Arc<dyn SyncRunner>, bus: Bus, worker: usize) -> Self {
        let worker_log = cfg.worker_log(worker);
        Self {
            cfg,
            runner,
            bus,
            worker,
            worker_log,
        }
    }

    /// Performs all attempts for one module and returns the terminal
    /// outcome. Never fails: tool and I/O problems degrade to a failed
    /// outcome so the calling worker always survives.
    pub async fn sync_module(&self, module: &ModuleId) -> ItemOutcome {
        let first = self.attempt(module, 1).await;

        let (status, final_attempt) = if is_transient(first.status) {
            self.bus.publish(
                Event::now(EventKind::RetryScheduled)
                    .with_module(module.as_str())
                    .with_worker(self.worker)
                    .with_attempt(1)
                    .with_status(first.status)
                    .with_delay(self.cfg.retry_cooldown),
            );
            tokio::time::sleep(self.cfg.retry_cooldown).await;
            (self.attempt(module, 2).await.status, 2)
        } else {
            (first.status, 1)
        };

        let outcome = ItemOutcome {
            module: module.clone(),
            status,
            output: self.cfg.dest_dir(module),
            log: self.cfg.module_log(module),
        };

        let kind = if outcome.succeeded() {
            EventKind::SyncSucceeded
        } else {
            EventKind::SyncFailed
        };
        self.bus.publish(
            Event::now(kind)
                .with_module(module.as_str())
                .with_worker(self.worker)
                .with_attempt(final_attempt)
                .with_status(status),
        );

        outcome
    }

    /// Runs one attempt and appends its record to the worker log.
    async fn attempt(&self, module: &ModuleId, attempt: u32) -> AttemptResult {
        self.bus.publish(
            Event::now(EventKind::SyncStarting)
                .with_module(module.as_str())
                .with_worker(self.worker)
                .with_attempt(attempt),
        );

        let status = match self.runner.sync(module, &self.worker_log).await {
            Ok(status) => status,
            Err(err) => {
                tracing::warn!(
                    module = module.as_str(),
                    worker = self.worker,
                    error = %err,
                    "sync tool could not be executed"
                );
                SPAWN_FAILED_STATUS
            }
        };

        let line = if attempt == 1 {
            format!(
                "{module} exited with status {status} on attempt 1 (worker {})\n{}\n",
                self.worker,
                self.runner.describe(module),
            )
        } else {
            format!("{module} 2nd attempt: {status}\n")
        };
        if let Err(err) = self.append_log(&line).await {
            tracing::warn!(
                log = %self.worker_log.display(),
                error = %err,
                "cannot append to worker log"
            );
        }

        AttemptResult {
            module: module.clone(),
            attempt,
            status,
            log: self.worker_log.clone(),
        }
    }

    /// Appends and flushes one record; flushed before any cooldown sleep
    /// or return so a crash mid-run leaves a readable partial log.
    async fn append_log(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.worker_log)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
