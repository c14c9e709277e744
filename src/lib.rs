//! # syncvisor
//!
//! **Syncvisor** coordinates the concurrent mirroring of remote
//! repository modules onto the local filesystem.
//!
//! A run is a one-shot batch: every module is enqueued up front, a
//! bounded worker pool drains the queue, each successful item is
//! announced to a local listener over TCP, and once the last worker is
//! terminal the listener gets the `ALL_DONE` sentinel and the per-worker
//! logs are collected into one run log.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Config { modules, tool, repo_root, log_root, ... }
//!                        │
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Supervisor (one run)                                       │
//! │  - WorkQueue (drain-only FIFO of modules)                   │
//! │  - Bus (broadcast events)                                   │
//! │  - JoinSet barrier over min(max_workers, modules) workers   │
//! └──────┬──────────────────┬──────────────────┬────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ Worker 0 │       │ Worker 1 │  ...  │ Worker N │
//!   │ pull ──► │       │ pull ──► │       │ pull ──► │
//!   │ invoke ─►│       │ invoke ─►│       │ invoke ─►│
//!   │ notify   │       │ notify   │       │ notify   │
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        │ SyncInvoker: one attempt, retry once on 30/35
//!        ▼
//!   external sync tool ──► repo_root/<module>
//!                          log_root/<module>.log
//!
//! after the barrier:
//!   listener ◄── "ALL_DONE"
//!   log_root/sync_worker_*.log ──► log_root/syncvisor.log
//! ```
//!
//! ### Item lifecycle
//! ```text
//! WorkQueue::try_take() ──► SyncInvoker::sync_module()
//!   ├─► attempt 1 ──► status
//!   │     ├─ 0            ─► success
//!   │     ├─ 30 / 35      ─► sleep(cooldown) ─► attempt 2 ─► final status
//!   │     └─ anything else ─► failure, no retry
//!   ├─ success ─► notify "<module> <output> <log>" (at-most-once)
//!   └─ failure ─► logged only, worker pulls the next module
//! ```
//!
//! ## Features
//! | Area             | Description                                              | Key types                              |
//! |------------------|----------------------------------------------------------|----------------------------------------|
//! | **Supervision**  | Pool sizing, the join barrier, the terminal sentinel.    | [`Supervisor`], [`RunSummary`]         |
//! | **Execution**    | The retry policy and the external-tool seam.             | [`SyncInvoker`], [`SyncRunner`]        |
//! | **Queue**        | Exactly-once distribution of modules to workers.         | [`WorkQueue`], [`ModuleId`]            |
//! | **Notification** | Fire-and-forget TCP messages to the listener.            | [`NotificationClient`], [`Notification`] |
//! | **Subscriber API**| Hook into run lifecycle events (logging, metrics).      | [`Subscribe`], [`Bus`]                 |
//! | **Logs**         | Rotation, run bootstrap, aggregation.                    | [`logs`]                               |
//! | **Errors**       | Typed errors for configuration and the runtime.          | [`ConfigError`], [`RuntimeError`]      |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use syncvisor::{logs, Config, LogWriter, RsyncRunner, Supervisor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::load("/etc/syncvisor.conf".as_ref(), 4040, 8, false)?;
//!     logs::prepare_run(&cfg)?;
//!
//!     let sup = Supervisor::new(cfg, LogWriter::new());
//!     let runner = Arc::new(RsyncRunner::new(sup.cfg.clone()));
//!     let summary = sup.run(runner).await?;
//!
//!     println!("{} of {} modules synced", summary.synced, summary.modules);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod events;
mod invoker;
mod module;
mod notify;
mod queue;
mod subscribers;
mod supervisor;
mod worker;

pub mod logs;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_MAX_WORKERS, DEFAULT_RETRY_COOLDOWN, DEFAULT_TRANSFER_TIMEOUT};
pub use error::{ConfigError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use invoker::{
    is_transient, AttemptResult, ItemOutcome, RsyncRunner, SyncInvoker, SyncRunner,
    SPAWN_FAILED_STATUS, TRANSIENT_STATUSES,
};
pub use module::ModuleId;
pub use notify::{Notification, NotificationClient, NotifyError, ALL_DONE};
pub use queue::WorkQueue;
pub use subscribers::{LogWriter, Subscribe};
pub use supervisor::{RunSummary, Supervisor};
pub use worker::{Worker, WorkerReport};
