//! # Supervisor: pool lifecycle and the terminal barrier.
//!
//! [`Supervisor`] owns one run end to end: it sizes and spawns the worker
//! pool, waits for every worker to reach its terminal state, and only
//! then sends the terminal `ALL_DONE` notification and aggregates the
//! per-worker logs.
//!
//! ```text
//! run(runner)
//!   ├─► subscriber_listener (bus → Subscribe impls)
//!   ├─► WorkQueue ◄── cfg.modules
//!   ├─► JoinSet: min(max_workers, queue len) workers
//!   ├─► join_next() until the set is empty      ← the barrier
//!   ├─► publish AllDone, send ALL_DONE          ← exactly once, always
//!   └─► aggregate worker logs into the run log
//! ```
//!
//! ## Rules
//! - The barrier is a direct join on every worker handle; there is no
//!   liveness polling.
//! - `ALL_DONE` is sent exactly once per run, after the barrier, even
//!   when the queue was empty or every module failed. A delivery error
//!   is logged and the run still completes.
//! - A panicked worker task is logged and treated as terminal; the run
//!   is not aborted.

use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::invoker::{SyncInvoker, SyncRunner};
use crate::logs;
use crate::notify::{Notification, NotificationClient};
use crate::queue::WorkQueue;
use crate::subscribers::Subscribe;
use crate::worker::{Worker, WorkerReport};

/// Ring-buffer size of the event bus.
const BUS_CAPACITY: usize = 256;

/// Totals for one completed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Modules that were enqueued.
    pub modules: usize,
    /// Workers the pool actually spawned.
    pub workers: usize,
    /// Modules pulled from the queue (equals `modules` after a run).
    pub pulled: usize,
    /// Modules whose final status was 0.
    pub synced: usize,
}

impl RunSummary {
    /// Modules whose final status was non-zero.
    pub fn failed(&self) -> usize {
        self.pulled.saturating_sub(self.synced)
    }
}

/// Drives one mirroring run over a fixed module list.
pub struct Supervisor<S: Subscribe> {
    pub cfg: Arc<Config>,
    pub subscriber: Arc<S>,
    pub bus: Bus,
}

impl<S: Subscribe> Supervisor<S> {
    /// Creates a supervisor for one run.
    pub fn new(cfg: Config, subscriber: S) -> Self {
        Self {
            cfg: Arc::new(cfg),
            subscriber: Arc::new(subscriber),
            bus: Bus::new(BUS_CAPACITY),
        }
    }

    /// Runs the whole pipeline: pool, barrier, terminal notification,
    /// log aggregation. Returns the run totals.
    pub async fn run(&self, runner: Arc<dyn SyncRunner>) -> Result<RunSummary, RuntimeError> {
        self.subscriber_listener();

        let queue = Arc::new(WorkQueue::new(self.cfg.modules.iter().cloned()));
        let pool = self.cfg.max_workers.min(queue.len().await);
        let notifier = NotificationClient::new(self.cfg.listener_port);

        if let Err(err) = logs::debug_note(
            &self.cfg,
            &format!(
                "starting pool: {pool} workers for {} modules, listener port {}",
                self.cfg.modules.len(),
                self.cfg.listener_port
            ),
        ) {
            tracing::warn!(error = %err, "cannot write debug log");
        }

        let mut set = JoinSet::new();
        self.spawn_workers(&mut set, &queue, &runner, &notifier, pool);

        let mut summary = RunSummary {
            modules: self.cfg.modules.len(),
            workers: pool,
            ..RunSummary::default()
        };
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(report) => {
                    summary.pulled += report.pulled;
                    summary.synced += report.synced;
                }
                Err(err) => {
                    tracing::error!(error = %err, "worker task aborted");
                }
            }
        }

        self.bus.publish(Event::now(EventKind::AllDone));
        match notifier.send(&Notification::AllDone).await {
            Ok(()) => self.bus.publish(Event::now(EventKind::NotifySent)),
            Err(err) => {
                self.bus
                    .publish(Event::now(EventKind::NotifyFailed).with_reason(err.to_string()));
            }
        }

        logs::aggregate(&self.cfg)?;
        Ok(summary)
    }

    /// Forwards every bus event to the subscriber from a single task.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let sub = self.subscriber.clone();

        tokio::spawn(async move {
            while let Ok(ev) = rx.recv().await {
                sub.on_event(&ev).await;
            }
        });
    }

    fn spawn_workers(
        &self,
        set: &mut JoinSet<WorkerReport>,
        queue: &Arc<WorkQueue>,
        runner: &Arc<dyn SyncRunner>,
        notifier: &NotificationClient,
        pool: usize,
    ) {
        for id in 0..pool {
            let invoker = SyncInvoker::new(
                Arc::clone(&self.cfg),
                Arc::clone(runner),
                self.bus.clone(),
                id,
            );
            let worker = Worker::new(
                id,
                Arc::clone(queue),
                invoker,
                notifier.clone(),
                self.bus.clone(),
            );
            set.spawn(worker.run());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;
    use crate::module::ModuleId;
    use crate::subscribers::LogWriter;

    struct AlwaysOk;

    #[async_trait]
    impl SyncRunner for AlwaysOk {
        async fn sync(&self, _m: &ModuleId, _log: &Path) -> io::Result<i32> {
            Ok(0)
        }
        fn describe(&self, module: &ModuleId) -> String {
            format!("fake-sync {module}")
        }
    }

    fn test_config(log_root: &Path, modules: &[&str], port: u16, max_workers: usize) -> Config {
        Config {
            modules: modules.iter().copied().map(ModuleId::from).collect(),
            tool: PathBuf::from("/usr/bin/rsync"),
            repo_root: PathBuf::from("/srv/repo"),
            log_root: log_root.to_path_buf(),
            listener_port: port,
            max_workers,
            transfer_timeout: Duration::from_secs(10),
            retry_cooldown: Duration::from_millis(1),
            debug: false,
        }
    }

    #[tokio::test]
    async fn empty_module_list_still_sends_the_terminal_message() {
        let dir = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = String::new();
            sock.read_to_string(&mut buf).await.unwrap();
            buf
        });

        let sup = Supervisor::new(test_config(dir.path(), &[], port, 8), LogWriter::new());
        let summary = sup.run(Arc::new(AlwaysOk)).await.unwrap();

        assert_eq!(summary.workers, 0, "no worker spawns for an empty queue");
        assert_eq!(summary.pulled, 0);
        assert_eq!(server.await.unwrap(), "ALL_DONE");
    }

    #[tokio::test]
    async fn pool_never_exceeds_the_queue() {
        let dir = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        // Drain every connection so sends never block the run.
        tokio::spawn(async move {
            loop {
                let (mut sock, _) = listener.accept().await.unwrap();
                let mut buf = String::new();
                let _ = sock.read_to_string(&mut buf).await;
            }
        });

        let sup = Supervisor::new(
            test_config(dir.path(), &["a", "b"], port, 8),
            LogWriter::new(),
        );
        let summary = sup.run(Arc::new(AlwaysOk)).await.unwrap();

        assert_eq!(summary.workers, 2);
        assert_eq!(summary.pulled, 2);
        assert_eq!(summary.synced, 2);
        assert_eq!(summary.failed(), 0);
    }

    #[tokio::test]
    async fn unreachable_listener_does_not_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };

        let sup = Supervisor::new(
            test_config(dir.path(), &["a"], port, 1),
            LogWriter::new(),
        );
        let summary = sup.run(Arc::new(AlwaysOk)).await.unwrap();
        assert_eq!(summary.synced, 1, "delivery failures never fail the run");
    }
}
