//! # Tracing-backed logging subscriber.
//!
//! [`LogWriter`] translates runtime events into `tracing` records. It is
//! the default subscriber installed by the binary; library users can add
//! their own [`Subscribe`] implementations alongside it (metrics, audit).
//!
//! Per-worker attempt log files are part of the wire contract and are
//! written by the invoker directly; this subscriber only covers
//! diagnostics.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Default diagnostics subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new log writer.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SyncStarting => {
                debug!(
                    module = e.module.as_deref(),
                    worker = e.worker,
                    attempt = e.attempt,
                    "sync starting"
                );
            }
            EventKind::SyncSucceeded => {
                info!(
                    module = e.module.as_deref(),
                    worker = e.worker,
                    attempt = e.attempt,
                    "sync succeeded"
                );
            }
            EventKind::SyncFailed => {
                warn!(
                    module = e.module.as_deref(),
                    worker = e.worker,
                    attempt = e.attempt,
                    status = e.status,
                    "sync failed"
                );
            }
            EventKind::RetryScheduled => {
                info!(
                    module = e.module.as_deref(),
                    worker = e.worker,
                    status = e.status,
                    delay_ms = e.delay_ms,
                    "transient status, retry scheduled"
                );
            }
            EventKind::NotifySent => {
                debug!(module = e.module.as_deref(), "notification sent");
            }
            EventKind::NotifyFailed => {
                warn!(
                    module = e.module.as_deref(),
                    reason = e.reason.as_deref(),
                    "notification dropped"
                );
            }
            EventKind::WorkerDone => {
                debug!(worker = e.worker, "worker done, queue empty");
            }
            EventKind::AllDone => {
                info!("all workers terminal, run complete");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
