//! # Worker: pull, sync, notify, repeat.
//!
//! A [`Worker`] is one slot of the pool. It loops over the shared
//! [`WorkQueue`], hands each pulled module to its [`SyncInvoker`], and on
//! success reports the item to the listener. An empty queue is the normal
//! terminal condition, never an error.
//!
//! ## Rules
//! - A module's failure (non-zero final status, undeliverable
//!   notification, unwritable log) is contained to that item; the worker
//!   proceeds to the next pull.
//! - Only a final status of 0 produces a per-item notification; failed
//!   items are visible in logs only.
//! - Notification delivery is at-most-once: an error is logged and the
//!   loop continues without a resend.

use std::sync::Arc;

use crate::events::{Bus, Event, EventKind};
use crate::invoker::SyncInvoker;
use crate::notify::{Notification, NotificationClient};
use crate::queue::WorkQueue;

/// What one worker did over its lifetime, reported at termination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Pool index of the reporting worker.
    pub worker: usize,
    /// Modules pulled from the queue.
    pub pulled: usize,
    /// Modules whose final status was 0.
    pub synced: usize,
}

/// One slot of the worker pool.
pub struct Worker {
    id: usize,
    queue: Arc<WorkQueue>,
    invoker: SyncInvoker,
    notifier: NotificationClient,
    bus: Bus,
}

impl Worker {
    /// Creates worker `id` over the shared queue.
    pub fn new(
        id: usize,
        queue: Arc<WorkQueue>,
        invoker: SyncInvoker,
        notifier: NotificationClient,
        bus: Bus,
    ) -> Self {
        Self {
            id,
            queue,
            invoker,
            notifier,
            bus,
        }
    }

    /// Drains the queue. Returns once the queue is observed empty.
    pub async fn run(self) -> WorkerReport {
        let mut report = WorkerReport {
            worker: self.id,
            ..WorkerReport::default()
        };

        while let Some(module) = self.queue.try_take().await {
            report.pulled += 1;

            let outcome = self.invoker.sync_module(&module).await;
            if !outcome.succeeded() {
                continue;
            }
            report.synced += 1;

            let notification = Notification::ItemSynced {
                module: outcome.module,
                output: outcome.output,
                log: outcome.log,
            };
            match self.notifier.send(&notification).await {
                Ok(()) => {
                    self.bus.publish(
                        Event::now(EventKind::NotifySent).with_module(module.as_str()),
                    );
                }
                Err(err) => {
                    self.bus.publish(
                        Event::now(EventKind::NotifyFailed)
                            .with_module(module.as_str())
                            .with_reason(err.to_string()),
                    );
                }
            }
        }

        self.bus
            .publish(Event::now(EventKind::WorkerDone).with_worker(self.id));
        report
    }
}
