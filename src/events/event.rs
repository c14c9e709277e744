//! # Runtime events emitted by the supervisor, workers, and invokers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Sync lifecycle**: per-module attempt flow (starting, succeeded,
//!   failed, retry scheduled)
//! - **Notification delivery**: listener messages sent or dropped
//! - **Pool lifecycle**: worker termination and the terminal all-done mark
//!
//! The [`Event`] struct carries optional metadata: module name, worker
//! index, attempt number, exit status, and retry delay.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Sync lifecycle events ===
    /// An attempt to mirror a module is starting.
    ///
    /// Sets: `module`, `worker`, `attempt`.
    SyncStarting,

    /// A module finished with exit status 0 (on whichever attempt).
    ///
    /// Sets: `module`, `worker`, `attempt`, `status`.
    SyncSucceeded,

    /// A module's final attempt ended with a non-zero status.
    ///
    /// Sets: `module`, `worker`, `attempt`, `status`.
    SyncFailed,

    /// A transient status was observed; the single retry is scheduled.
    ///
    /// Sets: `module`, `worker`, `attempt`, `status`, `delay_ms`.
    RetryScheduled,

    // === Notification delivery events ===
    /// A listener notification was written and the connection closed.
    ///
    /// Sets: `module` (absent for the terminal message).
    NotifySent,

    /// A listener notification could not be delivered (fire-and-forget:
    /// the run continues).
    ///
    /// Sets: `module` (absent for the terminal message), `reason`.
    NotifyFailed,

    // === Pool lifecycle events ===
    /// A worker observed the queue empty and reached its terminal state.
    ///
    /// Sets: `worker`.
    WorkerDone,

    /// Every worker is terminal and all per-item outcomes are determined.
    ///
    /// Sets: nothing beyond `at`/`seq`.
    AllDone,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Module the event concerns, if any.
    pub module: Option<Arc<str>>,
    /// Index of the worker that produced the event, if any.
    pub worker: Option<usize>,
    /// Attempt number (1 or 2), if applicable.
    pub attempt: Option<u32>,
    /// Sync tool exit status, if applicable.
    pub status: Option<i32>,
    /// Retry delay before the second attempt in milliseconds.
    pub delay_ms: Option<u32>,
    /// Human-readable reason (delivery errors and the like).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp
    /// and the next global sequence number.
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            module: None,
            worker: None,
            attempt: None,
            status: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a module name.
    #[inline]
    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Attaches a worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Attaches a sync tool exit status.
    #[inline]
    pub fn with_status(mut self, status: i32) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
