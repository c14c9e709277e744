//! # Shared work queue of pending modules.
//!
//! [`WorkQueue`] is a first-come-first-served pool of [`ModuleId`]s,
//! filled exactly once at startup and drained concurrently by the worker
//! pool. There is no insert operation after construction, so an empty
//! result from [`WorkQueue::try_take`] is a terminal observation: no item
//! can ever become available again. Running out of items is the normal
//! worker termination signal, not an error.
//!
//! ## Rules
//! - Any number of concurrent consumers; each item is handed to exactly
//!   one of them (the mutex around the deque guarantees at-most-one pull
//!   per item, the drain-only lifecycle guarantees at-least-one).
//! - FIFO with respect to the original module list.
//! - Because the queue is populated strictly before any worker starts,
//!   the original design's bounded blocking take collapses to an
//!   immediate pop — waiting on an empty drain-only queue can never be
//!   satisfied.

use std::collections::VecDeque;

use tokio::sync::Mutex;

use crate::module::ModuleId;

/// Concurrency-safe, drain-only FIFO of modules awaiting mirroring.
#[derive(Debug)]
pub struct WorkQueue {
    items: Mutex<VecDeque<ModuleId>>,
}

impl WorkQueue {
    /// Creates the queue from the full module list. This is the only
    /// point at which items enter the queue.
    pub fn new(modules: impl IntoIterator<Item = ModuleId>) -> Self {
        Self {
            items: Mutex::new(modules.into_iter().collect()),
        }
    }

    /// Takes the next pending module, or `None` if the queue is drained.
    ///
    /// `None` is terminal: the queue never refills, so a consumer seeing
    /// it should stop pulling.
    pub async fn try_take(&self) -> Option<ModuleId> {
        self.items.lock().await.pop_front()
    }

    /// Number of items still pending.
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// True if no items are pending.
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    fn modules(n: usize) -> Vec<ModuleId> {
        (0..n).map(|i| ModuleId::from(format!("mod-{i}"))).collect()
    }

    #[tokio::test]
    async fn drains_in_fifo_order() {
        let q = WorkQueue::new(modules(3));
        assert_eq!(q.len().await, 3);
        assert_eq!(q.try_take().await.unwrap().as_str(), "mod-0");
        assert_eq!(q.try_take().await.unwrap().as_str(), "mod-1");
        assert_eq!(q.try_take().await.unwrap().as_str(), "mod-2");
        assert!(q.try_take().await.is_none());
        assert!(q.is_empty().await);
    }

    #[tokio::test]
    async fn duplicates_are_kept() {
        let q = WorkQueue::new(vec![ModuleId::from("a"), ModuleId::from("a")]);
        assert_eq!(q.len().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_consumers_take_each_item_exactly_once() {
        const N: usize = 500;
        const CONSUMERS: usize = 8;

        let q = Arc::new(WorkQueue::new(modules(N)));
        let mut handles = Vec::new();
        for _ in 0..CONSUMERS {
            let q = Arc::clone(&q);
            handles.push(tokio::spawn(async move {
                let mut taken = Vec::new();
                while let Some(m) = q.try_take().await {
                    taken.push(m);
                }
                taken
            }));
        }

        let mut seen = Vec::new();
        for h in handles {
            seen.extend(h.await.unwrap());
        }

        assert_eq!(seen.len(), N, "total pulls must equal items inserted");
        let unique: HashSet<_> = seen.iter().map(|m| m.as_str().to_string()).collect();
        assert_eq!(unique.len(), N, "no item may be pulled twice");
    }
}
