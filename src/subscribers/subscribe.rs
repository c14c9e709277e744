//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers
//! into the runtime. The supervisor drives all subscribers from a single
//! listener task fed by the [`Bus`](crate::events::Bus); implementations
//! should avoid blocking the async runtime (prefer async I/O and
//! cooperative waits).

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// Called from the supervisor's listener task for every published event.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
