//! # Completion notifications to the listener process.
//!
//! [`NotificationClient`] delivers one [`Notification`] per TCP
//! connection to a listener on the loopback interface: connect, write the
//! payload, close. No response is read and nothing is retried — delivery
//! is fire-and-forget, and callers must not assume a message arrived.
//!
//! ## Wire format
//! One plain-text, newline-free message per connection:
//! ```text
//! <module> <local_output_path> <local_log_path>    per-item success
//! ALL_DONE                                         terminal, once per run
//! ```
//! The connection close is the only framing.
//!
//! Each [`send`](NotificationClient::send) opens a fresh connection, so
//! concurrent calls from different workers cannot interfere.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::module::ModuleId;

/// The listener always runs on the loopback interface.
const LISTENER_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Terminal message sent exactly once per run, after the pool barrier.
pub const ALL_DONE: &str = "ALL_DONE";

/// A single message for the listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A module was mirrored successfully.
    ItemSynced {
        /// The mirrored module.
        module: ModuleId,
        /// Local destination tree written by the sync tool.
        output: PathBuf,
        /// Per-module transfer log.
        log: PathBuf,
    },
    /// Every worker is terminal; the run is over.
    AllDone,
}

impl Notification {
    /// Encodes the message body (newline-free plain text).
    pub fn encode(&self) -> String {
        match self {
            Notification::ItemSynced {
                module,
                output,
                log,
            } => {
                format!("{module} {} {}", output.display(), log.display())
            }
            Notification::AllDone => ALL_DONE.to_string(),
        }
    }
}

/// Failure to deliver a notification.
///
/// Surfaced to the caller for logging only; the protocol has no retry.
#[derive(Error, Debug)]
#[error("cannot deliver notification to {addr}: {source}")]
pub struct NotifyError {
    /// Listener endpoint that was attempted.
    pub addr: SocketAddr,
    /// Underlying I/O error.
    #[source]
    pub source: std::io::Error,
}

/// Short-lived-connection client for the listener endpoint.
///
/// Holds only the target address; every send opens and closes its own
/// connection, so the client is freely cloneable across workers.
#[derive(Clone, Debug)]
pub struct NotificationClient {
    addr: SocketAddr,
}

impl NotificationClient {
    /// Creates a client for the listener on `127.0.0.1:port`.
    pub fn new(port: u16) -> Self {
        Self {
            addr: SocketAddr::new(LISTENER_ADDR, port),
        }
    }

    /// Delivers one message: connect, write fully, close.
    ///
    /// An `Err` means the listener never saw the message; callers log it
    /// and move on (at-most-once semantics, no retry).
    pub async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let wrap = |source| NotifyError {
            addr: self.addr,
            source,
        };

        let mut stream = TcpStream::connect(self.addr).await.map_err(wrap)?;
        stream
            .write_all(notification.encode().as_bytes())
            .await
            .map_err(wrap)?;
        stream.shutdown().await.map_err(wrap)?;
        Ok(())
    }
}
