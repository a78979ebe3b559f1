//! Inbound port: how a session reads from its peer.

use std::future::Future;

/// Why the next inbound message could not be read.
#[derive(Debug, thiserror::Error)]
pub enum RecvError {
    /// The peer closed the connection, or it was closed locally.
    #[error("connection closed")]
    Closed,
    /// The transport failed (protocol violation, reset, ...).
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Read half of one accepted connection, owned by its session loop.
pub trait Inbound: Send {
    /// Suspend until the next text message arrives.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError`] when the connection is closed or broken; the
    /// session ends on any error.
    fn recv(&mut self) -> impl Future<Output = Result<String, RecvError>> + Send;
}
