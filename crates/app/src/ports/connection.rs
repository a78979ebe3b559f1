//! Outbound connection port: how the hub writes to a peer.

use std::sync::Arc;

use relayhub_domain::envelope::Frame;
use relayhub_domain::id::ConnectionId;

/// Why a frame could not be queued for a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The peer fell too far behind; the connection is being closed.
    #[error("peer backlog full")]
    Full,
    /// The connection has been closed.
    #[error("connection closed")]
    Closed,
}

/// Write half of one accepted connection.
///
/// Implementations must be safe to call from any task concurrently with
/// the owning session reading the other half, and must never block: the
/// hub calls [`send`](Self::send) while holding its lock.
pub trait Connection: Send + Sync {
    /// Stable identity of this connection.
    fn id(&self) -> ConnectionId;

    /// Queue a frame for delivery to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Full`] when the peer has fallen too far behind
    /// (the implementation closes it), or [`SendError::Closed`] once the
    /// connection has been closed. A peer that keeps up never sees an
    /// error, so every frame queued to it is delivered in order.
    fn send(&self, frame: Frame) -> Result<(), SendError>;

    /// Tear the connection down. The owning session observes this as a
    /// read failure at its next suspension point. Idempotent.
    fn close(&self);
}

impl<T: Connection + ?Sized> Connection for Arc<T> {
    fn id(&self) -> ConnectionId {
        (**self).id()
    }

    fn send(&self, frame: Frame) -> Result<(), SendError> {
        (**self).send(frame)
    }

    fn close(&self) {
        (**self).close();
    }
}
