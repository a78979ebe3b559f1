//! In-memory port implementations for unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use relayhub_domain::envelope::{Envelope, Frame};
use relayhub_domain::id::ConnectionId;
use tokio::sync::mpsc;

use crate::ports::{Connection, Inbound, RecvError, SendError};

/// Connection that records every frame queued on it.
pub(crate) struct RecordingConnection {
    id: ConnectionId,
    frames: Mutex<Vec<Frame>>,
    closed: AtomicBool,
    failing: bool,
}

impl RecordingConnection {
    fn build(failing: bool) -> Arc<Self> {
        Arc::new(Self {
            id: ConnectionId::new(),
            frames: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            failing,
        })
    }

    pub(crate) fn new() -> Arc<Self> {
        Self::build(false)
    }

    /// A connection whose every send fails as if its queue were full.
    pub(crate) fn failing() -> Arc<Self> {
        Self::build(true)
    }

    pub(crate) fn frames(&self) -> Vec<Frame> {
        self.frames.lock().unwrap().clone()
    }

    pub(crate) fn envelopes(&self) -> Vec<Envelope> {
        self.frames()
            .iter()
            .map(|frame| Envelope::decode(frame.as_str()).unwrap())
            .collect()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for RecordingConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: Frame) -> Result<(), SendError> {
        if self.failing {
            return Err(SendError::Full);
        }
        if self.is_closed() {
            return Err(SendError::Closed);
        }
        self.frames.lock().unwrap().push(frame);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Inbound half fed from a channel; reports `Closed` once the sender is
/// dropped and the buffered messages are drained.
pub(crate) struct ChannelInbound {
    rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelInbound {
    pub(crate) fn channel() -> (mpsc::UnboundedSender<String>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Inbound that yields `messages` in order and then reports `Closed`.
    pub(crate) fn scripted<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (tx, inbound) = Self::channel();
        for message in messages {
            tx.send(message.into()).unwrap();
        }
        inbound
    }
}

impl Inbound for ChannelInbound {
    async fn recv(&mut self) -> Result<String, RecvError> {
        self.rx.recv().await.ok_or(RecvError::Closed)
    }
}
