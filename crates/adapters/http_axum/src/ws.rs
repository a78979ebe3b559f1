//! WebSocket transport: `/ws/device` and `/ws/client`.
//!
//! Each upgraded socket is split in two. The read half becomes the
//! session's [`Inbound`]; the write half is owned by a writer task that
//! drains a queue fed through [`WsConnection::send`]. Hub fan-out therefore
//! never waits on a peer; a peer whose backlog reaches the configured limit
//! is disconnected.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use relayhub_app::ports::{Connection, Inbound, RecvError, SendError};
use relayhub_app::session;
use relayhub_domain::envelope::Frame;
use relayhub_domain::id::ConnectionId;

use crate::error::not_found;
use crate::state::AppState;

/// Build the `/ws` sub-router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/device", get(device_socket))
        .route("/client", get(client_socket))
        .fallback(not_found)
}

/// `GET /ws/device`
pub async fn device_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let hub = Arc::clone(&state.hub);
    ws.on_failed_upgrade(move |err| {
        tracing::warn!(%err, "device upgrade failed");
        hub.broadcast_log(format!("upgrade device: {err}"));
    })
    .on_upgrade(move |socket| async move {
        let (conn, inbound, writer) = attach(socket, state.max_backlog);
        session::device::run(&state.hub, conn, inbound).await;
        join_writer(writer).await;
    })
}

/// `GET /ws/client`
pub async fn client_socket(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_failed_upgrade(|err| tracing::warn!(%err, "client upgrade failed"))
        .on_upgrade(move |socket| async move {
            let (conn, inbound, writer) = attach(socket, state.max_backlog);
            session::client::run(&state.hub, conn, inbound).await;
            join_writer(writer).await;
        })
}

/// Split `socket` into a hub-facing connection, the session's inbound half
/// and the writer task that owns the sink.
fn attach(socket: WebSocket, max_backlog: usize) -> (Arc<WsConnection>, WsInbound, JoinHandle<()>) {
    let (sink, stream) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let closed = CancellationToken::new();

    let conn = Arc::new(WsConnection::new(tx, max_backlog, closed.clone()));
    let writer = tokio::spawn(write_pump(
        conn.id(),
        sink,
        rx,
        Arc::clone(&conn.backlog),
        closed.clone(),
    ));
    (conn, WsInbound { stream, closed }, writer)
}

async fn join_writer(writer: JoinHandle<()>) {
    if let Err(err) = writer.await {
        tracing::warn!(%err, "websocket writer task failed");
    }
}

/// Drain `rx` into the socket until the connection is closed from either
/// side. Frames already queued at close time are flushed before the close
/// frame goes out, unless the peer was dropped for falling behind.
#[tracing::instrument(name = "ws_writer", skip_all, fields(connection = %id))]
async fn write_pump(
    id: ConnectionId,
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Frame>,
    backlog: Arc<Backlog>,
    closed: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = closed.cancelled() => {
                rx.close();
                if !backlog.overflowed() {
                    while let Ok(frame) = rx.try_recv() {
                        if sink.send(text(&frame)).await.is_err() {
                            break;
                        }
                    }
                    if let Err(err) = sink.send(Message::Close(None)).await {
                        tracing::debug!(%err, "close frame not delivered");
                    }
                }
                break;
            }
            frame = rx.recv() => {
                let Some(frame) = frame else { break };
                let written = sink.send(text(&frame)).await;
                backlog.release();
                if let Err(err) = written {
                    tracing::debug!(%err, "write failed");
                    break;
                }
            }
        }
    }
    // Unblock the reader and reject further sends if the peer went away.
    closed.cancel();
}

fn text(frame: &Frame) -> Message {
    Message::Text(frame.as_str().to_owned().into())
}

/// Count of frames queued but not yet written to one peer.
struct Backlog {
    pending: AtomicUsize,
    limit: usize,
    overflowed: AtomicBool,
}

impl Backlog {
    fn new(limit: usize) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            limit: limit.max(1),
            overflowed: AtomicBool::new(false),
        }
    }

    /// Reserve a slot; fails once `limit` frames are outstanding.
    fn acquire(&self) -> bool {
        let previous = self.pending.fetch_add(1, Ordering::AcqRel);
        if previous >= self.limit {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            self.overflowed.store(true, Ordering::Release);
            return false;
        }
        true
    }

    fn release(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }

    fn overflowed(&self) -> bool {
        self.overflowed.load(Ordering::Acquire)
    }
}

/// Hub-facing handle to one WebSocket peer.
///
/// Sends never block and never drop a frame for a peer that keeps up. A
/// peer with `max_backlog` frames still unwritten is considered stuck and
/// disconnected, so its UI sees a reconnect instead of silent gaps.
pub struct WsConnection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Frame>,
    backlog: Arc<Backlog>,
    closed: CancellationToken,
}

impl WsConnection {
    fn new(tx: mpsc::UnboundedSender<Frame>, max_backlog: usize, closed: CancellationToken) -> Self {
        Self {
            id: ConnectionId::new(),
            tx,
            backlog: Arc::new(Backlog::new(max_backlog)),
            closed,
        }
    }
}

impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn send(&self, frame: Frame) -> Result<(), SendError> {
        if self.closed.is_cancelled() {
            return Err(SendError::Closed);
        }
        if !self.backlog.acquire() {
            tracing::warn!(
                connection = %self.id,
                limit = self.backlog.limit,
                "peer fell behind, disconnecting"
            );
            self.close();
            return Err(SendError::Full);
        }
        self.tx.send(frame).map_err(|_| {
            self.backlog.release();
            SendError::Closed
        })
    }

    fn close(&self) {
        self.closed.cancel();
    }
}

/// Read half of a WebSocket peer.
pub struct WsInbound {
    stream: SplitStream<WebSocket>,
    closed: CancellationToken,
}

impl Inbound for WsInbound {
    async fn recv(&mut self) -> Result<String, RecvError> {
        loop {
            let message = tokio::select! {
                () = self.closed.cancelled() => return Err(RecvError::Closed),
                message = self.stream.next() => message,
            };
            match message {
                None | Some(Ok(Message::Close(_))) => return Err(RecvError::Closed),
                Some(Err(err)) => return Err(RecvError::Transport(Box::new(err))),
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Binary(bytes))) => {
                    return String::from_utf8(bytes.to_vec())
                        .map_err(|err| RecvError::Transport(Box::new(err)));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(max_backlog: usize) -> (WsConnection, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (WsConnection::new(tx, max_backlog, CancellationToken::new()), rx)
    }

    #[test]
    fn should_queue_frame_when_backlog_below_limit() {
        let (conn, mut rx) = connection(2);

        conn.send(Frame::from("one")).unwrap();

        assert_eq!(rx.try_recv().unwrap(), Frame::from("one"));
    }

    #[test]
    fn should_queue_every_frame_of_a_burst_when_within_limit() {
        let (conn, mut rx) = connection(4096);

        for i in 0..500 {
            conn.send(Frame::from(format!("frame-{i}"))).unwrap();
        }

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 500);
        assert!(!conn.closed.is_cancelled());
    }

    #[test]
    fn should_disconnect_when_backlog_reaches_limit() {
        let (conn, _rx) = connection(1);
        conn.send(Frame::from("one")).unwrap();

        assert_eq!(conn.send(Frame::from("two")), Err(SendError::Full));
        assert!(conn.closed.is_cancelled());
        assert!(conn.backlog.overflowed());
        assert_eq!(conn.send(Frame::from("three")), Err(SendError::Closed));
    }

    #[test]
    fn should_accept_more_frames_once_writer_catches_up() {
        let (conn, _rx) = connection(1);
        conn.send(Frame::from("one")).unwrap();

        conn.backlog.release();

        assert_eq!(conn.send(Frame::from("two")), Ok(()));
    }

    #[test]
    fn should_report_closed_after_close() {
        let (conn, _rx) = connection(4);

        conn.close();

        assert_eq!(conn.send(Frame::from("one")), Err(SendError::Closed));
    }

    #[test]
    fn should_report_closed_when_writer_gone() {
        let (conn, rx) = connection(4);
        drop(rx);

        assert_eq!(conn.send(Frame::from("one")), Err(SendError::Closed));
        assert_eq!(conn.backlog.pending.load(Ordering::Acquire), 0);
    }

    #[test]
    fn should_assign_distinct_ids() {
        let (a, _ra) = connection(1);
        let (b, _rb) = connection(1);
        assert_ne!(a.id(), b.id());
    }
}
