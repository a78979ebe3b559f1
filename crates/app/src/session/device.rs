//! Device-side session: `AwaitingRegister → Active → Closed`.

use std::sync::Arc;

use relayhub_domain::envelope::{Envelope, MessageKind};
use relayhub_domain::id::DeviceId;

use crate::hub::Hub;
use crate::ports::{Connection, Inbound};

/// How a device session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSessionEnd {
    /// The handshake failed; nothing was registered.
    Rejected,
    /// The session was active and has been torn down. `removed` tells
    /// whether this connection was still the registered one for `device`.
    Closed { device: DeviceId, removed: bool },
}

/// Run the control loop of one device connection until it closes.
///
/// The first message must be a `register` envelope with a non-empty `id`.
/// Afterwards `state` reports are cached and fanned out. A `log` with a
/// non-empty message is relayed to UI clients prefixed with the device id,
/// unless it names another device's id or carries a state payload; those
/// are dropped. Any read or decode failure ends the session.
#[tracing::instrument(
    name = "device_session",
    skip_all,
    fields(connection = %conn.id(), device = tracing::field::Empty)
)]
pub async fn run<C, I>(hub: &Hub<C>, conn: Arc<C>, mut inbound: I) -> DeviceSessionEnd
where
    C: Connection,
    I: Inbound,
{
    let Some(id) = handshake(hub, &mut inbound).await else {
        conn.close();
        return DeviceSessionEnd::Rejected;
    };
    tracing::Span::current().record("device", tracing::field::display(&id));

    let registration = hub.register_device(&id, &conn);
    if registration.evicted {
        tracing::info!("device reconnect: closed old connection");
        hub.broadcast_log(format!("device [{id}] reconnect: closing old connection"));
    }
    if let Some(state) = &registration.primed {
        tracing::debug!(?state, "sent last state to device");
        hub.broadcast_log(format!("send last state to device [{id}]"));
    }
    tracing::info!("device connected");
    hub.broadcast_log(format!("device connected: {id}"));

    let reason = loop {
        let raw = match inbound.recv().await {
            Ok(raw) => raw,
            Err(err) => break err.to_string(),
        };
        let envelope = match Envelope::decode(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(%err, payload = %raw, "undecodable message from device");
                break err.to_string();
            }
        };
        tracing::debug!(kind = %envelope.kind, "message from device");
        handle(hub, &id, envelope);
    };

    tracing::info!(%reason, "device disconnected");
    hub.broadcast_log(format!("device [{id}] disconnected: {reason}"));

    let removed = hub.unregister_device(&id, &conn);
    if removed {
        tracing::info!("device removed");
        hub.broadcast_log(format!("device removed: {id}"));
    }
    conn.close();

    DeviceSessionEnd::Closed {
        device: id,
        removed,
    }
}

async fn handshake<C, I>(hub: &Hub<C>, inbound: &mut I) -> Option<DeviceId>
where
    C: Connection,
    I: Inbound,
{
    let raw = match inbound.recv().await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(%err, "invalid register from device (read error)");
            hub.broadcast_log(format!("invalid register from device (read error): {err}"));
            return None;
        }
    };

    tracing::debug!(payload = %raw, "raw register payload from device");
    hub.broadcast_log(format!("raw register payload from device: {raw}"));

    match Envelope::decode(&raw).and_then(Envelope::into_registration) {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!(%err, payload = %raw, "invalid register from device");
            hub.broadcast_log(format!("invalid register from device ({err}): {raw}"));
            None
        }
    }
}

fn handle<C: Connection>(hub: &Hub<C>, id: &DeviceId, envelope: Envelope) {
    match envelope.kind {
        MessageKind::State => {
            let Some(state) = envelope.state else {
                return;
            };
            hub.update_state(id, state);
            hub.broadcast_log(format!("state saved and broadcast: {id}"));
        }
        MessageKind::Log => {
            let foreign = envelope.device_id().is_some_and(|other| &other != id);
            if foreign || envelope.state.is_some() {
                return;
            }
            if let Some(text) = envelope.text() {
                hub.broadcast_log(format!("[{id}] {text}"));
            }
        }
        _ => {}
    }
}
