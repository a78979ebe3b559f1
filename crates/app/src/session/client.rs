//! UI-client session: `Active → Closed`.

use std::sync::Arc;

use relayhub_domain::envelope::{Envelope, Frame, MessageKind};

use crate::hub::Hub;
use crate::ports::{Connection, Inbound};

/// Run the control loop of one UI-client connection until it closes.
///
/// On connect the client joins the fan-out set and receives one `state`
/// per cached device. Afterwards every `control` with a device id and a
/// state payload is routed to that device; everything else is ignored.
#[tracing::instrument(name = "client_session", skip_all, fields(connection = %conn.id()))]
pub async fn run<C, I>(hub: &Hub<C>, conn: Arc<C>, mut inbound: I)
where
    C: Connection,
    I: Inbound,
{
    let snapshot = hub.attach_client(&conn);
    tracing::info!(snapshot, "client connected");

    loop {
        let raw = match inbound.recv().await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::info!(%err, "client disconnected");
                break;
            }
        };
        let envelope = match Envelope::decode(&raw) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::warn!(%err, payload = %raw, "undecodable message from client");
                break;
            }
        };

        if envelope.kind != MessageKind::Control
            || envelope.state.is_none()
            || envelope.device_id().is_none()
        {
            tracing::debug!(kind = %envelope.kind, "ignoring message from client");
            continue;
        }

        let routed = hub.route_control(&conn, &envelope, Frame::from(raw));
        tracing::debug!(device = ?envelope.id, ?routed, "control from client");
    }

    hub.remove_client(&conn);
    conn.close();
    tracing::info!("client removed");
}
