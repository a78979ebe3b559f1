//! The connection hub: registry of live devices and UI clients, the
//! last-known state cache, and message routing.
//!
//! Every operation takes the hub's single lock for its full duration and
//! never re-acquires it, so all hub-mediated sends are totally ordered.
//! Sends only enqueue (see [`Connection::send`]); a failing or slow peer is
//! skipped and never holds the lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use relayhub_domain::device_state::{DeviceState, DeviceSummary};
use relayhub_domain::envelope::{DEVICE_NOT_FOUND, Envelope, Frame};
use relayhub_domain::id::{ConnectionId, DeviceId};

use crate::ports::Connection;

/// Result of [`Hub::register_device`].
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// A previous connection for the same id was closed and replaced.
    pub evicted: bool,
    /// Cached state sent to the new connection as a priming `control`.
    pub primed: Option<DeviceState>,
}

/// Result of [`Hub::route_control`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// The frame was handed to the device connection.
    Forwarded,
    /// No device is registered under the id; the origin got an `error`.
    DeviceNotFound,
}

/// Point-in-time registry sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HubStats {
    pub devices: usize,
    pub clients: usize,
    pub cached_states: usize,
}

struct Registry<C> {
    devices: HashMap<DeviceId, Arc<C>>,
    states: HashMap<DeviceId, DeviceState>,
    clients: HashMap<ConnectionId, Arc<C>>,
}

impl<C: Connection> Registry<C> {
    fn broadcast(&self, envelope: &Envelope) {
        let Some(frame) = encode(envelope) else {
            return;
        };
        for client in self.clients.values() {
            deliver(client, frame.clone());
        }
    }

    fn summary(&self, id: &DeviceId) -> DeviceSummary {
        DeviceSummary {
            id: id.clone(),
            connected: self.devices.contains_key(id),
            state: self.states.get(id).cloned(),
        }
    }
}

/// Shared hub, generic over the outbound connection port.
///
/// Wrap it in an `Arc` and hand a clone to every session task.
pub struct Hub<C> {
    registry: Mutex<Registry<C>>,
}

impl<C> Default for Hub<C> {
    fn default() -> Self {
        Self {
            registry: Mutex::new(Registry {
                devices: HashMap::new(),
                states: HashMap::new(),
                clients: HashMap::new(),
            }),
        }
    }
}

impl<C: Connection> Hub<C> {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry<C>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `conn` as the live connection of device `id`.
    ///
    /// A previous connection under the same id is closed and replaced. If a
    /// state is cached for `id`, it is sent to `conn` as a `control` within
    /// the same critical section, so it precedes any routed command.
    #[tracing::instrument(skip(self, conn), fields(connection = %conn.id()))]
    pub fn register_device(&self, id: &DeviceId, conn: &Arc<C>) -> Registration {
        let mut registry = self.lock();

        let evicted = match registry.devices.insert(id.clone(), Arc::clone(conn)) {
            Some(old) if old.id() != conn.id() => {
                tracing::info!(previous = %old.id(), "closing superseded device connection");
                old.close();
                true
            }
            _ => false,
        };

        let primed = registry.states.get(id).cloned().map(|state| state.with_id(id));
        if let Some(state) = &primed
            && let Some(frame) = encode(&Envelope::control(id, state.clone()))
        {
            deliver(conn, frame);
        }

        Registration { evicted, primed }
    }

    /// Cached state of device `id`, if it ever reported one.
    #[must_use]
    pub fn last_state(&self, id: &DeviceId) -> Option<DeviceState> {
        self.lock().states.get(id).cloned()
    }

    /// Cache `state` as the latest for `id` and fan it out to every client.
    pub fn update_state(&self, id: &DeviceId, state: DeviceState) {
        let state = state.with_id(id);
        let mut registry = self.lock();
        registry.states.insert(id.clone(), state.clone());
        registry.broadcast(&Envelope::state(id, state));
    }

    /// Forward a client's `control` to the addressed device.
    ///
    /// `frame` is sent verbatim. When no device is registered under the
    /// envelope's id, only `origin` receives an `error` envelope.
    pub fn route_control(&self, origin: &C, control: &Envelope, frame: Frame) -> Routed {
        let registry = self.lock();
        let target = control
            .device_id()
            .and_then(|id| registry.devices.get(&id));

        if let Some(device) = target {
            deliver(device, frame);
            return Routed::Forwarded;
        }

        tracing::debug!(device = ?control.id, "control for unknown device");
        if let Some(reply) = encode(&Envelope::error(DEVICE_NOT_FOUND)) {
            deliver(origin, reply);
        }
        Routed::DeviceNotFound
    }

    /// Drop the registration of `id` if it still points at `conn`.
    ///
    /// Returns whether the mapping was removed. A stale cleanup racing a
    /// newer registration for the same id is a no-op. The cached state is
    /// kept.
    pub fn unregister_device(&self, id: &DeviceId, conn: &C) -> bool {
        let mut registry = self.lock();
        let current = registry.devices.get(id).map(|c| c.id());
        if current == Some(conn.id()) {
            registry.devices.remove(id);
            true
        } else {
            false
        }
    }

    /// Add a UI client to the fan-out set.
    pub fn add_client(&self, conn: &Arc<C>) {
        self.lock().clients.insert(conn.id(), Arc::clone(conn));
    }

    /// Add a UI client and send it one `state` per cached device, atomically
    /// with respect to concurrent fan-outs. Returns the snapshot size.
    pub fn attach_client(&self, conn: &Arc<C>) -> usize {
        let mut registry = self.lock();
        registry.clients.insert(conn.id(), Arc::clone(conn));
        let mut sent = 0;
        for (id, state) in &registry.states {
            if let Some(frame) = encode(&Envelope::state(id, state.clone()))
                && deliver(conn, frame)
            {
                sent += 1;
            }
        }
        sent
    }

    /// Remove a UI client from the fan-out set. Returns whether it was present.
    pub fn remove_client(&self, conn: &C) -> bool {
        self.lock().clients.remove(&conn.id()).is_some()
    }

    /// Every cached state, in no particular order.
    #[must_use]
    pub fn snapshot_states(&self) -> Vec<(DeviceId, DeviceState)> {
        self.lock()
            .states
            .iter()
            .map(|(id, state)| (id.clone(), state.clone()))
            .collect()
    }

    /// Send a `log` line to every UI client.
    pub fn broadcast_log(&self, text: impl Into<String>) {
        self.lock().broadcast(&Envelope::log(text));
    }

    /// Every device that is connected or has a cached state, sorted by id.
    #[must_use]
    pub fn devices(&self) -> Vec<DeviceSummary> {
        let registry = self.lock();
        let mut ids: Vec<&DeviceId> = registry
            .devices
            .keys()
            .chain(registry.states.keys().filter(|id| !registry.devices.contains_key(*id)))
            .collect();
        ids.sort();
        ids.into_iter().map(|id| registry.summary(id)).collect()
    }

    /// Summary of one device, if it is connected or has a cached state.
    #[must_use]
    pub fn device(&self, id: &DeviceId) -> Option<DeviceSummary> {
        let registry = self.lock();
        (registry.devices.contains_key(id) || registry.states.contains_key(id))
            .then(|| registry.summary(id))
    }

    /// Current registry sizes.
    #[must_use]
    pub fn stats(&self) -> HubStats {
        let registry = self.lock();
        HubStats {
            devices: registry.devices.len(),
            clients: registry.clients.len(),
            cached_states: registry.states.len(),
        }
    }
}

fn encode(envelope: &Envelope) -> Option<Frame> {
    match envelope.encode() {
        Ok(frame) => Some(frame),
        Err(err) => {
            tracing::warn!(%err, kind = %envelope.kind, "failed to encode outbound envelope");
            None
        }
    }
}

/// Queue `frame` on `conn`, swallowing failures. Returns whether it was queued.
fn deliver<C: Connection + ?Sized>(conn: &C, frame: Frame) -> bool {
    match conn.send(frame) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!(connection = %conn.id(), %err, "dropped outbound frame");
            false
        }
    }
}
