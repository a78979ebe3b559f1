//! # relayhub-app
//!
//! Application layer: the connection hub, session loops, and **port
//! definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that transport adapters must implement:
//!   - `Connection`: thread-safe, non-blocking outbound half of a peer
//!   - `Inbound`: inbound half, read only by the owning session
//! - Provide the **`Hub`**: device registry, last-known state cache, UI
//!   client set, and routing/broadcast, all behind one exclusive lock
//! - Provide the **device** and **client** session loops that drive the hub
//!   from inbound messages
//!
//! ## Dependency rule
//! Depends on `relayhub-domain` only (plus `tracing`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod hub;
pub mod ports;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
