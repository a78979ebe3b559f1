//! # relayhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Accept **WebSocket** connections at `/ws/device` and `/ws/client` and
//!   run the matching session loop from `relayhub-app` on each
//! - Implement the transport ports (`Connection`, `Inbound`) on top of an
//!   axum [`WebSocket`](axum::extract::ws::WebSocket), with a per-connection
//!   writer task draining a bounded queue
//! - Serve a small **read-only JSON API** (`/api/devices`, `/api/stats`)
//! - Serve the **static UI bundle** with an SPA fallback to `index.html`
//!
//! ## Dependency rule
//! Depends on `relayhub-app` (for the hub, sessions and port traits) and
//! `relayhub-domain` (for wire types). Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod static_files;
pub mod ws;
