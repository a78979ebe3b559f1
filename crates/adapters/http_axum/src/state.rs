//! Shared application state for axum handlers.

use std::sync::Arc;

use relayhub_app::hub::Hub;

use crate::ws::WsConnection;

/// Default number of unwritten frames after which a peer is disconnected.
pub const DEFAULT_MAX_BACKLOG: usize = 4096;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so only the `Arc` is cloned.
pub struct AppState {
    /// The connection hub every session talks to.
    pub hub: Arc<Hub<WsConnection>>,
    /// Unwritten frames per connection before the peer is disconnected.
    pub max_backlog: usize,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            hub: Arc::clone(&self.hub),
            max_backlog: self.max_backlog,
        }
    }
}

impl AppState {
    /// Create a new application state around a fresh hub.
    #[must_use]
    pub fn new(max_backlog: usize) -> Self {
        Self::from_hub(Arc::new(Hub::new()), max_backlog)
    }

    /// Create a new application state around an existing hub.
    ///
    /// Use this when the hub needs to be shared with something other than
    /// the HTTP layer.
    #[must_use]
    pub fn from_hub(hub: Arc<Hub<WsConnection>>, max_backlog: usize) -> Self {
        Self {
            hub,
            max_backlog,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BACKLOG)
    }
}
