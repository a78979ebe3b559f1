//! Static UI bundle served next to the WebSocket endpoints.

use std::path::PathBuf;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

/// Where the UI bundle lives on disk and where its assets are mounted.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    /// Root directory of the built UI (contains `index.html`).
    pub dir: PathBuf,
    /// URL prefix whose paths map to `<dir>/<prefix>/...`; missing files
    /// under it are a plain 404.
    pub mount: String,
}

impl StaticFiles {
    pub fn new(dir: impl Into<PathBuf>, mount: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            mount: mount.into(),
        }
    }

    fn index(&self) -> PathBuf {
        self.dir.join("index.html")
    }

    fn assets_dir(&self) -> PathBuf {
        self.dir.join(self.mount.trim_matches('/'))
    }

    /// Attach the asset mount and the SPA fallback to `router`.
    ///
    /// Any path no other route claims is served from `dir` when the file
    /// exists and from `index.html` otherwise, so client-side routes
    /// survive a reload.
    pub fn mount<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let spa = ServeDir::new(&self.dir).fallback(ServeFile::new(self.index()));
        router
            .nest_service(&self.mount, ServeDir::new(self.assets_dir()))
            .fallback_service(spa)
    }
}

impl Default for StaticFiles {
    fn default() -> Self {
        Self::new("client/dist", "/static")
    }
}
