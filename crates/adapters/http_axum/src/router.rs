//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::static_files::StaticFiles;

/// Build the top-level axum [`Router`].
///
/// WebSocket endpoints live under `/ws`, the JSON API under `/api`, and
/// everything else falls through to the static UI bundle. Includes a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG`
/// level using the `tracing` ecosystem.
pub fn build(state: AppState, assets: &StaticFiles) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .nest("/ws", crate::ws::routes())
        .nest("/api", crate::api::routes());

    assets
        .mount(router)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
