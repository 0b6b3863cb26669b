//! Axum router construction for the gateway.
//!
//! Assembles the status page, both `WebSocket` channel roles, and the
//! image route into a single [`Router`] with CORS middleware enabled so
//! browser map clients can connect cross-origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/controller` -- moderator `WebSocket` channel
/// - `GET /ws/viewer` -- display `WebSocket` channel
/// - `GET /images/{*path}` -- active world's images (containment-checked)
///
/// CORS is configured to allow any origin for development. In production
/// this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket channels
        .route("/ws/controller", get(ws::ws_controller))
        .route("/ws/viewer", get(ws::ws_viewer))
        // Static assets
        .route("/images/{*path}", get(handlers::image))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
