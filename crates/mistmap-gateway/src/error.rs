//! Error types for the gateway.
//!
//! [`GatewayError`] unifies the failure modes of both surfaces. On the
//! HTTP routes it converts into a response via [`IntoResponse`]; on the
//! WebSocket channels the dispatcher turns it into an `error` event for
//! the initiating controller (except authentication failures, which
//! terminate the connection instead).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mistmap_world::WorldError;

/// Errors that can occur in the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The presented credential does not match the shared secret.
    #[error("authentication failed")]
    Auth,

    /// A malformed request frame.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An image was requested while no world is active.
    #[error("no active world")]
    NoActiveWorld,

    /// An image path resolved outside the active world's image root.
    #[error("path not allowed: {0}")]
    Forbidden(String),

    /// The requested asset does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A world-state operation failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Auth => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            Self::NoActiveWorld => (StatusCode::CONFLICT, self.to_string()),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::World(world) => (world_status(world), self.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// HTTP status for a world-state failure surfaced over a route.
fn world_status(error: &WorldError) -> StatusCode {
    match error {
        WorldError::NotFound { .. } => StatusCode::NOT_FOUND,
        WorldError::InvalidId(_) | WorldError::InvalidDocument { .. } => StatusCode::BAD_REQUEST,
        WorldError::NoActiveWorld => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
