//! WebSocket handlers for the two channel roles.
//!
//! **Controller** (`GET /ws/controller`): bidirectional. The first frame
//! must be a valid `connect` request; the connection then moves
//! Connecting -> Authenticated -> Open and receives the catalog
//! snapshot. Every later request is re-authenticated before dispatch; a
//! bad credential closes the connection, any other failure comes back as
//! an `error` event.
//!
//! **Viewer** (`GET /ws/viewer`): receive-only, unauthenticated. On open
//! the viewer receives the current derived snapshot, then the broadcast
//! stream. Each connection owns an independent broadcast receiver; one
//! that lags past the channel capacity is disconnected rather than
//! allowed to stall the mutating path.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use mistmap_types::{ConnectionId, ControllerCommand, ControllerEvent, ControllerRequest, ViewerEvent};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::commands;
use crate::error::GatewayError;
use crate::state::AppState;

/// Upgrade an HTTP request into a controller channel.
///
/// # Route
///
/// `GET /ws/controller`
pub async fn ws_controller(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_controller(socket, state))
}

/// Upgrade an HTTP request into a viewer channel.
///
/// # Route
///
/// `GET /ws/viewer`
pub async fn ws_viewer(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_viewer(socket, state))
}

// ---------------------------------------------------------------------------
// Controller channel
// ---------------------------------------------------------------------------

async fn handle_controller(mut socket: WebSocket, state: Arc<AppState>) {
    let connection = ConnectionId::new();
    debug!(%connection, "controller connecting");

    // Connecting -> Authenticated: the first frame must be a connect
    // request carrying a valid credential. Anything else terminates the
    // connection with no state change and no broadcast.
    let Some(handshake) = read_request(&mut socket).await else {
        debug!(%connection, "controller closed before handshake");
        return;
    };
    if !matches!(handshake.command, ControllerCommand::Connect) {
        warn!(%connection, "controller sent a command before connect");
        return;
    }

    // Subscribe before the snapshot so no broadcast can slip between.
    let mut rx = state.subscribe_controllers();

    match commands::dispatch(&state, handshake).await {
        Ok(events) => {
            for event in events {
                if send_json(&mut socket, &event).await.is_err() {
                    return;
                }
            }
        }
        Err(GatewayError::Auth) => {
            warn!(%connection, "controller failed authentication");
            return;
        }
        Err(e) => {
            warn!(%connection, error = %e, "controller snapshot failed");
            let _ = send_json(&mut socket, &ControllerEvent::Error {
                message: e.to_string(),
            })
            .await;
            return;
        }
    }
    info!(%connection, "controller open");

    loop {
        tokio::select! {
            // A broadcast from the mutation path.
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if send_json(&mut socket, &event).await.is_err() {
                            debug!(%connection, "controller disconnected (send failed)");
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%connection, skipped, "controller lagged, disconnecting");
                        return;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(%connection, "broadcast channel closed");
                        return;
                    }
                }
            }
            // A request from this controller.
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ControllerRequest>(text.as_str()) {
                            Ok(request) => {
                                if handle_request(&state, &mut socket, connection, request)
                                    .await
                                    .is_err()
                                {
                                    return;
                                }
                            }
                            Err(e) => {
                                let reply = ControllerEvent::Error {
                                    message: format!("malformed request: {e}"),
                                };
                                if send_json(&mut socket, &reply).await.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%connection, "controller disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%connection, error = %e, "controller socket error");
                        return;
                    }
                    _ => {
                        // Ignore binary and pong frames.
                    }
                }
            }
        }
    }
}

/// Dispatch one in-session controller request.
///
/// `Err(())` means the connection must close (auth failure or a dead
/// socket); recoverable rejections have already been reported as an
/// `error` event.
async fn handle_request(
    state: &Arc<AppState>,
    socket: &mut WebSocket,
    connection: ConnectionId,
    request: ControllerRequest,
) -> Result<(), ()> {
    match commands::dispatch(state, request).await {
        Ok(events) => {
            for event in events {
                if send_json(socket, &event).await.is_err() {
                    return Err(());
                }
            }
            Ok(())
        }
        Err(GatewayError::Auth) => {
            warn!(%connection, "controller re-authentication failed, closing");
            Err(())
        }
        Err(e) => {
            debug!(%connection, error = %e, "controller request rejected");
            let reply = ControllerEvent::Error {
                message: e.to_string(),
            };
            send_json(socket, &reply).await.map_err(|_| ())
        }
    }
}

/// Read frames until a parseable controller request arrives.
///
/// Returns `None` when the socket closes, errors, or sends a frame that
/// is not a valid request -- at handshake time all of those mean
/// disconnect.
async fn read_request(socket: &mut WebSocket) -> Option<ControllerRequest> {
    loop {
        match socket.recv().await? {
            Ok(Message::Text(text)) => return serde_json::from_str(text.as_str()).ok(),
            Ok(Message::Ping(data)) => {
                socket.send(Message::Pong(data)).await.ok()?;
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Viewer channel
// ---------------------------------------------------------------------------

async fn handle_viewer(mut socket: WebSocket, state: Arc<AppState>) {
    let connection = ConnectionId::new();
    debug!(%connection, "viewer connecting");

    // Subscribe before reading the snapshot: a mutation landing in
    // between is then delivered by the receiver, so a late joiner can
    // never observe older state than an existing peer.
    let mut rx = state.subscribe_viewers();

    let snapshot = match commands::viewer_snapshot(&state).await {
        Ok(events) => events,
        Err(e) => {
            warn!(%connection, error = %e, "viewer snapshot failed");
            return;
        }
    };
    for event in snapshot {
        if send_json(&mut socket, &event).await.is_err() {
            return;
        }
    }

    let viewers = state.sessions.increment_viewers();
    state.broadcast_controllers(ControllerEvent::UpdateDisplayCounter(viewers));
    info!(%connection, viewers, "viewer open");

    viewer_loop(&mut socket, &mut rx, connection).await;

    let viewers = state.sessions.decrement_viewers();
    state.broadcast_controllers(ControllerEvent::UpdateDisplayCounter(viewers));
    debug!(%connection, viewers, "viewer closed");
}

async fn viewer_loop(
    socket: &mut WebSocket,
    rx: &mut broadcast::Receiver<ViewerEvent>,
    connection: ConnectionId,
) {
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if send_json(socket, &event).await.is_err() {
                            debug!(%connection, "viewer disconnected (send failed)");
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Backpressure policy: a viewer this far behind is
                        // cut loose instead of stalling the channel.
                        warn!(%connection, skipped, "viewer lagged, disconnecting");
                        return;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(%connection, "broadcast channel closed");
                        return;
                    }
                }
            }
            frame = socket.recv() => {
                match frame {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(%connection, "viewer disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(%connection, error = %e, "viewer socket error");
                        return;
                    }
                    _ => {
                        // The viewer channel is receive-only; inbound text
                        // and binary frames are ignored.
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serialize an event and send it as a text frame.
async fn send_json<T: Serialize>(socket: &mut WebSocket, event: &T) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to serialize outbound event");
            return Ok(());
        }
    };
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
