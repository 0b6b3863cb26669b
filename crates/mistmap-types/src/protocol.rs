//! WebSocket wire format for both channel roles.
//!
//! Every frame is a JSON object tagged by `event`, with the payload under
//! `data` -- adjacently tagged serde enums, so deserialization doubles as
//! the payload schema check for each event. Controller requests carry a
//! top-level `credential` field alongside the event tag; the gateway
//! re-validates it on every request, not just at connect time.
//!
//! # Controller wire examples
//!
//! ```json
//! {"credential": "s3cret", "event": "connect"}
//! {"credential": "s3cret", "event": "change_world", "data": "westeros"}
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::model::{Creature, Region, World};
use crate::visible::{VisibleCreature, VisibleRegion, VisibleWorld};

// ---------------------------------------------------------------------------
// Controller channel: client -> server
// ---------------------------------------------------------------------------

/// A request frame on the controller channel.
///
/// The credential rides outside the event tag so that every operation --
/// not only the handshake -- can be re-authenticated uniformly before
/// dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ControllerRequest {
    /// Shared-secret credential, checked on every request.
    pub credential: String,
    /// The operation to perform.
    #[serde(flatten)]
    pub command: ControllerCommand,
}

/// Operations a controller may request.
///
/// The dispatcher's match over this enum is the (channel role, event) ->
/// handler table: the event tag selects the handler, serde enforces the
/// payload schema, and the credential check runs before any arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ControllerCommand {
    /// Handshake. Must be the first frame on a controller connection.
    Connect,
    /// Activate a world by id and show its default region.
    ChangeWorld(String),
    /// Show a region of the active world by id.
    ChangeRegion(String),
    /// Replace a region document wholesale.
    UpdateRegion(Box<Region>),
    /// Replace a creature document wholesale.
    UpdateCreature(Creature),
}

// ---------------------------------------------------------------------------
// Controller channel: server -> client
// ---------------------------------------------------------------------------

/// Events the server pushes to controller connections.
///
/// Controllers receive full, unredacted documents plus the live viewer
/// counter. `Error` is only ever sent directly to the controller whose
/// request failed, never broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// Handshake accepted.
    Connected,
    /// The catalog of known worlds.
    UpdateWorlds(Vec<World>),
    /// The active world changed (full document).
    ChangeWorld(World),
    /// The full region catalog of the active world.
    UpdateRegions(Vec<Region>),
    /// The full creature catalog of the active world.
    UpdateCreatures(Vec<Creature>),
    /// Number of currently connected viewers.
    UpdateDisplayCounter(u32),
    /// A request from this controller was rejected.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Viewer channel: server -> client
// ---------------------------------------------------------------------------

/// Events the server pushes to viewer connections.
///
/// Viewers only ever receive derived projections. Every broadcast is
/// fan-out: all connected viewers receive the same frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ViewerEvent {
    /// Connection accepted.
    Connected,
    /// The active world changed.
    ChangeWorld(VisibleWorld),
    /// A different region is now shown.
    ChangeRegion(VisibleRegion),
    /// The shown region's revealed area changed.
    UpdateRegion(VisibleRegion),
    /// The shown region's creature list changed.
    UpdateCreatures(Vec<VisibleCreature>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_request_wire_shape() {
        let json = r#"{"credential": "hunter2", "event": "change_world", "data": "westeros"}"#;
        let req: Result<ControllerRequest, _> = serde_json::from_str(json);
        assert_eq!(
            req.ok(),
            Some(ControllerRequest {
                credential: "hunter2".to_owned(),
                command: ControllerCommand::ChangeWorld("westeros".to_owned()),
            })
        );
    }

    #[test]
    fn connect_request_has_no_data() {
        let json = r#"{"credential": "hunter2", "event": "connect"}"#;
        let req: Result<ControllerRequest, _> = serde_json::from_str(json);
        assert!(matches!(
            req.ok().map(|r| r.command),
            Some(ControllerCommand::Connect)
        ));
    }

    #[test]
    fn missing_credential_is_rejected() {
        let json = r#"{"event": "change_world", "data": "westeros"}"#;
        let req: Result<ControllerRequest, _> = serde_json::from_str(json);
        assert!(req.is_err());
    }

    #[test]
    fn viewer_event_names_are_snake_case() {
        let event = ViewerEvent::UpdateCreatures(Vec::new());
        let value = serde_json::to_value(&event).ok();
        assert!(value.is_some());
        if let Some(v) = value {
            assert_eq!(v["event"], "update_creatures");
        }
    }
}
