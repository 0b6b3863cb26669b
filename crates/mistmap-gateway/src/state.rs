//! Shared application state for the gateway server.
//!
//! [`AppState`] holds the world state behind a read-write lock, the two
//! broadcast channels (one per channel role), the auth guard, and the
//! session registry. It is wrapped in [`Arc`] and injected via Axum's
//! `State` extractor.
//!
//! The lock is the single-writer path: a mutation holds the write guard
//! across persist, recompute, and broadcast, so broadcasts leave in the
//! same order mutations commit. Viewer snapshots take the read guard and
//! can never observe a half-applied mutation.

use std::path::PathBuf;
use std::sync::Arc;

use mistmap_types::{ControllerEvent, ViewerEvent};
use mistmap_world::WorldState;
use tokio::sync::{RwLock, broadcast};

use crate::auth::AuthGuard;
use crate::session::SessionRegistry;

/// Capacity of each role's broadcast channel.
///
/// A connection that falls more than this many messages behind is
/// disconnected rather than allowed to stall the channel.
const BROADCAST_CAPACITY: usize = 256;

/// Shared state for the Axum application.
pub struct AppState {
    /// The active world and its document cache.
    pub world: RwLock<WorldState>,
    /// Shared-secret validator for the controller channel.
    pub auth: AuthGuard,
    /// Active world/region ids and the viewer counter.
    pub sessions: SessionRegistry,
    /// The worlds root folder, for static image serving.
    pub worlds_root: PathBuf,
    /// Broadcast sender for controller-channel events.
    controller_tx: broadcast::Sender<ControllerEvent>,
    /// Broadcast sender for viewer-channel events.
    viewer_tx: broadcast::Sender<ViewerEvent>,
}

impl AppState {
    /// Assemble the application state.
    pub fn new(world: WorldState, auth: AuthGuard, worlds_root: PathBuf) -> Arc<Self> {
        let (controller_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let (viewer_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Arc::new(Self {
            world: RwLock::new(world),
            auth,
            sessions: SessionRegistry::new(),
            worlds_root,
            controller_tx,
            viewer_tx,
        })
    }

    /// Subscribe to controller-channel broadcasts.
    pub fn subscribe_controllers(&self) -> broadcast::Receiver<ControllerEvent> {
        self.controller_tx.subscribe()
    }

    /// Subscribe to viewer-channel broadcasts.
    pub fn subscribe_viewers(&self) -> broadcast::Receiver<ViewerEvent> {
        self.viewer_tx.subscribe()
    }

    /// Fan an event out to every connected controller.
    ///
    /// Returns the number of receivers; 0 when no controller is connected,
    /// which is not an error.
    pub fn broadcast_controllers(&self, event: ControllerEvent) -> usize {
        // send errs only when there are zero receivers, which is normal
        // when no controller is connected.
        self.controller_tx.send(event).unwrap_or(0)
    }

    /// Fan an event out to every connected viewer.
    pub fn broadcast_viewers(&self, event: ViewerEvent) -> usize {
        self.viewer_tx.send(event).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use mistmap_store::{DocumentStore, MemoryStore};
    use mistmap_types::VisibleWorld;

    use super::*;

    fn make_state() -> Arc<AppState> {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        AppState::new(
            WorldState::new(store),
            AuthGuard::new("hunter2"),
            PathBuf::from("worlds"),
        )
    }

    #[tokio::test]
    async fn broadcast_reaches_subscriber() {
        let state = make_state();
        let mut rx = state.subscribe_viewers();

        let event = ViewerEvent::ChangeWorld(VisibleWorld {
            name: "Westeros".to_owned(),
        });
        let receivers = state.broadcast_viewers(event.clone());
        assert_eq!(receivers, 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn broadcast_without_subscribers_is_not_an_error() {
        let state = make_state();
        let receivers = state.broadcast_controllers(ControllerEvent::UpdateDisplayCounter(0));
        assert_eq!(receivers, 0);
    }
}
