//! Controller command dispatch and the serialized mutation path.
//!
//! [`dispatch`] is the (channel role, event) -> handler table for the
//! controller channel: the credential check runs uniformly before any
//! arm, serde has already enforced the payload schema, and the match
//! selects the handler. Direct replies (the connect snapshot) come back
//! as the return value; everything else leaves through the broadcast
//! channels.
//!
//! Every mutation follows the same discipline while holding the world
//! write lock: validate, stage the derived payloads, persist, commit the
//! cache, then broadcast. A failure anywhere before the persist leaves
//! nothing applied; a persist failure aborts with no broadcast. Nothing
//! is ever broadcast for a failed operation.

use std::sync::Arc;

use mistmap_types::{
    ControllerCommand, ControllerEvent, ControllerRequest, Creature, Region, ViewerEvent,
    VisibleWorld,
};
use mistmap_world::WorldError;
use tracing::info;

use crate::error::GatewayError;
use crate::state::AppState;

/// Authenticate and execute one controller request.
///
/// Returns the events to send directly back to the requesting controller
/// (broadcasts to other connections happen inside the handlers).
///
/// # Errors
///
/// [`GatewayError::Auth`] on a bad credential -- the caller must
/// terminate the connection. Any other error is safe to report to the
/// controller as an `error` event; no state was partially applied and no
/// broadcast was produced.
pub async fn dispatch(
    state: &Arc<AppState>,
    request: ControllerRequest,
) -> Result<Vec<ControllerEvent>, GatewayError> {
    // Re-validated on every call, not just at connect time.
    if !state.auth.authenticate(&request.credential) {
        return Err(GatewayError::Auth);
    }

    match request.command {
        ControllerCommand::Connect => connect_snapshot(state).await,
        ControllerCommand::ChangeWorld(world_id) => {
            change_world(state, &world_id).await.map(|()| Vec::new())
        }
        ControllerCommand::ChangeRegion(region_id) => {
            change_region(state, &region_id).await.map(|()| Vec::new())
        }
        ControllerCommand::UpdateRegion(region) => {
            update_region(state, *region).await.map(|()| Vec::new())
        }
        ControllerCommand::UpdateCreature(creature) => {
            update_creature(state, creature).await.map(|()| Vec::new())
        }
    }
}

/// The full catalog snapshot a freshly connected controller needs to
/// operate without prior context.
async fn connect_snapshot(state: &Arc<AppState>) -> Result<Vec<ControllerEvent>, GatewayError> {
    let world = state.world.read().await;
    let mut events = vec![
        ControllerEvent::Connected,
        ControllerEvent::UpdateWorlds(world.worlds()?),
    ];
    if let Some(active) = world.active_world() {
        events.push(ControllerEvent::ChangeWorld(active.clone()));
        events.push(ControllerEvent::UpdateRegions(world.regions()?));
        events.push(ControllerEvent::UpdateCreatures(world.creatures()?));
    }
    events.push(ControllerEvent::UpdateDisplayCounter(
        state.sessions.snapshot().viewer_count,
    ));
    Ok(events)
}

/// The derived snapshot a freshly connected viewer needs to see exactly
/// what every already-connected viewer sees.
///
/// Callers must subscribe to the viewer broadcast channel *before*
/// invoking this, so no mutation can slip between snapshot and stream.
pub async fn viewer_snapshot(state: &Arc<AppState>) -> Result<Vec<ViewerEvent>, GatewayError> {
    let world = state.world.read().await;
    let mut events = vec![ViewerEvent::Connected];
    if let Some(active) = world.active_world() {
        let region_id = active.current_region.clone();
        events.push(ViewerEvent::ChangeWorld(VisibleWorld {
            name: active.name.clone(),
        }));
        events.push(ViewerEvent::ChangeRegion(world.visible_region(&region_id)?));
        events.push(ViewerEvent::UpdateCreatures(
            world.visible_creatures(&region_id)?,
        ));
    }
    Ok(events)
}

/// Activate a world and show its default region.
///
/// Selection only -- nothing extra is persisted. Controllers receive the
/// full world plus refreshed catalogs; viewers receive the derived
/// projection of the world's default region.
async fn change_world(state: &Arc<AppState>, world_id: &str) -> Result<(), GatewayError> {
    let mut world = state.world.write().await;
    let active = world.set_active_world(world_id)?;
    let region_id = active.current_region.clone();

    let visible_region = world.visible_region(&region_id)?;
    let visible_creatures = world.visible_creatures(&region_id)?;
    let regions = world.regions()?;
    let creatures = world.creatures()?;

    state
        .sessions
        .set_active(Some(active.id.clone()), Some(region_id));
    info!(world = world_id, "world changed");

    state.broadcast_controllers(ControllerEvent::ChangeWorld(active.clone()));
    state.broadcast_controllers(ControllerEvent::UpdateRegions(regions));
    state.broadcast_controllers(ControllerEvent::UpdateCreatures(creatures));

    state.broadcast_viewers(ViewerEvent::ChangeWorld(VisibleWorld { name: active.name }));
    state.broadcast_viewers(ViewerEvent::ChangeRegion(visible_region));
    state.broadcast_viewers(ViewerEvent::UpdateCreatures(visible_creatures));
    Ok(())
}

/// Show a region of the active world, persisting the selection.
async fn change_region(state: &Arc<AppState>, region_id: &str) -> Result<(), GatewayError> {
    validate_id(region_id)?;
    let mut world = state.world.write().await;

    // Stage the derived payloads first: if the region is missing or its
    // document is broken, nothing has been persisted yet.
    let visible_region = world.visible_region(region_id)?;
    let visible_creatures = world.visible_creatures(region_id)?;

    world.set_active_region(region_id)?;
    state.sessions.set_region(Some(region_id.to_owned()));
    info!(region = region_id, "region changed");

    state.broadcast_viewers(ViewerEvent::ChangeRegion(visible_region));
    state.broadcast_viewers(ViewerEvent::UpdateCreatures(visible_creatures));
    Ok(())
}

/// Replace a region document; refresh viewers if it is the one shown.
async fn update_region(state: &Arc<AppState>, region: Region) -> Result<(), GatewayError> {
    let region_id = region.id.clone();
    let mut world = state.world.write().await;
    world.replace_region(region)?;

    state.broadcast_controllers(ControllerEvent::UpdateRegions(world.regions()?));
    if world.current_region_id() == Some(region_id.as_str()) {
        let visible_region = world.visible_region(&region_id)?;
        state.broadcast_viewers(ViewerEvent::UpdateRegion(visible_region));
    }
    info!(region = region_id, "region updated");
    Ok(())
}

/// Replace a creature document; refresh viewers if it stands in the
/// shown region.
async fn update_creature(state: &Arc<AppState>, creature: Creature) -> Result<(), GatewayError> {
    let creature_region = creature.current_region.clone();
    let creature_id = creature.id.clone();
    let mut world = state.world.write().await;
    world.replace_creature(creature)?;

    state.broadcast_controllers(ControllerEvent::UpdateCreatures(world.creatures()?));
    if world.current_region_id() == Some(creature_region.as_str()) {
        let visible_creatures = world.visible_creatures(&creature_region)?;
        state.broadcast_viewers(ViewerEvent::UpdateCreatures(visible_creatures));
    }
    info!(creature = creature_id, "creature updated");
    Ok(())
}

/// Reject ids that contain a path separator before anything else runs.
fn validate_id(id: &str) -> Result<(), GatewayError> {
    mistmap_store::validate_id(id)
        .map_err(|e| GatewayError::World(WorldError::from(e)))
}
