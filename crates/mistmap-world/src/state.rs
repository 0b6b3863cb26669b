//! The active world and its write-through document cache.
//!
//! [`WorldState`] owns the "currently selected world" that the original
//! tooling kept as process-global state -- here it is an explicit value,
//! mutated only through the operations below and threaded through every
//! call. Regions and creatures of the active world are cached in memory;
//! every mutation persists through the store before the cache is touched,
//! so a failed save leaves both store and cache unchanged.
//!
//! Reads (`&self`) serve from the cache and never mutate it, which lets
//! the gateway run viewer snapshots under a shared lock while mutations
//! hold the exclusive one.

use std::collections::BTreeMap;
use std::sync::Arc;

use mistmap_store::{DocKind, DocumentStore};
use mistmap_types::{Creature, Region, Species, VisibleCreature, VisibleRegion, World};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::error::WorldError;
use crate::fog;

/// The active world document plus cached catalogs of its contents.
#[derive(Debug, Clone)]
struct ActiveWorld {
    world: World,
    regions: BTreeMap<String, Region>,
    creatures: BTreeMap<String, Creature>,
}

/// In-memory representation of the currently active world set.
///
/// Backed by a [`DocumentStore`]; see the module docs for the cache and
/// persistence discipline.
pub struct WorldState {
    store: Arc<dyn DocumentStore>,
    active: Option<ActiveWorld>,
}

impl WorldState {
    /// Create a world state with no active world over the given store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            active: None,
        }
    }

    /// The active world document, if a world has been selected.
    pub fn active_world(&self) -> Option<&World> {
        self.active.as_ref().map(|a| &a.world)
    }

    /// Id of the region currently shown, if a world is active.
    pub fn current_region_id(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.world.current_region.as_str())
    }

    /// List every world the store knows about.
    pub fn worlds(&self) -> Result<Vec<World>, WorldError> {
        self.store
            .list(DocKind::World)?
            .into_iter()
            .map(|value| decode_listed(DocKind::World, value))
            .collect()
    }

    /// Activate a world: load its document and catalog caches.
    ///
    /// Only the selection changes; nothing is persisted. On any failure
    /// the previous active world (and store scope) is left intact.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidId`] for ids containing a path separator,
    /// [`WorldError::NotFound`] if the world document is absent,
    /// [`WorldError::InvalidDocument`] if any catalog document is
    /// malformed.
    pub fn set_active_world(&mut self, world_id: &str) -> Result<World, WorldError> {
        mistmap_store::validate_id(world_id)?;
        let world: World = decode(
            DocKind::World,
            world_id,
            self.store.load(DocKind::World, world_id)?,
        )?;

        let previous = self.store.world_scope();
        self.store.set_world(Some(world_id))?;
        match self.load_catalogs() {
            Ok((regions, creatures)) => {
                // The world document must point at a region that exists;
                // catching it here keeps the previous world intact.
                if !regions.contains_key(&world.current_region) {
                    let _ = self.store.set_world(previous.as_deref());
                    return Err(WorldError::InvalidDocument {
                        kind: DocKind::World,
                        id: world_id.to_owned(),
                        reason: format!(
                            "current_region {:?} does not exist",
                            world.current_region
                        ),
                    });
                }
                info!(
                    world = world_id,
                    regions = regions.len(),
                    creatures = creatures.len(),
                    "world activated"
                );
                self.active = Some(ActiveWorld {
                    world: world.clone(),
                    regions,
                    creatures,
                });
                Ok(world)
            }
            Err(e) => {
                // The previous scope was valid when it was set; restoring
                // it cannot fail on id grounds.
                let _ = self.store.set_world(previous.as_deref());
                Err(e)
            }
        }
    }

    fn load_catalogs(
        &self,
    ) -> Result<(BTreeMap<String, Region>, BTreeMap<String, Creature>), WorldError> {
        let mut regions = BTreeMap::new();
        for value in self.store.list(DocKind::Region)? {
            let region: Region = decode_listed(DocKind::Region, value)?;
            regions.insert(region.id.clone(), region);
        }
        let mut creatures = BTreeMap::new();
        for value in self.store.list(DocKind::Creature)? {
            let creature: Creature = decode_listed(DocKind::Creature, value)?;
            creatures.insert(creature.id.clone(), creature);
        }
        Ok((regions, creatures))
    }

    /// Make a region of the active world current, persisting the world
    /// document.
    ///
    /// # Errors
    ///
    /// [`WorldError::NoActiveWorld`] without an active world,
    /// [`WorldError::InvalidId`] for separator ids,
    /// [`WorldError::NotFound`] if the region is not in the catalog; store
    /// failures abort before the cache is touched.
    pub fn set_active_region(&mut self, region_id: &str) -> Result<World, WorldError> {
        mistmap_store::validate_id(region_id)?;
        let active = self.active.as_mut().ok_or(WorldError::NoActiveWorld)?;
        if !active.regions.contains_key(region_id) {
            return Err(WorldError::NotFound {
                kind: DocKind::Region,
                id: region_id.to_owned(),
            });
        }

        let mut world = active.world.clone();
        world.current_region = region_id.to_owned();
        let doc = serde_json::to_value(&world)?;
        self.store.save(DocKind::World, &world.id, &doc)?;
        active.world = world.clone();
        Ok(world)
    }

    /// Replace a region document wholesale, persisting it.
    ///
    /// # Errors
    ///
    /// [`WorldError::InvalidDocument`] if `current_state` does not name an
    /// entry in `states` (checked here, at construction, not at use
    /// sites); [`WorldError::NoActiveWorld`] without an active world.
    pub fn replace_region(&mut self, region: Region) -> Result<(), WorldError> {
        if !region.states.contains_key(&region.current_state) {
            return Err(WorldError::InvalidDocument {
                kind: DocKind::Region,
                id: region.id.clone(),
                reason: format!("current_state {:?} is not a state", region.current_state),
            });
        }
        let active = self.active.as_mut().ok_or(WorldError::NoActiveWorld)?;
        let doc = serde_json::to_value(&region)?;
        self.store.save(DocKind::Region, &region.id, &doc)?;
        active.regions.insert(region.id.clone(), region);
        Ok(())
    }

    /// Replace a creature document wholesale, persisting it.
    ///
    /// # Errors
    ///
    /// [`WorldError::NoActiveWorld`] without an active world; store
    /// failures abort before the cache is touched.
    pub fn replace_creature(&mut self, creature: Creature) -> Result<(), WorldError> {
        let active = self.active.as_mut().ok_or(WorldError::NoActiveWorld)?;
        let doc = serde_json::to_value(&creature)?;
        self.store.save(DocKind::Creature, &creature.id, &doc)?;
        active.creatures.insert(creature.id.clone(), creature);
        Ok(())
    }

    /// Look up a region of the active world by id.
    pub fn region(&self, region_id: &str) -> Result<&Region, WorldError> {
        let active = self.active.as_ref().ok_or(WorldError::NoActiveWorld)?;
        active.regions.get(region_id).ok_or_else(|| WorldError::NotFound {
            kind: DocKind::Region,
            id: region_id.to_owned(),
        })
    }

    /// Compute the viewer projection of a region via the visibility engine.
    pub fn visible_region(&self, region_id: &str) -> Result<VisibleRegion, WorldError> {
        fog::compute_visible(self.region(region_id)?)
    }

    /// The viewer-facing creatures of a region: `visible == true` only,
    /// sprites resolved through their species.
    ///
    /// Species documents load on demand, memoized per call.
    pub fn visible_creatures(&self, region_id: &str) -> Result<Vec<VisibleCreature>, WorldError> {
        let active = self.active.as_ref().ok_or(WorldError::NoActiveWorld)?;
        let mut species_seen: BTreeMap<String, Species> = BTreeMap::new();
        let mut visible = Vec::new();

        for creature in active.creatures.values() {
            if !creature.visible || creature.current_region != region_id {
                continue;
            }
            if !species_seen.contains_key(&creature.species) {
                let species: Species = decode(
                    DocKind::Species,
                    &creature.species,
                    self.store.load(DocKind::Species, &creature.species)?,
                )?;
                species_seen.insert(creature.species.clone(), species);
            }
            let Some(species) = species_seen.get(&creature.species) else {
                continue;
            };
            let sprite = species.states.get(&creature.current_state).ok_or_else(|| {
                WorldError::UnknownState {
                    id: species.id.clone(),
                    state: creature.current_state.clone(),
                }
            })?;
            visible.push(VisibleCreature {
                name: creature.name.clone(),
                position: creature.position,
                image: sprite.image.clone(),
                width: sprite.width,
                height: sprite.height,
            });
        }
        Ok(visible)
    }

    /// The full region catalog of the active world (controller snapshot).
    pub fn regions(&self) -> Result<Vec<Region>, WorldError> {
        let active = self.active.as_ref().ok_or(WorldError::NoActiveWorld)?;
        Ok(active.regions.values().cloned().collect())
    }

    /// The full creature catalog of the active world (controller snapshot).
    pub fn creatures(&self) -> Result<Vec<Creature>, WorldError> {
        let active = self.active.as_ref().ok_or(WorldError::NoActiveWorld)?;
        Ok(active.creatures.values().cloned().collect())
    }
}

/// Decode a loaded document into its typed form.
fn decode<T: DeserializeOwned>(kind: DocKind, id: &str, value: Value) -> Result<T, WorldError> {
    serde_json::from_value(value).map_err(|e| WorldError::InvalidDocument {
        kind,
        id: id.to_owned(),
        reason: e.to_string(),
    })
}

/// Decode a listed document, pulling the id out of the raw value for the
/// error message since the caller does not know it yet.
fn decode_listed<T: DeserializeOwned>(kind: DocKind, value: Value) -> Result<T, WorldError> {
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<missing id>")
        .to_owned();
    decode(kind, &id, value)
}
