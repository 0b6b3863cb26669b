//! Session bookkeeping: what is shown, and to how many viewers.
//!
//! [`SessionRegistry`] tracks the active world id, the active region id,
//! and the number of connected viewer channels. Pure bookkeeping, no
//! persistence -- the authoritative world selection lives in
//! [`mistmap_world::WorldState`]; this registry mirrors it for the status
//! page and feeds the live viewer counter broadcast to controllers.

use std::sync::Mutex;

/// A point-in-time copy of the session registry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    /// Id of the active world, if any.
    pub world_id: Option<String>,
    /// Id of the region currently shown, if any.
    pub region_id: Option<String>,
    /// Number of currently connected viewer channels.
    pub viewer_count: u32,
}

/// Tracks the active world, active region, and viewer count.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    inner: Mutex<SessionSnapshot>,
}

impl SessionRegistry {
    /// Create an empty registry: no world, no region, zero viewers.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut SessionSnapshot) -> T) -> T {
        match self.inner.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Record a world change (with the region it starts on).
    pub fn set_active(&self, world_id: Option<String>, region_id: Option<String>) {
        self.with_inner(|s| {
            s.world_id = world_id;
            s.region_id = region_id;
        });
    }

    /// Record a region change within the active world.
    pub fn set_region(&self, region_id: Option<String>) {
        self.with_inner(|s| s.region_id = region_id);
    }

    /// Count a newly opened viewer channel; returns the new count.
    pub fn increment_viewers(&self) -> u32 {
        self.with_inner(|s| {
            s.viewer_count = s.viewer_count.saturating_add(1);
            s.viewer_count
        })
    }

    /// Count a closed viewer channel; returns the new count.
    pub fn decrement_viewers(&self) -> u32 {
        self.with_inner(|s| {
            s.viewer_count = s.viewer_count.saturating_sub(1);
            s.viewer_count
        })
    }

    /// The current (world id, region id, viewer count) triple.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.with_inner(|s| s.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_round_trip() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.increment_viewers(), 1);
        assert_eq!(registry.increment_viewers(), 2);
        assert_eq!(registry.decrement_viewers(), 1);
        assert_eq!(registry.decrement_viewers(), 0);
        // Never goes negative, even if close events double up.
        assert_eq!(registry.decrement_viewers(), 0);
    }

    #[test]
    fn snapshot_reflects_session() {
        let registry = SessionRegistry::new();
        registry.set_active(Some("westeros".to_owned()), Some("kings_landing".to_owned()));
        registry.set_region(Some("winterfell".to_owned()));
        let _ = registry.increment_viewers();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.world_id.as_deref(), Some("westeros"));
        assert_eq!(snapshot.region_id.as_deref(), Some("winterfell"));
        assert_eq!(snapshot.viewer_count, 1);
    }
}
