//! Document storage for the Mistmap fog-of-war server.
//!
//! Worlds, regions, creatures, and species are plain documents keyed by a
//! string id. The [`DocumentStore`] trait is the contract the rest of the
//! workspace consumes; two implementations are provided:
//!
//! - [`YamlStore`] -- the production store, one folder per world with
//!   `world.yaml` at its root and `regions/`, `creatures/`, `species/`
//!   subfolders of `<id>.yaml` files.
//! - [`MemoryStore`] -- an in-memory store for tests.
//!
//! Region, creature, and species documents live inside a world folder, so
//! those three kinds only resolve after [`DocumentStore::set_world`] has
//! selected the active world. World documents themselves are unscoped.
//!
//! Ids double as file and folder names, so every id is validated against
//! path traversal at this layer regardless of what callers already check.

pub mod error;
pub mod memory;
pub mod yaml;

use serde_json::Value;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use yaml::YamlStore;

/// The four document kinds the store distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocKind {
    /// A world document (`world.yaml` in the world's folder).
    World,
    /// A region document, scoped to the active world.
    Region,
    /// A creature document, scoped to the active world.
    Creature,
    /// A species document, scoped to the active world.
    Species,
}

impl DocKind {
    /// The subfolder a scoped kind's documents live in.
    ///
    /// Returns `None` for [`DocKind::World`], which is not stored under a
    /// subfolder.
    pub const fn folder(self) -> Option<&'static str> {
        match self {
            Self::World => None,
            Self::Region => Some("regions"),
            Self::Creature => Some("creatures"),
            Self::Species => Some("species"),
        }
    }
}

impl core::fmt::Display for DocKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::World => "world",
            Self::Region => "region",
            Self::Creature => "creature",
            Self::Species => "species",
        };
        write!(f, "{name}")
    }
}

/// The storage collaborator contract.
///
/// Documents are structured records ([`serde_json::Value`] maps) matching
/// the types in `mistmap-types`; callers convert with serde. No
/// transactional guarantee beyond overwrite being atomic enough for a
/// single mutator.
pub trait DocumentStore: Send + Sync {
    /// Load the document of `kind` with the given id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no such document exists,
    /// [`StoreError::NoWorldSelected`] for scoped kinds before
    /// [`DocumentStore::set_world`], [`StoreError::InvalidId`] for ids
    /// that could escape the store.
    fn load(&self, kind: DocKind, id: &str) -> Result<Value, StoreError>;

    /// Save (create or overwrite) the document of `kind` with the given id.
    ///
    /// # Errors
    ///
    /// Same classes as [`DocumentStore::load`], plus I/O and encoding
    /// failures.
    fn save(&self, kind: DocKind, id: &str, doc: &Value) -> Result<(), StoreError>;

    /// List all documents of `kind`.
    ///
    /// A missing subfolder yields an empty list, not an error: a world
    /// without creatures is a valid world.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoWorldSelected`] for scoped kinds before
    /// [`DocumentStore::set_world`]; I/O and decoding failures.
    fn list(&self, kind: DocKind) -> Result<Vec<Value>, StoreError>;

    /// Select the world that scoped kinds resolve under, or clear it.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidId`] if the world id could escape the store.
    fn set_world(&self, world: Option<&str>) -> Result<(), StoreError>;

    /// The currently selected world scope, if any.
    fn world_scope(&self) -> Option<String>;
}

/// Validate that an id is safe to use as a file or folder name.
///
/// Rejects empty ids, ids containing a path separator, and the dot
/// components that would walk out of the store.
///
/// # Errors
///
/// Returns [`StoreError::InvalidId`] for any id that fails the check.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains('/')
        || id.contains('\\')
        || id.contains('\0')
    {
        return Err(StoreError::InvalidId(id.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traversal_ids_are_rejected() {
        assert!(validate_id("../etc").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("a\\b").is_err());
        assert!(validate_id("..").is_err());
        assert!(validate_id("").is_err());
    }

    #[test]
    fn plain_ids_are_accepted() {
        assert!(validate_id("westeros").is_ok());
        assert!(validate_id("region_01").is_ok());
        assert!(validate_id("old.keep").is_ok());
    }
}
