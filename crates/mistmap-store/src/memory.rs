//! In-memory implementation of the document store, for tests.
//!
//! Behaves like [`crate::YamlStore`] including world scoping and id
//! validation, but keeps documents in a map. Scoped documents are keyed
//! by their world so switching worlds exposes a different catalog, just
//! as switching folders does on disk.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::error::StoreError;
use crate::{DocKind, DocumentStore, validate_id};

/// Shelf a document lives on: world documents share one shelf, scoped
/// documents get one shelf per (world, folder) pair.
type Shelf = (String, String);

#[derive(Debug, Default)]
struct Inner {
    docs: BTreeMap<(Shelf, String), Value>,
    scope: Option<String>,
}

/// An in-memory document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        match self.inner.read() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    fn with_inner_mut<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        match self.inner.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn shelf(kind: DocKind, scope: Option<&String>) -> Result<Shelf, StoreError> {
        match kind.folder() {
            None => Ok((String::new(), "worlds".to_owned())),
            Some(folder) => scope
                .cloned()
                .ok_or(StoreError::NoWorldSelected)
                .map(|world| (world, folder.to_owned())),
        }
    }
}

impl DocumentStore for MemoryStore {
    fn load(&self, kind: DocKind, id: &str) -> Result<Value, StoreError> {
        validate_id(id)?;
        self.with_inner(|inner| {
            let shelf = Self::shelf(kind, inner.scope.as_ref())?;
            inner
                .docs
                .get(&(shelf, id.to_owned()))
                .cloned()
                .ok_or(StoreError::NotFound {
                    kind,
                    id: id.to_owned(),
                })
        })
    }

    fn save(&self, kind: DocKind, id: &str, doc: &Value) -> Result<(), StoreError> {
        validate_id(id)?;
        self.with_inner_mut(|inner| {
            let shelf = Self::shelf(kind, inner.scope.as_ref())?;
            inner.docs.insert((shelf, id.to_owned()), doc.clone());
            Ok(())
        })
    }

    fn list(&self, kind: DocKind) -> Result<Vec<Value>, StoreError> {
        self.with_inner(|inner| {
            let shelf = Self::shelf(kind, inner.scope.as_ref())?;
            Ok(inner
                .docs
                .iter()
                .filter(|((s, _), _)| *s == shelf)
                .map(|(_, doc)| doc.clone())
                .collect())
        })
    }

    fn set_world(&self, world: Option<&str>) -> Result<(), StoreError> {
        if let Some(id) = world {
            validate_id(id)?;
        }
        self.with_inner_mut(|inner| {
            inner.scope = world.map(ToOwned::to_owned);
        });
        Ok(())
    }

    fn world_scope(&self) -> Option<String> {
        self.with_inner(|inner| inner.scope.clone())
    }
}
