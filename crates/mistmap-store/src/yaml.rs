//! YAML-folder implementation of the document store.
//!
//! Layout under the worlds root:
//!
//! ```text
//! worlds/
//!   westeros/
//!     world.yaml
//!     regions/<id>.yaml
//!     creatures/<id>.yaml
//!     species/<id>.yaml
//!     images/...
//! ```
//!
//! The `images/` folder is not touched here; the gateway serves it
//! directly with its own containment check.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde_json::Value;
use tracing::debug;

use crate::error::StoreError;
use crate::{DocKind, DocumentStore, validate_id};

/// File name of the world document inside each world folder.
const WORLD_FILE: &str = "world.yaml";

/// Document store backed by a folder of YAML files, one folder per world.
#[derive(Debug)]
pub struct YamlStore {
    /// The worlds root folder.
    root: PathBuf,
    /// The world that scoped kinds currently resolve under.
    scope: RwLock<Option<String>>,
}

impl YamlStore {
    /// Create a store over the given worlds root folder.
    ///
    /// The folder does not need to exist yet; it is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            scope: RwLock::new(None),
        }
    }

    /// The worlds root folder this store reads and writes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_scope(&self) -> Option<String> {
        match self.scope.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Resolve the on-disk path of a document.
    fn doc_path(&self, kind: DocKind, id: &str) -> Result<PathBuf, StoreError> {
        validate_id(id)?;
        match kind.folder() {
            None => Ok(self.root.join(id).join(WORLD_FILE)),
            Some(folder) => {
                let world = self.read_scope().ok_or(StoreError::NoWorldSelected)?;
                Ok(self
                    .root
                    .join(world)
                    .join(folder)
                    .join(format!("{id}.yaml")))
            }
        }
    }

    fn read_doc(path: &Path, kind: DocKind, id: &str) -> Result<Value, StoreError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound {
                    kind,
                    id: id.to_owned(),
                }
            } else {
                StoreError::Io { source: e }
            }
        })?;
        Ok(serde_yml::from_str(&contents)?)
    }
}

impl DocumentStore for YamlStore {
    fn load(&self, kind: DocKind, id: &str) -> Result<Value, StoreError> {
        let path = self.doc_path(kind, id)?;
        Self::read_doc(&path, kind, id)
    }

    fn save(&self, kind: DocKind, id: &str, doc: &Value) -> Result<(), StoreError> {
        let path = self.doc_path(kind, id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_yml::to_string(doc)?;
        std::fs::write(&path, contents)?;
        debug!(%kind, id, path = %path.display(), "document saved");
        Ok(())
    }

    fn list(&self, kind: DocKind) -> Result<Vec<Value>, StoreError> {
        let dir = match kind.folder() {
            None => self.root.clone(),
            Some(folder) => {
                let world = self.read_scope().ok_or(StoreError::NoWorldSelected)?;
                self.root.join(world).join(folder)
            }
        };

        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        // Collect and sort paths so listings are deterministic across
        // filesystems.
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .collect();
        paths.sort();

        let mut docs = Vec::new();
        for path in paths {
            match kind {
                DocKind::World => {
                    // A world is any subfolder carrying a world.yaml;
                    // stray files and bare folders are skipped.
                    let world_file = path.join(WORLD_FILE);
                    if path.is_dir() && world_file.is_file() {
                        let contents = std::fs::read_to_string(&world_file)?;
                        docs.push(serde_yml::from_str(&contents)?);
                    }
                }
                _ => {
                    if path.extension().and_then(|ext| ext.to_str()) == Some("yaml") {
                        let contents = std::fs::read_to_string(&path)?;
                        docs.push(serde_yml::from_str(&contents)?);
                    }
                }
            }
        }
        Ok(docs)
    }

    fn set_world(&self, world: Option<&str>) -> Result<(), StoreError> {
        if let Some(id) = world {
            validate_id(id)?;
        }
        let value = world.map(ToOwned::to_owned);
        match self.scope.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
        Ok(())
    }

    fn world_scope(&self) -> Option<String> {
        self.read_scope()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    struct TempRoot(PathBuf);

    impl TempRoot {
        fn new() -> Self {
            let path = std::env::temp_dir().join(format!("mistmap-store-{}", uuid::Uuid::new_v4()));
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }
    }

    impl Drop for TempRoot {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    fn world_doc() -> Value {
        json!({"id": "westeros", "name": "Westeros", "current_region": "kings_landing"})
    }

    #[test]
    fn world_round_trip() {
        let root = TempRoot::new();
        let store = YamlStore::new(&root.0);

        store.save(DocKind::World, "westeros", &world_doc()).unwrap();
        let loaded = store.load(DocKind::World, "westeros").unwrap();
        assert_eq!(loaded["name"], "Westeros");

        let listed = store.list(DocKind::World).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn scoped_kinds_require_world() {
        let root = TempRoot::new();
        let store = YamlStore::new(&root.0);

        let err = store.load(DocKind::Region, "keep");
        assert!(matches!(err, Err(StoreError::NoWorldSelected)));

        store.set_world(Some("westeros")).unwrap();
        let err = store.load(DocKind::Region, "keep");
        assert!(matches!(err, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn scoped_round_trip_and_listing() {
        let root = TempRoot::new();
        let store = YamlStore::new(&root.0);
        store.save(DocKind::World, "westeros", &world_doc()).unwrap();
        store.set_world(Some("westeros")).unwrap();

        store
            .save(DocKind::Region, "keep", &json!({"id": "keep", "name": "The Keep"}))
            .unwrap();
        store
            .save(DocKind::Region, "moat", &json!({"id": "moat", "name": "The Moat"}))
            .unwrap();

        let loaded = store.load(DocKind::Region, "keep").unwrap();
        assert_eq!(loaded["name"], "The Keep");

        let listed = store.list(DocKind::Region).unwrap();
        assert_eq!(listed.len(), 2);
        // Sorted by file name.
        assert_eq!(listed.first().unwrap()["id"], "keep");
        assert_eq!(listed.get(1).unwrap()["id"], "moat");
    }

    #[test]
    fn missing_folder_lists_empty() {
        let root = TempRoot::new();
        let store = YamlStore::new(&root.0);
        store.save(DocKind::World, "westeros", &world_doc()).unwrap();
        store.set_world(Some("westeros")).unwrap();

        // No creatures folder was ever created.
        let listed = store.list(DocKind::Creature).unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn traversal_ids_never_touch_disk() {
        let root = TempRoot::new();
        let store = YamlStore::new(&root.0);

        assert!(matches!(
            store.load(DocKind::World, "../escape"),
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.save(DocKind::World, "a/b", &world_doc()),
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(
            store.set_world(Some("..")),
            Err(StoreError::InvalidId(_))
        ));
    }
}
