//! Error types for the `mistmap-world` crate.

use mistmap_store::{DocKind, StoreError};

/// Errors that can occur during world-state and visibility operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A mutating operation required an active world and none is set.
    #[error("no active world")]
    NoActiveWorld,

    /// A world or region id contains a path separator.
    #[error("invalid id: {0:?}")]
    InvalidId(String),

    /// A referenced document does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The missing document's kind.
        kind: DocKind,
        /// The missing document's id.
        id: String,
    },

    /// A document violates a model invariant or failed to decode.
    #[error("invalid {kind} document {id}: {reason}")]
    InvalidDocument {
        /// The offending document's kind.
        kind: DocKind,
        /// The offending document's id.
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A `current_state` key does not name an entry in its states map.
    #[error("{id} has no state named {state:?}")]
    UnknownState {
        /// Id of the region or species document.
        id: String,
        /// The missing state name.
        state: String,
    },

    /// A document failed to serialize for persistence.
    #[error("document encoding error: {source}")]
    Encode {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// The document store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        source: StoreError,
    },
}

impl From<StoreError> for WorldError {
    fn from(e: StoreError) -> Self {
        // Absent documents and bad ids keep their identity across the
        // store boundary; everything else is an opaque store failure.
        match e {
            StoreError::NotFound { kind, id } => Self::NotFound { kind, id },
            StoreError::InvalidId(id) => Self::InvalidId(id),
            other => Self::Store { source: other },
        }
    }
}
