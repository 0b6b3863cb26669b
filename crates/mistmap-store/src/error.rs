//! Error types for the `mistmap-store` crate.

use crate::DocKind;

/// Errors that can occur during document store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document of the given kind exists under the given id.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The requested document kind.
        kind: DocKind,
        /// The requested id.
        id: String,
    },

    /// The id contains a path separator or dot component and could escape
    /// the store.
    #[error("invalid document id: {0:?}")]
    InvalidId(String),

    /// A region, creature, or species operation was attempted before a
    /// world was selected.
    #[error("no world selected")]
    NoWorldSelected,

    /// An underlying filesystem operation failed.
    #[error("storage I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// A document could not be encoded to or decoded from YAML.
    #[error("document YAML error: {source}")]
    Yaml {
        /// The underlying YAML error.
        #[from]
        source: serde_yml::Error,
    },
}
