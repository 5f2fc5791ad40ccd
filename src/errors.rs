//! Error hierarchy for the filters engine.
//!
//! Only wiring and configuration mistakes surface as [`Error`]. Data
//! conditions met at runtime (unknown keys, corrupt payloads, failed writes)
//! are logged and absorbed by the store.

use std::path::PathBuf;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration sources could not be read or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration was read but is inconsistent
    #[error("Invalid filters configuration: {0}")]
    InvalidConfig(String),

    /// Durable storage failures
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A consumer asked for the store from a scope with no provider
    #[error("Missing FiltersProvider in the scope")]
    MissingProvider,

    /// A per-key consumer was bound to a key outside the initial filters
    #[error("The \"{0}\" key must be defined in the initial filters")]
    UndefinedFilter(String),

    /// The write-back timer needs a tokio runtime at construction time
    #[error("Filters store must be created inside a tokio runtime")]
    RuntimeUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O failure tied to a concrete path
    #[error("Error occurred at path: {path}")]
    PathError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Embedded database failures
    #[error(transparent)]
    SledError(#[from] sled::Error),

    /// Payload could not be encoded or decoded as JSON
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Stored bytes are not a valid payload
    #[error("Data corruption detected at {location}")]
    DataCorruption { location: String },

    /// Writing would exceed the backend's capacity
    #[error("Storage quota of {limit} bytes exceeded while writing {name:?}")]
    QuotaExceeded { name: String, limit: usize },

    /// Backend cannot be reached at all
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
