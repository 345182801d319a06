//! On-device persistence for favorites and onboarding state.

/// Key-value backends the store can sit on.
pub mod backend;
/// Favorites and onboarding accessors.
pub mod local;

pub use backend::{FileBackend, KeyValueBackend, MemoryBackend};
pub use local::LocalStore;

/// Errors from the backing key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the storage file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The storage file exists but is not a valid key-value document.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// A stored value could not be decoded into the expected shape.
    #[error("failed to decode value for {key}: {source}")]
    Decode {
        /// Storage key holding the bad value.
        key: String,
        /// Underlying decode failure.
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded for storage.
    #[error("failed to encode value: {0}")]
    Encode(#[source] serde_json::Error),
}
