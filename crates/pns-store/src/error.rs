use pns_crypto::CipherError;
use pns_types::ContainerAddress;

/// Errors surfaced by the mutable-data network.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Insert of a key that is already present, including as an empty placeholder.
    #[error("entry already exists")]
    EntryExists,

    /// The requested entry does not exist in the container.
    #[error("no such entry")]
    NoSuchEntry,

    /// An update named a version other than `current + 1`.
    #[error("invalid successor version: current {current}, requested {requested}")]
    InvalidSuccessor { current: u64, requested: u64 },

    #[error("no such container: {0}")]
    NoSuchContainer(ContainerAddress),

    /// A container already occupies the requested address.
    #[error("container already exists: {0}")]
    ContainerExists(ContainerAddress),

    #[error("container already set up: {0}")]
    AlreadySetUp(ContainerAddress),

    #[error("no well-known container named {0:?}")]
    NoSuchWellKnown(String),

    /// The session may not perform this operation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] CipherError),

    /// Connection-level failure; opaque to callers.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for network operations.
pub type StoreResult<T> = Result<T, StoreError>;
