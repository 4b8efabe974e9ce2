//! Error types for registry operations.

use pns_store::StoreError;
use thiserror::Error;

/// Coarse classification of a [`RegistryError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any network call.
    Validation,
    /// The name or key is already taken by something else.
    Conflict,
    /// The name, service or entry does not exist.
    NotFound,
    /// The session may not perform the operation.
    NotAuthorized,
    /// Any other network failure.
    Transport,
}

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid public name: {0}")]
    InvalidPublicName(String),

    #[error("invalid sub name: {0}")]
    InvalidSubName(String),

    #[error("invalid service name: {0}")]
    InvalidServiceName(String),

    #[error("invalid service path: {0}")]
    InvalidServicePath(String),

    #[error("invalid service metadata: {0}")]
    InvalidServiceMetadata(String),

    #[error("invalid uri {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// The public name is already registered.
    #[error("public name already exists: {name}")]
    NameAlreadyExists { name: String },

    #[error("public name not found: {name}")]
    NameNotFound { name: String },

    /// The service key holds a value and cannot be claimed again.
    #[error("service {key} of {name} is already taken")]
    ServiceConflict { name: String, key: String },

    #[error("service {key} not found under {name}")]
    ServiceNotFound { name: String, key: String },

    #[error("entry already exists")]
    EntryExists,

    /// An update-in-place was refused because the entry holds a value.
    #[error("entry is not empty")]
    EntryNotEmpty,

    #[error("entry not found")]
    EntryNotFound,

    /// Another writer advanced the entry first.
    #[error("version conflict: entry is at {current}, update named {requested}")]
    VersionConflict { current: u64, requested: u64 },

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Stored bytes could not be decoded.
    #[error("corrupt entry: {0}")]
    CorruptEntry(String),

    #[error("network error: {0}")]
    Network(#[source] StoreError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPublicName(_)
            | Self::InvalidSubName(_)
            | Self::InvalidServiceName(_)
            | Self::InvalidServicePath(_)
            | Self::InvalidServiceMetadata(_)
            | Self::InvalidUri { .. }
            | Self::InvalidProfile(_)
            | Self::Config(_) => ErrorKind::Validation,
            Self::NameAlreadyExists { .. }
            | Self::ServiceConflict { .. }
            | Self::EntryExists
            | Self::EntryNotEmpty
            | Self::VersionConflict { .. } => ErrorKind::Conflict,
            Self::NameNotFound { .. } | Self::ServiceNotFound { .. } | Self::EntryNotFound => {
                ErrorKind::NotFound
            }
            Self::NotAuthorized(_) => ErrorKind::NotAuthorized,
            Self::CorruptEntry(_) | Self::Network(_) => ErrorKind::Transport,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EntryExists => Self::EntryExists,
            StoreError::NoSuchEntry => Self::EntryNotFound,
            StoreError::InvalidSuccessor { current, requested } => {
                Self::VersionConflict { current, requested }
            }
            StoreError::NotAuthorized(reason) => Self::NotAuthorized(reason),
            other => Self::Network(other),
        }
    }
}

/// Convenience type alias for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_kinds() {
        assert_eq!(RegistryError::from(StoreError::EntryExists).kind(), ErrorKind::Conflict);
        assert_eq!(RegistryError::from(StoreError::NoSuchEntry).kind(), ErrorKind::NotFound);
        assert_eq!(
            RegistryError::from(StoreError::NotAuthorized("x".into())).kind(),
            ErrorKind::NotAuthorized
        );
        assert_eq!(
            RegistryError::from(StoreError::Transport("down".into())).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            RegistryError::from(StoreError::InvalidSuccessor {
                current: 1,
                requested: 3
            })
            .kind(),
            ErrorKind::Conflict
        );
    }

    #[test]
    fn validation_kinds() {
        assert_eq!(RegistryError::InvalidSubName("".into()).kind(), ErrorKind::Validation);
        assert_eq!(
            RegistryError::InvalidUri {
                uri: "x".into(),
                reason: "y".into()
            }
            .kind(),
            ErrorKind::Validation
        );
    }
}
