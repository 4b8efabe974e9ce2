//! The [`MutableDataNetwork`] trait defining the network boundary.
//!
//! Any backend (the in-memory simulator, a real network client) implements
//! this trait. Higher layers only see opaque addresses and raw entry bytes.

use std::sync::Arc;

use async_trait::async_trait;
use pns_crypto::NameHasher;
use pns_types::{ContainerAddress, ContainerMetadata, TypeTag};

use crate::entry::{ContainerInfo, Entry, EntryActions, Placement};
use crate::error::StoreResult;
use crate::session::Session;

/// Shared handle to a network backend.
pub type SharedNetwork = Arc<dyn MutableDataNetwork>;

/// Versioned, key-addressed container storage.
///
/// Implementations must guarantee:
/// - A single linear version sequence per key. Of several concurrent inserts
///   of the same key exactly one succeeds; the rest see `EntryExists`.
/// - [`apply`](Self::apply) is atomic per container: either every action in
///   the batch lands or none does.
/// - Entries are never deleted.
#[async_trait]
pub trait MutableDataNetwork: Send + Sync {
    /// Allocate a container with the given tag.
    ///
    /// Fails with `ContainerExists` if `placement` names an occupied address.
    async fn create_container(
        &self,
        session: &Session,
        placement: Placement,
        type_tag: TypeTag,
    ) -> StoreResult<ContainerAddress>;

    /// Attach human-readable metadata to a freshly created container.
    async fn quick_setup(
        &self,
        session: &Session,
        address: &ContainerAddress,
        metadata: &ContainerMetadata,
    ) -> StoreResult<()>;

    /// Describe a container.
    async fn container_info(
        &self,
        session: &Session,
        address: &ContainerAddress,
    ) -> StoreResult<ContainerInfo>;

    /// Describe every container tagged `type_tag`, ordered by address.
    async fn list_containers(
        &self,
        session: &Session,
        type_tag: TypeTag,
    ) -> StoreResult<Vec<ContainerInfo>>;

    /// Resolve the address of a well-known shared container by name.
    async fn lookup_well_known(&self, session: &Session, name: &str)
        -> StoreResult<ContainerAddress>;

    /// Read one entry by its stored (possibly sealed) key.
    ///
    /// Returns `Ok(None)` if the key is absent.
    async fn get_entry(
        &self,
        session: &Session,
        address: &ContainerAddress,
        key: &[u8],
    ) -> StoreResult<Option<Entry>>;

    /// Read every entry of a container, ordered by stored key.
    async fn list_entries(
        &self,
        session: &Session,
        address: &ContainerAddress,
    ) -> StoreResult<Vec<Entry>>;

    /// Apply a mutation batch atomically.
    async fn apply(
        &self,
        session: &Session,
        address: &ContainerAddress,
        actions: EntryActions,
    ) -> StoreResult<()>;

    /// Seal an entry key with the container's cipher (deterministic).
    async fn encrypt_key(
        &self,
        session: &Session,
        address: &ContainerAddress,
        key: &[u8],
    ) -> StoreResult<Vec<u8>>;

    /// Seal an entry value with the container's cipher.
    async fn encrypt_value(
        &self,
        session: &Session,
        address: &ContainerAddress,
        value: &[u8],
    ) -> StoreResult<Vec<u8>>;

    /// Open bytes sealed by `encrypt_key` or `encrypt_value`.
    async fn decrypt(
        &self,
        session: &Session,
        address: &ContainerAddress,
        sealed: &[u8],
    ) -> StoreResult<Vec<u8>>;

    /// Deterministic name-hashing primitive used to place services containers.
    fn hash(&self, name: &str) -> ContainerAddress {
        NameHasher::PUBLIC_NAME.hash(name)
    }
}
