//! Generic versioned-entry operations over network containers.
//!
//! The network only offers "add a new key" and "update a key at exactly the
//! next version". [`ContainerClient`] layers encryption, decoding and the
//! reserved-slot upsert on top of those two primitives.

use pns_store::{EntryActions, Placement, Session, SharedNetwork, StoreError};
use pns_types::{ContainerAddress, ContainerMetadata, TypeTag};
use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Which parts of an entry are sealed with the container's cipher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encryption {
    None,
    KeysOnly,
    KeysAndValues,
}

impl Encryption {
    fn keys(self) -> bool {
        !matches!(self, Encryption::None)
    }

    fn values(self) -> bool {
        matches!(self, Encryption::KeysAndValues)
    }
}

/// A container address together with the encryption policy its entries use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerRef {
    pub address: ContainerAddress,
    pub encryption: Encryption,
}

impl ContainerRef {
    pub fn new(address: ContainerAddress, encryption: Encryption) -> Self {
        Self {
            address,
            encryption,
        }
    }

    pub fn plain(address: ContainerAddress) -> Self {
        Self::new(address, Encryption::None)
    }
}

/// A decrypted value and the version it was read at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: u64,
}

impl VersionedValue {
    /// `true` when the key is reserved but holds no value yet.
    pub fn is_empty_sentinel(&self) -> bool {
        self.value.is_empty()
    }
}

/// Result of [`ContainerClient::upsert_reserved`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The key was new and now holds the value at version 0.
    Inserted,
    /// The key held the empty sentinel and was filled at `version`.
    UpdatedReservedSlot { version: u64 },
    /// The key already holds a value; nothing was written.
    Conflict,
}

/// Versioned-entry operations over a [`MutableDataNetwork`](pns_store::MutableDataNetwork).
#[derive(Clone)]
pub struct ContainerClient {
    network: SharedNetwork,
}

impl ContainerClient {
    pub fn new(network: SharedNetwork) -> Self {
        Self { network }
    }

    pub fn network(&self) -> &SharedNetwork {
        &self.network
    }

    /// Allocate a container and apply setup with `type_tag` and `metadata`.
    pub async fn create_container(
        &self,
        session: &Session,
        placement: Placement,
        type_tag: TypeTag,
        metadata: &ContainerMetadata,
    ) -> RegistryResult<ContainerAddress> {
        if metadata.name.trim().is_empty() {
            return Err(RegistryError::InvalidServiceMetadata(
                "container name must not be empty".into(),
            ));
        }
        let address = self
            .network
            .create_container(session, placement, type_tag)
            .await?;
        self.network.quick_setup(session, &address, metadata).await?;
        debug!(address = %address.short_hex(), %type_tag, name = %metadata.name, "container set up");
        Ok(address)
    }

    /// Look up a well-known container and attach the policy its entries use.
    pub async fn well_known(
        &self,
        session: &Session,
        name: &str,
        encryption: Encryption,
    ) -> RegistryResult<ContainerRef> {
        let address = self.network.lookup_well_known(session, name).await?;
        Ok(ContainerRef::new(address, encryption))
    }

    /// Add a brand-new entry.
    ///
    /// Fails with [`RegistryError::EntryExists`] if the key is present,
    /// including as an empty placeholder. Callers treat that as an expected
    /// collision signal.
    pub async fn insert(
        &self,
        session: &Session,
        container: &ContainerRef,
        key: &[u8],
        value: &[u8],
    ) -> RegistryResult<()> {
        let sealed_key = self.seal_key(session, container, key).await?;
        let sealed_value = self.seal_value(session, container, value).await?;
        self.network
            .apply(
                session,
                &container.address,
                EntryActions::new().insert(sealed_key, sealed_value),
            )
            .await?;
        Ok(())
    }

    /// Read and decrypt the current value of `key`.
    ///
    /// A reserved key comes back as an empty value with its version.
    pub async fn fetch(
        &self,
        session: &Session,
        container: &ContainerRef,
        key: &[u8],
    ) -> RegistryResult<VersionedValue> {
        self.try_fetch(session, container, key)
            .await?
            .ok_or(RegistryError::EntryNotFound)
    }

    /// Like [`fetch`](Self::fetch) but returns `Ok(None)` for a missing key.
    pub async fn try_fetch(
        &self,
        session: &Session,
        container: &ContainerRef,
        key: &[u8],
    ) -> RegistryResult<Option<VersionedValue>> {
        let sealed_key = self.seal_key(session, container, key).await?;
        let Some(entry) = self
            .network
            .get_entry(session, &container.address, &sealed_key)
            .await?
        else {
            return Ok(None);
        };
        let value = self.open_value(session, container, &entry.value).await?;
        Ok(Some(VersionedValue {
            value,
            version: entry.version,
        }))
    }

    /// Fill a reserved (empty) entry at `current + 1`. Returns the new version.
    ///
    /// Fails with [`RegistryError::EntryNotEmpty`] if the entry holds a value.
    pub async fn update_if_empty(
        &self,
        session: &Session,
        container: &ContainerRef,
        key: &[u8],
        value: &[u8],
    ) -> RegistryResult<u64> {
        let sealed_key = self.seal_key(session, container, key).await?;
        let entry = self
            .network
            .get_entry(session, &container.address, &sealed_key)
            .await?
            .ok_or(RegistryError::EntryNotFound)?;
        if !entry.is_empty_sentinel() {
            return Err(RegistryError::EntryNotEmpty);
        }
        let next = entry.version + 1;
        let sealed_value = self.seal_value(session, container, value).await?;
        self.network
            .apply(
                session,
                &container.address,
                EntryActions::new().update(sealed_key, sealed_value, next),
            )
            .await?;
        Ok(next)
    }

    /// Replace the value of `key`, which must currently be at `read_version`.
    pub async fn update(
        &self,
        session: &Session,
        container: &ContainerRef,
        key: &[u8],
        value: &[u8],
        read_version: u64,
    ) -> RegistryResult<u64> {
        let sealed_key = self.seal_key(session, container, key).await?;
        let sealed_value = self.seal_value(session, container, value).await?;
        let next = read_version + 1;
        self.network
            .apply(
                session,
                &container.address,
                EntryActions::new().update(sealed_key, sealed_value, next),
            )
            .await?;
        Ok(next)
    }

    /// Insert `key`; if it exists, fill it only when it is a reserved slot.
    pub async fn upsert_reserved(
        &self,
        session: &Session,
        container: &ContainerRef,
        key: &[u8],
        value: &[u8],
    ) -> RegistryResult<UpsertOutcome> {
        match self.insert(session, container, key, value).await {
            Ok(()) => return Ok(UpsertOutcome::Inserted),
            Err(RegistryError::EntryExists) => {}
            Err(other) => return Err(other),
        }
        debug!(container = %container.address.short_hex(), "key exists, trying reserved-slot update");
        match self.update_if_empty(session, container, key, value).await {
            Ok(version) => Ok(UpsertOutcome::UpdatedReservedSlot { version }),
            // Lost a race to another writer filling the same slot.
            Err(RegistryError::EntryNotEmpty) | Err(RegistryError::VersionConflict { .. }) => {
                Ok(UpsertOutcome::Conflict)
            }
            Err(other) => Err(other),
        }
    }

    /// Every entry of the container, keys and values decrypted.
    pub async fn entries(
        &self,
        session: &Session,
        container: &ContainerRef,
    ) -> RegistryResult<Vec<(Vec<u8>, VersionedValue)>> {
        let raw = self
            .network
            .list_entries(session, &container.address)
            .await?;
        let mut out = Vec::with_capacity(raw.len());
        for entry in raw {
            let key = if container.encryption.keys() {
                self.network
                    .decrypt(session, &container.address, &entry.key)
                    .await?
            } else {
                entry.key
            };
            let value = self.open_value(session, container, &entry.value).await?;
            out.push((
                key,
                VersionedValue {
                    value,
                    version: entry.version,
                },
            ));
        }
        Ok(out)
    }

    async fn seal_key(
        &self,
        session: &Session,
        container: &ContainerRef,
        key: &[u8],
    ) -> RegistryResult<Vec<u8>> {
        if container.encryption.keys() {
            Ok(self
                .network
                .encrypt_key(session, &container.address, key)
                .await?)
        } else {
            Ok(key.to_vec())
        }
    }

    // The empty sentinel is stored as zero bytes even in encrypted containers.
    async fn seal_value(
        &self,
        session: &Session,
        container: &ContainerRef,
        value: &[u8],
    ) -> RegistryResult<Vec<u8>> {
        if container.encryption.values() && !value.is_empty() {
            Ok(self
                .network
                .encrypt_value(session, &container.address, value)
                .await?)
        } else {
            Ok(value.to_vec())
        }
    }

    async fn open_value(
        &self,
        session: &Session,
        container: &ContainerRef,
        stored: &[u8],
    ) -> RegistryResult<Vec<u8>> {
        if container.encryption.values() && !stored.is_empty() {
            self.network
                .decrypt(session, &container.address, stored)
                .await
                .map_err(|e| match e {
                    StoreError::Crypto(c) => RegistryError::CorruptEntry(c.to_string()),
                    other => other.into(),
                })
        } else {
            Ok(stored.to_vec())
        }
    }
}

/// Decode a container address stored as an entry value.
pub(crate) fn decode_address(value: &[u8]) -> RegistryResult<ContainerAddress> {
    ContainerAddress::from_slice(value).map_err(|e| RegistryError::CorruptEntry(e.to_string()))
}
