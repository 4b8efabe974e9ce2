//! In-memory network simulator.
//!
//! [`InMemoryNetwork`] keeps every container in a `HashMap` protected by a
//! `RwLock`. It implements the full [`MutableDataNetwork`] trait, including
//! per-key version checks, per-container ciphers and ownership, and can be
//! saved to and restored from a JSON [`NetworkSnapshot`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use pns_crypto::ContainerCipher;
use pns_types::{ContainerAddress, ContainerMetadata, TypeTag};
use tracing::{debug, warn};

use crate::entry::{ContainerInfo, Entry, EntryAction, EntryActions, Placement};
use crate::error::{StoreError, StoreResult};
use crate::session::Session;
use crate::snapshot::{decode_hex, ContainerSnapshot, EntrySnapshot, NetworkSnapshot};
use crate::traits::MutableDataNetwork;

/// Well-known directory mapping public names to services containers.
pub const WELL_KNOWN_PUBLIC_NAMES: &str = "_publicNames";
/// Well-known directory mapping public paths to storage containers.
pub const WELL_KNOWN_PUBLIC: &str = "_public";

#[derive(Clone, Debug)]
struct StoredValue {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug)]
struct ContainerState {
    type_tag: TypeTag,
    metadata: Option<ContainerMetadata>,
    owner: Option<String>,
    cipher: ContainerCipher,
    entries: BTreeMap<Vec<u8>, StoredValue>,
}

impl ContainerState {
    fn new(type_tag: TypeTag, owner: Option<String>) -> Self {
        Self {
            type_tag,
            metadata: None,
            owner,
            cipher: ContainerCipher::generate(),
            entries: BTreeMap::new(),
        }
    }

    fn info(&self, address: ContainerAddress) -> ContainerInfo {
        ContainerInfo {
            address,
            type_tag: self.type_tag,
            metadata: self.metadata.clone(),
            owner: self.owner.clone(),
            entry_count: self.entries.len(),
        }
    }

    fn check_owner(&self, session: &Session, address: &ContainerAddress) -> StoreResult<()> {
        match &self.owner {
            Some(owner) if owner != session.app_id() => Err(StoreError::NotAuthorized(format!(
                "container {} is owned by {owner}",
                address.short_hex()
            ))),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct NetworkState {
    containers: HashMap<ContainerAddress, ContainerState>,
    well_known: BTreeMap<String, ContainerAddress>,
    failing: HashSet<ContainerAddress>,
}

impl NetworkState {
    fn container(&self, address: &ContainerAddress) -> StoreResult<&ContainerState> {
        self.containers
            .get(address)
            .ok_or(StoreError::NoSuchContainer(*address))
    }

    fn container_mut(&mut self, address: &ContainerAddress) -> StoreResult<&mut ContainerState> {
        self.containers
            .get_mut(address)
            .ok_or(StoreError::NoSuchContainer(*address))
    }
}

/// An in-memory implementation of [`MutableDataNetwork`].
///
/// Data is lost when the network is dropped unless it is saved with
/// [`save`](Self::save).
#[derive(Debug)]
pub struct InMemoryNetwork {
    inner: RwLock<NetworkState>,
}

impl InMemoryNetwork {
    /// A network with the `_publicNames` and `_public` directories.
    pub fn new() -> Self {
        Self::with_well_known(&[WELL_KNOWN_PUBLIC_NAMES, WELL_KNOWN_PUBLIC])
    }

    /// A network bootstrapped with the given well-known directories.
    pub fn with_well_known(names: &[&str]) -> Self {
        let mut state = NetworkState::default();
        for name in names {
            let address = ContainerAddress::random();
            let mut container = ContainerState::new(TypeTag::DIRECTORY, None);
            container.metadata = Some(ContainerMetadata::new(*name, "well-known directory"));
            state.containers.insert(address, container);
            state.well_known.insert((*name).to_string(), address);
        }
        Self {
            inner: RwLock::new(state),
        }
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, NetworkState>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Transport(format!("lock poisoned: {e}")))
    }

    fn write_state(&self) -> StoreResult<RwLockWriteGuard<'_, NetworkState>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Transport(format!("lock poisoned: {e}")))
    }

    /// Number of containers currently held, well-known ones included.
    pub fn container_count(&self) -> StoreResult<usize> {
        Ok(self.read_state()?.containers.len())
    }

    /// Make every later `apply` against `address` fail with a transport error.
    ///
    /// Used to exercise partial-failure paths of multi-container workflows.
    pub fn fail_writes_to(&self, address: ContainerAddress) -> StoreResult<()> {
        self.write_state()?.failing.insert(address);
        Ok(())
    }

    /// Undo [`fail_writes_to`](Self::fail_writes_to).
    pub fn heal(&self, address: &ContainerAddress) -> StoreResult<()> {
        self.write_state()?.failing.remove(address);
        Ok(())
    }

    /// Capture the whole network, cipher keys included.
    pub fn snapshot(&self) -> StoreResult<NetworkSnapshot> {
        let state = self.read_state()?;
        let mut containers: Vec<ContainerSnapshot> = state
            .containers
            .iter()
            .map(|(address, c)| ContainerSnapshot {
                address: *address,
                type_tag: c.type_tag,
                metadata: c.metadata.clone(),
                owner: c.owner.clone(),
                cipher_key: hex::encode(c.cipher.key()),
                entries: c
                    .entries
                    .iter()
                    .map(|(k, v)| EntrySnapshot {
                        key: hex::encode(k),
                        value: hex::encode(&v.value),
                        version: v.version,
                    })
                    .collect(),
            })
            .collect();
        containers.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(NetworkSnapshot {
            format_version: NetworkSnapshot::FORMAT_VERSION,
            well_known: state.well_known.clone(),
            containers,
        })
    }

    /// Rebuild a network from a snapshot.
    pub fn from_snapshot(snapshot: NetworkSnapshot) -> StoreResult<Self> {
        let mut state = NetworkState {
            well_known: snapshot.well_known,
            ..Default::default()
        };
        for c in snapshot.containers {
            let key_bytes = decode_hex("cipher_key", &c.cipher_key)?;
            let key: [u8; 32] = key_bytes.as_slice().try_into().map_err(|_| {
                StoreError::Serialization(format!(
                    "cipher key for {} must be 32 bytes",
                    c.address.short_hex()
                ))
            })?;
            let mut entries = BTreeMap::new();
            for e in c.entries {
                entries.insert(
                    decode_hex("entry key", &e.key)?,
                    StoredValue {
                        value: decode_hex("entry value", &e.value)?,
                        version: e.version,
                    },
                );
            }
            state.containers.insert(
                c.address,
                ContainerState {
                    type_tag: c.type_tag,
                    metadata: c.metadata,
                    owner: c.owner,
                    cipher: ContainerCipher::from_key(key),
                    entries,
                },
            );
        }
        for (name, address) in &state.well_known {
            if !state.containers.contains_key(address) {
                return Err(StoreError::Serialization(format!(
                    "well-known container {name:?} missing from snapshot"
                )));
            }
        }
        Ok(Self {
            inner: RwLock::new(state),
        })
    }

    /// Persist the network to a JSON file.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        self.snapshot()?.write_to(path)
    }

    /// Restore a network saved with [`save`](Self::save).
    pub fn load(path: &Path) -> StoreResult<Self> {
        Self::from_snapshot(NetworkSnapshot::read_from(path)?)
    }

    /// Restore from `path` if it exists, otherwise start a fresh network.
    pub fn load_or_new(path: &Path) -> StoreResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "no state file, starting fresh network");
            Ok(Self::new())
        }
    }
}

impl Default for InMemoryNetwork {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MutableDataNetwork for InMemoryNetwork {
    async fn create_container(
        &self,
        session: &Session,
        placement: Placement,
        type_tag: TypeTag,
    ) -> StoreResult<ContainerAddress> {
        session.require_authorized("create_container")?;
        let mut state = self.write_state()?;
        let address = match placement {
            Placement::At(address) => {
                if state.containers.contains_key(&address) {
                    return Err(StoreError::ContainerExists(address));
                }
                address
            }
            Placement::Random => loop {
                let candidate = ContainerAddress::random();
                if !state.containers.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        state.containers.insert(
            address,
            ContainerState::new(type_tag, Some(session.app_id().to_string())),
        );
        debug!(address = %address.short_hex(), %type_tag, app = session.app_id(), "created container");
        Ok(address)
    }

    async fn quick_setup(
        &self,
        session: &Session,
        address: &ContainerAddress,
        metadata: &ContainerMetadata,
    ) -> StoreResult<()> {
        session.require_authorized("quick_setup")?;
        let mut state = self.write_state()?;
        let container = state.container_mut(address)?;
        container.check_owner(session, address)?;
        if container.metadata.is_some() {
            return Err(StoreError::AlreadySetUp(*address));
        }
        container.metadata = Some(metadata.clone());
        Ok(())
    }

    async fn container_info(
        &self,
        _session: &Session,
        address: &ContainerAddress,
    ) -> StoreResult<ContainerInfo> {
        let state = self.read_state()?;
        Ok(state.container(address)?.info(*address))
    }

    async fn list_containers(
        &self,
        _session: &Session,
        type_tag: TypeTag,
    ) -> StoreResult<Vec<ContainerInfo>> {
        let state = self.read_state()?;
        let mut found: Vec<ContainerInfo> = state
            .containers
            .iter()
            .filter(|(_, c)| c.type_tag == type_tag)
            .map(|(address, c)| c.info(*address))
            .collect();
        found.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(found)
    }

    async fn lookup_well_known(
        &self,
        _session: &Session,
        name: &str,
    ) -> StoreResult<ContainerAddress> {
        self.read_state()?
            .well_known
            .get(name)
            .copied()
            .ok_or_else(|| StoreError::NoSuchWellKnown(name.to_string()))
    }

    async fn get_entry(
        &self,
        _session: &Session,
        address: &ContainerAddress,
        key: &[u8],
    ) -> StoreResult<Option<Entry>> {
        let state = self.read_state()?;
        let c = state.container(address)?;
        Ok(c.entries.get(key).map(|v| Entry {
            key: key.to_vec(),
            value: v.value.clone(),
            version: v.version,
        }))
    }

    async fn list_entries(
        &self,
        _session: &Session,
        address: &ContainerAddress,
    ) -> StoreResult<Vec<Entry>> {
        let state = self.read_state()?;
        let c = state.container(address)?;
        Ok(c.entries
            .iter()
            .map(|(k, v)| Entry {
                key: k.clone(),
                value: v.value.clone(),
                version: v.version,
            })
            .collect())
    }

    async fn apply(
        &self,
        session: &Session,
        address: &ContainerAddress,
        actions: EntryActions,
    ) -> StoreResult<()> {
        session.require_authorized("apply")?;
        let mut state = self.write_state()?;
        if state.failing.contains(address) {
            warn!(address = %address.short_hex(), "rejecting mutation: injected transport fault");
            return Err(StoreError::Transport(format!(
                "connection to container {} lost",
                address.short_hex()
            )));
        }
        let container = state.container_mut(address)?;
        container.check_owner(session, address)?;

        // Validate the whole batch against a staging overlay before committing.
        let mut staged: BTreeMap<Vec<u8>, StoredValue> = BTreeMap::new();
        for action in actions.actions() {
            let key = action.key();
            let current = staged
                .get(key)
                .or_else(|| container.entries.get(key))
                .map(|v| v.version);
            match action {
                EntryAction::Insert { key, value } => {
                    if current.is_some() {
                        return Err(StoreError::EntryExists);
                    }
                    staged.insert(
                        key.clone(),
                        StoredValue {
                            value: value.clone(),
                            version: 0,
                        },
                    );
                }
                EntryAction::Update {
                    key,
                    value,
                    version,
                } => {
                    let current = current.ok_or(StoreError::NoSuchEntry)?;
                    if *version != current + 1 {
                        return Err(StoreError::InvalidSuccessor {
                            current,
                            requested: *version,
                        });
                    }
                    staged.insert(
                        key.clone(),
                        StoredValue {
                            value: value.clone(),
                            version: *version,
                        },
                    );
                }
            }
        }
        let count = staged.len();
        container.entries.extend(staged);
        debug!(address = %address.short_hex(), mutations = count, "applied entry actions");
        Ok(())
    }

    async fn encrypt_key(
        &self,
        _session: &Session,
        address: &ContainerAddress,
        key: &[u8],
    ) -> StoreResult<Vec<u8>> {
        let state = self.read_state()?;
        Ok(state.container(address)?.cipher.seal_key(key)?)
    }

    async fn encrypt_value(
        &self,
        session: &Session,
        address: &ContainerAddress,
        value: &[u8],
    ) -> StoreResult<Vec<u8>> {
        session.require_authorized("encrypt_value")?;
        let state = self.read_state()?;
        Ok(state.container(address)?.cipher.seal_value(value)?)
    }

    async fn decrypt(
        &self,
        _session: &Session,
        address: &ContainerAddress,
        sealed: &[u8],
    ) -> StoreResult<Vec<u8>> {
        let state = self.read_state()?;
        Ok(state.container(address)?.cipher.open(sealed)?)
    }
}
