//! Entries, mutation batches and container descriptions.

use pns_types::{ContainerAddress, ContainerMetadata, TypeTag};
use serde::{Deserialize, Serialize};

/// A stored `(key, value, version)` triple, exactly as the network holds it.
///
/// Keys and values may be sealed; this type never interprets them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub version: u64,
}

impl Entry {
    /// A zero-length value marks a key that is reserved but not yet populated.
    pub fn is_empty_sentinel(&self) -> bool {
        self.value.is_empty()
    }
}

/// A single mutation inside an [`EntryActions`] batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryAction {
    /// Add a brand-new key at version 0.
    Insert { key: Vec<u8>, value: Vec<u8> },
    /// Replace the value of an existing key; `version` must be `current + 1`.
    Update {
        key: Vec<u8>,
        value: Vec<u8>,
        version: u64,
    },
}

impl EntryAction {
    pub fn key(&self) -> &[u8] {
        match self {
            EntryAction::Insert { key, .. } => key,
            EntryAction::Update { key, .. } => key,
        }
    }
}

/// A batch of mutations applied atomically to one container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryActions {
    actions: Vec<EntryAction>,
}

impl EntryActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        self.actions.push(EntryAction::Insert {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn update(
        mut self,
        key: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        version: u64,
    ) -> Self {
        self.actions.push(EntryAction::Update {
            key: key.into(),
            value: value.into(),
            version,
        });
        self
    }

    pub fn actions(&self) -> &[EntryAction] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Where a new container should live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// A freshly drawn random address.
    Random,
    /// A caller-chosen address, typically the hash of a name.
    At(ContainerAddress),
}

/// Public description of a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub address: ContainerAddress,
    pub type_tag: TypeTag,
    pub metadata: Option<ContainerMetadata>,
    /// App that created the container; `None` for well-known shared containers.
    pub owner: Option<String>,
    pub entry_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_order() {
        let actions = EntryActions::new()
            .insert(b"a".to_vec(), b"1".to_vec())
            .update(b"b".to_vec(), b"2".to_vec(), 3);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions.actions()[0].key(), b"a");
        assert!(matches!(
            actions.actions()[1],
            EntryAction::Update { version: 3, .. }
        ));
    }

    #[test]
    fn empty_value_is_sentinel() {
        let e = Entry {
            key: b"k".to_vec(),
            value: vec![],
            version: 0,
        };
        assert!(e.is_empty_sentinel());
    }
}
