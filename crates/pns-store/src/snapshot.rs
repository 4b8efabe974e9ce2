//! Serializable image of an in-memory network.
//!
//! Snapshots let the CLI keep a simulated network across invocations. Entry
//! keys and values are raw (possibly sealed) bytes, so they are stored as hex.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use pns_types::{ContainerAddress, ContainerMetadata, TypeTag};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Full network image.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub format_version: u32,
    pub well_known: BTreeMap<String, ContainerAddress>,
    pub containers: Vec<ContainerSnapshot>,
}

/// One container, including its cipher key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    pub address: ContainerAddress,
    pub type_tag: TypeTag,
    #[serde(default)]
    pub metadata: Option<ContainerMetadata>,
    #[serde(default)]
    pub owner: Option<String>,
    pub cipher_key: String,
    #[serde(default)]
    pub entries: Vec<EntrySnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySnapshot {
    pub key: String,
    pub value: String,
    pub version: u64,
}

impl NetworkSnapshot {
    pub const FORMAT_VERSION: u32 = 1;

    pub fn to_json_pretty(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> StoreResult<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if snapshot.format_version != Self::FORMAT_VERSION {
            return Err(StoreError::Serialization(format!(
                "unsupported snapshot format version {}",
                snapshot.format_version
            )));
        }
        Ok(snapshot)
    }

    /// Write the snapshot to `path`, replacing any existing file.
    ///
    /// The JSON goes to a fresh temp file in the same directory which is then
    /// renamed over `path`, so readers never see a partial file.
    pub fn write_to(&self, path: &Path) -> StoreResult<()> {
        let json = self.to_json_pretty()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> StoreResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

pub(crate) fn decode_hex(field: &str, value: &str) -> StoreResult<Vec<u8>> {
    hex::decode(value).map_err(|e| StoreError::Serialization(format!("bad hex in {field}: {e}")))
}
