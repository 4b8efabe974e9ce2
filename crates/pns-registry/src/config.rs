use std::path::Path;

use pns_store::{WELL_KNOWN_PUBLIC, WELL_KNOWN_PUBLIC_NAMES};
use pns_types::TypeTag;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Settings shared by every registry component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Scheme assumed when an identity URI has none.
    pub default_scheme: String,
    /// First segment of every path published in the public container.
    pub public_root: String,
    /// Last segment of a storage service path.
    pub storage_root_suffix: String,
    /// Well-known container holding public name → services container.
    pub public_names_container: String,
    /// Well-known container holding public path → storage container.
    pub public_container: String,
    pub services_type_tag: TypeTag,
    pub storage_type_tag: TypeTag,
    pub profile_type_tag: TypeTag,
    /// Prefix used to derive a storage name when the caller gives none.
    pub default_storage_prefix: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_scheme: "safe".into(),
            public_root: "_public".into(),
            storage_root_suffix: "root-ldp".into(),
            public_names_container: WELL_KNOWN_PUBLIC_NAMES.into(),
            public_container: WELL_KNOWN_PUBLIC.into(),
            services_type_tag: TypeTag::SERVICES,
            storage_type_tag: TypeTag::WWW,
            profile_type_tag: TypeTag::PROFILE,
            default_storage_prefix: "files".into(),
        }
    }
}

impl RegistryConfig {
    /// Parse a TOML document; missing keys take their default.
    pub fn from_toml_str(s: &str) -> RegistryResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| RegistryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> RegistryResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> RegistryResult<()> {
        let required = [
            ("default_scheme", &self.default_scheme),
            ("public_root", &self.public_root),
            ("storage_root_suffix", &self.storage_root_suffix),
            ("public_names_container", &self.public_names_container),
            ("public_container", &self.public_container),
            ("default_storage_prefix", &self.default_storage_prefix),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(RegistryError::Config(format!("{field} must not be empty")));
            }
        }
        if !self
            .default_scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(RegistryError::Config(format!(
                "default_scheme {:?} is not a valid uri scheme",
                self.default_scheme
            )));
        }
        if self.services_type_tag == self.storage_type_tag {
            return Err(RegistryError::Config(
                "services and storage containers need distinct type tags".into(),
            ));
        }
        Ok(())
    }
}
