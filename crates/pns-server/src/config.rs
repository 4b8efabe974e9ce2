use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use pns_registry::RegistryConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Gateway settings, loadable from TOML.
///
/// ```toml
/// bind_addr = "0.0.0.0:8730"
/// state_file = "pns-state.json"
/// allow_anonymous_read = true
///
/// [registry]
/// default_scheme = "safe"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Snapshot of the in-memory network, rewritten after every mutation.
    pub state_file: Option<PathBuf>,
    /// Serve read endpoints to requests without a bearer token.
    pub allow_anonymous_read: bool,
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8730)),
            state_file: None,
            allow_anonymous_read: true,
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        config.registry.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}
