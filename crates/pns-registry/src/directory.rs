//! Public name → services container directory.

use pns_store::{Placement, Session, StoreError};
use pns_types::{ContainerAddress, ContainerMetadata, PublicName};
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::container::{decode_address, ContainerClient, ContainerRef, Encryption};
use crate::error::{RegistryError, RegistryResult};
use crate::validate;

/// Registers public names, each backed by its own services container.
///
/// Names live in the well-known public-names container with keys and values
/// encrypted. A name's services container sits at the hash of the name, so a
/// second registration collides on the container before reaching the
/// directory.
#[derive(Clone)]
pub struct NamingDirectory {
    client: ContainerClient,
    config: RegistryConfig,
}

impl NamingDirectory {
    pub fn new(client: ContainerClient, config: RegistryConfig) -> Self {
        Self { client, config }
    }

    async fn names_container(&self, session: &Session) -> RegistryResult<ContainerRef> {
        self.client
            .well_known(
                session,
                &self.config.public_names_container,
                Encryption::KeysAndValues,
            )
            .await
    }

    /// Claim `name` and create its services container.
    ///
    /// Returns the services container address. A taken name fails with
    /// [`RegistryError::NameAlreadyExists`]; nothing is retried.
    pub async fn register_name(
        &self,
        session: &Session,
        name: &str,
    ) -> RegistryResult<ContainerAddress> {
        let name = validate::public_name(name)?;
        let hash = self.client.network().hash(name.as_str());
        let taken = || RegistryError::NameAlreadyExists {
            name: name.to_string(),
        };

        let address = match self
            .client
            .create_container(
                session,
                Placement::At(hash),
                self.config.services_type_tag,
                &ContainerMetadata::services_for(name.as_str()),
            )
            .await
        {
            Ok(address) => address,
            Err(RegistryError::Network(StoreError::ContainerExists(_))) => {
                warn!(%name, "services container already exists");
                return Err(taken());
            }
            Err(e) => return Err(e),
        };
        debug!(%name, address = %address.short_hex(), "services container created");

        let directory = self.names_container(session).await?;
        match self
            .client
            .insert(session, &directory, name.as_str().as_bytes(), address.as_bytes())
            .await
        {
            Ok(()) => {}
            Err(RegistryError::EntryExists) => {
                warn!(%name, "public name already in directory");
                return Err(taken());
            }
            Err(e) => return Err(e),
        }
        info!(%name, address = %address.short_hex(), "registered public name");
        Ok(address)
    }

    /// Services container address of a registered name.
    pub async fn resolve_name(
        &self,
        session: &Session,
        name: &str,
    ) -> RegistryResult<ContainerAddress> {
        let name = validate::public_name(name)?;
        let directory = self.names_container(session).await?;
        match self
            .client
            .try_fetch(session, &directory, name.as_str().as_bytes())
            .await?
        {
            Some(found) if !found.is_empty_sentinel() => decode_address(&found.value),
            _ => Err(RegistryError::NameNotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Every registered name, ordered by name.
    pub async fn list_names(
        &self,
        session: &Session,
    ) -> RegistryResult<Vec<(PublicName, ContainerAddress)>> {
        let directory = self.names_container(session).await?;
        let mut names = Vec::new();
        for (key, value) in self.client.entries(session, &directory).await? {
            if value.is_empty_sentinel() {
                continue;
            }
            let raw = String::from_utf8(key)
                .map_err(|e| RegistryError::CorruptEntry(format!("public name: {e}")))?;
            let name = PublicName::new(&raw)
                .map_err(|e| RegistryError::CorruptEntry(e.to_string()))?;
            names.push((name, decode_address(&value.value)?));
        }
        names.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        Ok(names)
    }
}
