//! Storage provisioning for an identity.
//!
//! Provisioning registers a dedicated public name for the identity's
//! storage, creates the storage root container, publishes it under a path
//! in the public container and finally registers it as a hosting service.
//! Steps are not rolled back: a failure after `register_name` leaves the new
//! name and its services container in place.

use pns_store::{Placement, Session};
use pns_types::{ContainerAddress, ContainerMetadata, HOSTING_SERVICE};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::container::{ContainerClient, Encryption};
use crate::directory::NamingDirectory;
use crate::error::RegistryResult;
use crate::profile::IdentityPublisher;
use crate::services::ServiceRegistry;
use crate::uri::{IdentityUri, ServiceUri};
use crate::validate;

/// Everything created by one provisioning run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProvisionedStorage {
    /// `scheme://hostingSubName.storageName`
    pub uri: String,
    pub storage_name: String,
    pub services_container: ContainerAddress,
    /// Root container of the storage.
    pub folder: ContainerAddress,
    /// Key of the folder in the public container.
    pub service_path: String,
}

#[derive(Clone)]
pub struct StorageProvisioner {
    client: ContainerClient,
    directory: NamingDirectory,
    services: ServiceRegistry,
    config: RegistryConfig,
}

impl StorageProvisioner {
    pub fn new(
        client: ContainerClient,
        directory: NamingDirectory,
        services: ServiceRegistry,
        config: RegistryConfig,
    ) -> Self {
        Self {
            client,
            directory,
            services,
            config,
        }
    }

    /// Provision storage for `identity_uri` and return its service URI.
    ///
    /// `storage_prefix` defaults to the configured prefix (`files`), so
    /// `safe://happybeing` with hosting sub name `files` yields
    /// `safe://files.files-happybeing`.
    pub async fn provision_storage(
        &self,
        session: &Session,
        identity_uri: &str,
        hosting_sub_name: &str,
        storage_prefix: Option<&str>,
    ) -> RegistryResult<ProvisionedStorage> {
        let identity = IdentityUri::parse(identity_uri, &self.config.default_scheme)?;
        let sub = validate::sub_name(hosting_sub_name)?;
        let prefix = storage_prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(&self.config.default_storage_prefix);
        let storage_name = validate::public_name(&format!("{prefix}-{}", identity.host))?;
        let service_path = format!(
            "{}/{}/{}",
            self.config.public_root, storage_name, self.config.storage_root_suffix
        );
        validate::service_path(&service_path)?;
        let key = validate::service_key(&sub, HOSTING_SERVICE)?;

        let services_container = self
            .directory
            .register_name(session, storage_name.as_str())
            .await?;
        debug!(%storage_name, "storage name registered");

        let folder = self
            .client
            .create_container(
                session,
                Placement::Random,
                self.config.storage_type_tag,
                &ContainerMetadata::storage_root_for(storage_name.as_str()),
            )
            .await?;
        debug!(%storage_name, folder = %folder.short_hex(), "storage root created");

        let public = self
            .client
            .well_known(session, &self.config.public_container, Encryption::None)
            .await?;
        self.client
            .insert(session, &public, service_path.as_bytes(), folder.as_bytes())
            .await?;
        debug!(%service_path, "storage root published");

        self.services
            .register_service_key(session, &storage_name, key, &folder)
            .await?;

        let uri = ServiceUri::new(identity.scheme, sub, storage_name.clone()).to_string();
        info!(%uri, folder = %folder.short_hex(), "provisioned storage");
        Ok(ProvisionedStorage {
            uri,
            storage_name: storage_name.to_string(),
            services_container,
            folder,
            service_path,
        })
    }

    /// Provision storage, then record its URI on the identity's profile.
    pub async fn provision_and_publish(
        &self,
        session: &Session,
        identity_uri: &str,
        hosting_sub_name: &str,
        storage_prefix: Option<&str>,
        publisher: &dyn IdentityPublisher,
        profile: &ContainerAddress,
    ) -> RegistryResult<ProvisionedStorage> {
        let provisioned = self
            .provision_storage(session, identity_uri, hosting_sub_name, storage_prefix)
            .await?;
        publisher
            .publish_storage(session, profile, &provisioned.uri)
            .await?;
        Ok(provisioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerRef;
    use crate::error::{ErrorKind, RegistryError};
    use crate::profile::ProfileDirectory;
    use pns_crypto::NameHasher;
    use pns_store::{InMemoryNetwork, MutableDataNetwork, WELL_KNOWN_PUBLIC};
    use pns_types::{IdentityProfile, TypeTag};
    use std::sync::Arc;

    fn session() -> Session {
        Session::authorized("pns-test", "token")
    }

    struct Fixture {
        network: Arc<InMemoryNetwork>,
        client: ContainerClient,
        directory: NamingDirectory,
        services: ServiceRegistry,
        provisioner: StorageProvisioner,
    }

    fn fixture() -> Fixture {
        let network = Arc::new(InMemoryNetwork::new());
        let client = ContainerClient::new(network.clone());
        let config = RegistryConfig::default();
        let directory = NamingDirectory::new(client.clone(), config.clone());
        let services = ServiceRegistry::new(client.clone(), directory.clone());
        let provisioner =
            StorageProvisioner::new(client.clone(), directory.clone(), services.clone(), config);
        Fixture {
            network,
            client,
            directory,
            services,
            provisioner,
        }
    }

    #[tokio::test]
    async fn provisions_happybeing_files() {
        let f = fixture();
        let out = f
            .provisioner
            .provision_storage(&session(), "safe://happybeing", "files", None)
            .await
            .unwrap();
        assert_eq!(out.uri, "safe://files.files-happybeing");
        assert_eq!(out.storage_name, "files-happybeing");
        assert_eq!(out.service_path, "_public/files-happybeing/root-ldp");

        let services = f.directory.resolve_name(&session(), "files-happybeing").await.unwrap();
        assert_eq!(services, NameHasher::PUBLIC_NAME.hash("files-happybeing"));
        assert_eq!(services, out.services_container);

        let folder = f
            .services
            .resolve_service(&session(), "files-happybeing", "files", "www")
            .await
            .unwrap();
        assert_eq!(folder, out.folder);

        let info = f.network.container_info(&session(), &folder).await.unwrap();
        assert_eq!(info.type_tag, TypeTag::WWW);
        assert_eq!(
            info.metadata,
            Some(ContainerMetadata::storage_root_for("files-happybeing"))
        );

        let public = f
            .client
            .well_known(&session(), WELL_KNOWN_PUBLIC, Encryption::None)
            .await
            .unwrap();
        let published = f
            .client
            .fetch(&session(), &public, out.service_path.as_bytes())
            .await
            .unwrap();
        assert_eq!(published.value, folder.as_bytes());
    }

    #[tokio::test]
    async fn scheme_and_prefix_are_honoured() {
        let f = fixture();
        let out = f
            .provisioner
            .provision_storage(&session(), "me.alice", "www", Some("data"))
            .await
            .unwrap();
        assert_eq!(out.uri, "safe://www.data-alice");
        assert_eq!(
            f.services
                .resolve_uri(&session(), "safe://data-alice", "safe")
                .await
                .unwrap(),
            out.folder
        );
    }

    #[tokio::test]
    async fn second_provisioning_conflicts() {
        let f = fixture();
        f.provisioner
            .provision_storage(&session(), "safe://happybeing", "files", None)
            .await
            .unwrap();
        let err = f
            .provisioner
            .provision_storage(&session(), "safe://happybeing", "files", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NameAlreadyExists { .. }));
    }

    #[tokio::test]
    async fn bad_input_touches_nothing() {
        let f = fixture();
        let before = f.network.container_count().unwrap();
        let err = f
            .provisioner
            .provision_storage(&session(), "safe://", "files", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = f
            .provisioner
            .provision_storage(&session(), "safe://happybeing", " ", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSubName(_)));
        assert_eq!(f.network.container_count().unwrap(), before);
    }

    #[tokio::test]
    async fn failed_publish_leaves_registered_name() {
        let f = fixture();
        let public = f
            .network
            .lookup_well_known(&session(), WELL_KNOWN_PUBLIC)
            .await
            .unwrap();
        f.network.fail_writes_to(public).unwrap();

        let err = f
            .provisioner
            .provision_storage(&session(), "safe://happybeing", "files", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        // No rollback: the name and its services container stay behind.
        let services = f.directory.resolve_name(&session(), "files-happybeing").await.unwrap();
        let listed = f
            .client
            .entries(&session(), &ContainerRef::new(services, Encryption::KeysOnly))
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn provision_and_publish_updates_profile() {
        let f = fixture();
        let profiles = ProfileDirectory::new(f.client.clone(), RegistryConfig::default());
        let profile = profiles
            .create_profile(
                &session(),
                IdentityProfile {
                    uri: Some("safe://happybeing".into()),
                    nick: Some("happybeing".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let out = f
            .provisioner
            .provision_and_publish(&session(), "safe://happybeing", "files", None, &profiles, &profile)
            .await
            .unwrap();
        let (stored, _) = profiles.fetch_profile(&session(), &profile).await.unwrap();
        assert_eq!(stored.storage, Some(out.uri));
    }
}
