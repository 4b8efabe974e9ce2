use pns_store::SharedNetwork;

use crate::config::RegistryConfig;
use crate::container::ContainerClient;
use crate::directory::NamingDirectory;
use crate::profile::ProfileDirectory;
use crate::provision::StorageProvisioner;
use crate::services::ServiceRegistry;

/// All registry components wired to one network.
#[derive(Clone)]
pub struct Pns {
    pub config: RegistryConfig,
    pub client: ContainerClient,
    pub directory: NamingDirectory,
    pub services: ServiceRegistry,
    pub provisioner: StorageProvisioner,
    pub profiles: ProfileDirectory,
}

impl Pns {
    pub fn new(network: SharedNetwork, config: RegistryConfig) -> Self {
        let client = ContainerClient::new(network);
        let directory = NamingDirectory::new(client.clone(), config.clone());
        let services = ServiceRegistry::new(client.clone(), directory.clone());
        let provisioner = StorageProvisioner::new(
            client.clone(),
            directory.clone(),
            services.clone(),
            config.clone(),
        );
        let profiles = ProfileDirectory::new(client.clone(), config.clone());
        Self {
            config,
            client,
            directory,
            services,
            provisioner,
            profiles,
        }
    }
}
