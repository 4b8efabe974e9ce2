//! Per-name service registry.
//!
//! Each public name owns a services container mapping [`ServiceKey`] to the
//! address of the container backing that service. Keys are encrypted, values
//! are plain addresses. A key holding the empty sentinel is reserved and may
//! be filled exactly once.

use pns_store::Session;
use pns_types::{ContainerAddress, PublicName, ServiceKey, SubName};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::container::{decode_address, ContainerClient, ContainerRef, Encryption, UpsertOutcome};
use crate::directory::NamingDirectory;
use crate::error::{RegistryError, RegistryResult};
use crate::uri::ServiceUri;
use crate::validate;

/// A service entry that was written by [`ServiceRegistry::register_service`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisteredService {
    pub key: ServiceKey,
    pub resource: ContainerAddress,
    /// Entry version after the write: 0 for a fresh key, prior + 1 for a
    /// filled reservation.
    pub version: u64,
}

/// One row of [`ServiceRegistry::list_services`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ServiceRecord {
    pub key: ServiceKey,
    /// `None` while the key is only reserved.
    pub resource: Option<ContainerAddress>,
    pub version: u64,
}

#[derive(Clone)]
pub struct ServiceRegistry {
    client: ContainerClient,
    directory: NamingDirectory,
}

impl ServiceRegistry {
    pub fn new(client: ContainerClient, directory: NamingDirectory) -> Self {
        Self { client, directory }
    }

    async fn services_container(
        &self,
        session: &Session,
        public_name: &PublicName,
    ) -> RegistryResult<ContainerRef> {
        let address = self
            .directory
            .resolve_name(session, public_name.as_str())
            .await?;
        Ok(ContainerRef::new(address, Encryption::KeysOnly))
    }

    /// Point `sub_name`/`service_name` of `public_name` at `resource`.
    ///
    /// Inputs are validated before any network call. An unregistered name is
    /// `NameNotFound`; a key that already holds a value is `ServiceConflict`,
    /// even when the value is the same resource.
    pub async fn register_service(
        &self,
        session: &Session,
        public_name: &str,
        sub_name: &str,
        service_name: &str,
        resource: &ContainerAddress,
    ) -> RegistryResult<RegisteredService> {
        let sub = validate::sub_name(sub_name)?;
        let name = validate::public_name(public_name)?;
        let key = validate::service_key(&sub, service_name)?;
        validate::resource(resource)?;
        self.register_service_key(session, &name, key, resource).await
    }

    /// Like [`register_service`](Self::register_service) for an already
    /// derived key.
    pub async fn register_service_key(
        &self,
        session: &Session,
        public_name: &PublicName,
        key: ServiceKey,
        resource: &ContainerAddress,
    ) -> RegistryResult<RegisteredService> {
        validate::resource(resource)?;
        let container = self.services_container(session, public_name).await?;
        let outcome = self
            .client
            .upsert_reserved(session, &container, key.as_str().as_bytes(), resource.as_bytes())
            .await?;
        let version = match outcome {
            UpsertOutcome::Inserted => 0,
            UpsertOutcome::UpdatedReservedSlot { version } => {
                debug!(name = %public_name, %key, version, "filled reserved service slot");
                version
            }
            UpsertOutcome::Conflict => {
                warn!(name = %public_name, %key, "service key already taken");
                return Err(RegistryError::ServiceConflict {
                    name: public_name.to_string(),
                    key: key.to_string(),
                });
            }
        };
        info!(name = %public_name, %key, resource = %resource.short_hex(), "registered service");
        Ok(RegisteredService {
            key,
            resource: *resource,
            version,
        })
    }

    /// Reserve a key with the empty sentinel so it can be filled later.
    pub async fn reserve_service(
        &self,
        session: &Session,
        public_name: &str,
        sub_name: &str,
        service_name: &str,
    ) -> RegistryResult<ServiceKey> {
        let sub = validate::sub_name(sub_name)?;
        let name = validate::public_name(public_name)?;
        let key = validate::service_key(&sub, service_name)?;
        let container = self.services_container(session, &name).await?;
        match self
            .client
            .insert(session, &container, key.as_str().as_bytes(), &[])
            .await
        {
            Ok(()) => {
                debug!(%name, %key, "reserved service key");
                Ok(key)
            }
            Err(RegistryError::EntryExists) => Err(RegistryError::ServiceConflict {
                name: name.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Address behind a service key. Reserved keys are not resolvable.
    pub async fn resolve_service(
        &self,
        session: &Session,
        public_name: &str,
        sub_name: &str,
        service_name: &str,
    ) -> RegistryResult<ContainerAddress> {
        let sub = validate::sub_name(sub_name)?;
        let name = validate::public_name(public_name)?;
        let key = validate::service_key(&sub, service_name)?;
        self.resolve_service_key(session, &name, &key).await
    }

    pub async fn resolve_service_key(
        &self,
        session: &Session,
        public_name: &PublicName,
        key: &ServiceKey,
    ) -> RegistryResult<ContainerAddress> {
        let container = self.services_container(session, public_name).await?;
        match self
            .client
            .try_fetch(session, &container, key.as_str().as_bytes())
            .await?
        {
            Some(found) if !found.is_empty_sentinel() => decode_address(&found.value),
            _ => Err(RegistryError::ServiceNotFound {
                name: public_name.to_string(),
                key: key.to_string(),
            }),
        }
    }

    /// Resolve `scheme://sub.name` (bare `scheme://name` means `www`).
    pub async fn resolve_uri(
        &self,
        session: &Session,
        uri: &str,
        default_scheme: &str,
    ) -> RegistryResult<ContainerAddress> {
        let uri = ServiceUri::parse(uri, default_scheme)?;
        self.resolve_sub_name(session, &uri.public_name, &uri.sub_name)
            .await
    }

    async fn resolve_sub_name(
        &self,
        session: &Session,
        public_name: &PublicName,
        sub: &SubName,
    ) -> RegistryResult<ContainerAddress> {
        let key = validate::service_key(sub, pns_types::HOSTING_SERVICE)?;
        self.resolve_service_key(session, public_name, &key).await
    }

    /// Every service key of `public_name`, reserved ones included.
    pub async fn list_services(
        &self,
        session: &Session,
        public_name: &str,
    ) -> RegistryResult<Vec<ServiceRecord>> {
        let name = validate::public_name(public_name)?;
        let container = self.services_container(session, &name).await?;
        let mut records = Vec::new();
        for (key, value) in self.client.entries(session, &container).await? {
            let key = String::from_utf8(key)
                .map_err(|e| RegistryError::CorruptEntry(format!("service key: {e}")))?;
            let resource = if value.is_empty_sentinel() {
                None
            } else {
                Some(decode_address(&value.value)?)
            };
            records.push(ServiceRecord {
                key: ServiceKey::from_stored(key),
                resource,
                version: value.version,
            });
        }
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::error::ErrorKind;
    use pns_store::InMemoryNetwork;
    use std::sync::Arc;

    fn session() -> Session {
        Session::authorized("pns-test", "token")
    }

    fn resource(byte: u8) -> ContainerAddress {
        ContainerAddress::from_hash([byte; 32])
    }

    async fn registry_with(name: &str) -> ServiceRegistry {
        let client = ContainerClient::new(Arc::new(InMemoryNetwork::new()));
        let directory = NamingDirectory::new(client.clone(), RegistryConfig::default());
        directory.register_name(&session(), name).await.unwrap();
        ServiceRegistry::new(client, directory)
    }

    #[tokio::test]
    async fn hosting_service_uses_bare_sub_name() {
        let registry = registry_with("happybeing").await;
        let registered = registry
            .register_service(&session(), "happybeing", "blog", "www", &resource(1))
            .await
            .unwrap();
        assert_eq!(registered.key.as_str(), "blog");
        assert_eq!(registered.version, 0);
        assert_eq!(
            registry
                .resolve_service(&session(), "happybeing", "blog", "www")
                .await
                .unwrap(),
            resource(1)
        );
    }

    #[tokio::test]
    async fn other_services_use_at_form() {
        let registry = registry_with("happybeing").await;
        let registered = registry
            .register_service(&session(), "happybeing", "files", "ldp", &resource(2))
            .await
            .unwrap();
        assert_eq!(registered.key.as_str(), "files@ldp");
    }

    #[tokio::test]
    async fn unregistered_name_is_not_found() {
        let registry = registry_with("someone").await;
        let err = registry
            .register_service(&session(), "nobody", "www", "www", &resource(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::NameNotFound { .. }));
    }

    #[tokio::test]
    async fn validation_runs_first() {
        let registry = registry_with("n").await;
        let s = session();
        let cases = [
            registry.register_service(&s, "n", "", "www", &resource(1)).await,
            registry.register_service(&s, "", "a", "www", &resource(1)).await,
            registry.register_service(&s, "n", "a", "", &resource(1)).await,
            registry
                .register_service(&s, "n", "a", "www", &ContainerAddress::null())
                .await,
        ];
        assert!(matches!(cases[0], Err(RegistryError::InvalidSubName(_))));
        assert!(matches!(cases[1], Err(RegistryError::InvalidPublicName(_))));
        assert!(matches!(cases[2], Err(RegistryError::InvalidServiceName(_))));
        assert!(matches!(cases[3], Err(RegistryError::InvalidServiceName(_))));
    }

    #[tokio::test]
    async fn reserved_slot_is_filled_at_next_version() {
        let registry = registry_with("happybeing").await;
        registry
            .reserve_service(&session(), "happybeing", "files", "www")
            .await
            .unwrap();
        assert!(matches!(
            registry
                .resolve_service(&session(), "happybeing", "files", "www")
                .await,
            Err(RegistryError::ServiceNotFound { .. })
        ));

        let registered = registry
            .register_service(&session(), "happybeing", "files", "www", &resource(7))
            .await
            .unwrap();
        assert_eq!(registered.version, 1);
        assert_eq!(
            registry
                .resolve_service(&session(), "happybeing", "files", "www")
                .await
                .unwrap(),
            resource(7)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_fills_of_a_reservation_have_one_winner() {
        let registry = Arc::new(registry_with("happybeing").await);
        for round in 0..16 {
            let sub_name = format!("files{round}");
            registry
                .reserve_service(&session(), "happybeing", &sub_name, "www")
                .await
                .unwrap();

            let handles: Vec<_> = [resource(5), resource(6)]
                .into_iter()
                .map(|target| {
                    let registry = Arc::clone(&registry);
                    let sub_name = sub_name.clone();
                    tokio::spawn(async move {
                        registry
                            .register_service(&session(), "happybeing", &sub_name, "www", &target)
                            .await
                    })
                })
                .collect();

            let mut winners = Vec::new();
            let mut conflicts = 0;
            for h in handles {
                match h.await.unwrap() {
                    Ok(registered) => winners.push(registered),
                    Err(RegistryError::ServiceConflict { .. }) => conflicts += 1,
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            assert_eq!(winners.len(), 1);
            assert_eq!(conflicts, 1);
            assert_eq!(winners[0].version, 1);
            assert_eq!(
                registry
                    .resolve_service(&session(), "happybeing", &sub_name, "www")
                    .await
                    .unwrap(),
                winners[0].resource
            );
        }
    }

    #[tokio::test]
    async fn occupied_key_conflicts() {
        let registry = registry_with("happybeing").await;
        registry
            .register_service(&session(), "happybeing", "files", "www", &resource(1))
            .await
            .unwrap();
        for other in [resource(2), resource(1)] {
            let err = registry
                .register_service(&session(), "happybeing", "files", "www", &other)
                .await
                .unwrap_err();
            assert!(matches!(err, RegistryError::ServiceConflict { .. }));
            assert_eq!(err.kind(), ErrorKind::Conflict);
        }
        assert_eq!(
            registry
                .resolve_service(&session(), "happybeing", "files", "www")
                .await
                .unwrap(),
            resource(1)
        );
    }

    #[tokio::test]
    async fn resolve_uri_applies_key_rule() {
        let registry = registry_with("happybeing").await;
        registry
            .register_service(&session(), "happybeing", "www", "www", &resource(3))
            .await
            .unwrap();
        registry
            .register_service(&session(), "happybeing", "blog", "www", &resource(4))
            .await
            .unwrap();
        let s = session();
        assert_eq!(registry.resolve_uri(&s, "safe://happybeing", "safe").await.unwrap(), resource(3));
        assert_eq!(
            registry.resolve_uri(&s, "safe://blog.happybeing", "safe").await.unwrap(),
            resource(4)
        );
        assert!(matches!(
            registry.resolve_uri(&s, "safe://shop.happybeing", "safe").await,
            Err(RegistryError::ServiceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_includes_reservations() {
        let registry = registry_with("happybeing").await;
        registry
            .register_service(&session(), "happybeing", "files", "www", &resource(1))
            .await
            .unwrap();
        registry
            .reserve_service(&session(), "happybeing", "blog", "www")
            .await
            .unwrap();
        let records = registry.list_services(&session(), "happybeing").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key.as_str(), "blog");
        assert_eq!(records[0].resource, None);
        assert_eq!(records[1].key.as_str(), "files");
        assert_eq!(records[1].resource, Some(resource(1)));
    }
}
