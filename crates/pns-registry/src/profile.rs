//! Identity profile documents and the publisher seam used by provisioning.

use async_trait::async_trait;
use pns_store::{Placement, Session};
use pns_types::{ContainerAddress, ContainerMetadata, IdentityProfile};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::RegistryConfig;
use crate::container::{ContainerClient, ContainerRef};
use crate::error::{RegistryError, RegistryResult};

/// Entry key holding the JSON document inside a profile container.
pub const PROFILE_KEY: &[u8] = b"profile";

/// Writes the storage location of a provisioned identity back to its profile.
#[async_trait]
pub trait IdentityPublisher: Send + Sync {
    async fn publish_storage(
        &self,
        session: &Session,
        profile: &ContainerAddress,
        storage_uri: &str,
    ) -> RegistryResult<()>;
}

/// One row of [`ProfileDirectory::list_profiles`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub address: ContainerAddress,
    pub profile: IdentityProfile,
    pub version: u64,
}

/// Profiles stored as one plain JSON entry per profile container.
#[derive(Clone)]
pub struct ProfileDirectory {
    client: ContainerClient,
    config: RegistryConfig,
}

fn sanitize(profile: IdentityProfile) -> RegistryResult<IdentityProfile> {
    profile
        .sanitized()
        .map_err(|e| RegistryError::InvalidProfile(e.to_string()))
}

fn encode(profile: &IdentityProfile) -> RegistryResult<Vec<u8>> {
    profile
        .to_json()
        .map_err(|e| RegistryError::InvalidProfile(e.to_string()))
}

impl ProfileDirectory {
    pub fn new(client: ContainerClient, config: RegistryConfig) -> Self {
        Self { client, config }
    }

    /// Store a new profile in a fresh container and return its address.
    pub async fn create_profile(
        &self,
        session: &Session,
        profile: IdentityProfile,
    ) -> RegistryResult<ContainerAddress> {
        let profile = sanitize(profile)?;
        let uri = profile.uri.clone().unwrap_or_default();
        let address = self
            .client
            .create_container(
                session,
                Placement::Random,
                self.config.profile_type_tag,
                &ContainerMetadata::new(
                    format!("Identity profile for {uri}"),
                    "Public identity profile document",
                ),
            )
            .await?;
        self.client
            .insert(session, &ContainerRef::plain(address), PROFILE_KEY, &encode(&profile)?)
            .await?;
        info!(%uri, address = %address.short_hex(), "created identity profile");
        Ok(address)
    }

    /// The stored profile and the version it was read at.
    pub async fn fetch_profile(
        &self,
        session: &Session,
        address: &ContainerAddress,
    ) -> RegistryResult<(IdentityProfile, u64)> {
        let stored = self
            .client
            .fetch(session, &ContainerRef::plain(*address), PROFILE_KEY)
            .await?;
        let profile = IdentityProfile::from_json(&stored.value)
            .map_err(|e| RegistryError::CorruptEntry(e.to_string()))?;
        Ok((profile, stored.version))
    }

    /// Every profile owned by the session's app, ordered by address.
    ///
    /// Profile containers whose document was never written are skipped.
    pub async fn list_profiles(&self, session: &Session) -> RegistryResult<Vec<ProfileSummary>> {
        let containers = self
            .client
            .network()
            .list_containers(session, self.config.profile_type_tag)
            .await?;
        let mut profiles = Vec::new();
        for info in containers {
            if info.owner.as_deref() != Some(session.app_id()) {
                continue;
            }
            let Some(stored) = self
                .client
                .try_fetch(session, &ContainerRef::plain(info.address), PROFILE_KEY)
                .await?
            else {
                debug!(address = %info.address.short_hex(), "profile container has no document");
                continue;
            };
            let profile = IdentityProfile::from_json(&stored.value)
                .map_err(|e| RegistryError::CorruptEntry(e.to_string()))?;
            profiles.push(ProfileSummary {
                address: info.address,
                profile,
                version: stored.version,
            });
        }
        Ok(profiles)
    }

    /// Replace the profile; fails with `VersionConflict` if it changed since
    /// `read_version`.
    pub async fn update_profile(
        &self,
        session: &Session,
        address: &ContainerAddress,
        profile: IdentityProfile,
        read_version: u64,
    ) -> RegistryResult<u64> {
        let profile = sanitize(profile)?;
        let version = self
            .client
            .update(
                session,
                &ContainerRef::plain(*address),
                PROFILE_KEY,
                &encode(&profile)?,
                read_version,
            )
            .await?;
        info!(address = %address.short_hex(), version, "updated identity profile");
        Ok(version)
    }
}

#[async_trait]
impl IdentityPublisher for ProfileDirectory {
    async fn publish_storage(
        &self,
        session: &Session,
        profile: &ContainerAddress,
        storage_uri: &str,
    ) -> RegistryResult<()> {
        let (mut current, version) = self.fetch_profile(session, profile).await?;
        current.storage = Some(storage_uri.to_string());
        self.update_profile(session, profile, current, version).await?;
        Ok(())
    }
}
