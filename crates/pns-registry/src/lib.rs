//! Public name directory and service registry for the Public Name System.
//!
//! Everything here is built on two network primitives: inserting a new key
//! and updating a key at exactly its next version. On top of them sit:
//!
//! - [`ContainerClient`] -- encrypted, versioned entry access and the
//!   reserved-slot upsert
//! - [`NamingDirectory`] -- public name → services container
//! - [`ServiceRegistry`] -- service key → resource container, per name
//! - [`StorageProvisioner`] -- the storage provisioning workflow
//! - [`ProfileDirectory`] -- identity profile documents
//!
//! [`Pns`] wires all of them to one network.

pub mod config;
pub mod container;
pub mod directory;
pub mod error;
pub mod profile;
pub mod provision;
pub mod registry;
pub mod services;
pub mod uri;
pub mod validate;

pub use config::RegistryConfig;
pub use container::{ContainerClient, ContainerRef, Encryption, UpsertOutcome, VersionedValue};
pub use directory::NamingDirectory;
pub use error::{ErrorKind, RegistryError, RegistryResult};
pub use profile::{IdentityPublisher, ProfileDirectory, ProfileSummary};
pub use provision::{ProvisionedStorage, StorageProvisioner};
pub use registry::Pns;
pub use services::{RegisteredService, ServiceRecord, ServiceRegistry};
pub use uri::{IdentityUri, ServiceUri};
