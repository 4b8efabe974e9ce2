//! Foundation types for the Public Name System (PNS).
//!
//! This crate provides the identifiers and value types shared by every other
//! PNS crate: where a container lives, what schema it carries, and the
//! human-readable names and service keys that point at it.
//!
//! # Key Types
//!
//! - [`ContainerAddress`] -- Opaque 32-byte address of a remote container
//! - [`TypeTag`] -- Schema discriminator chosen when a container is created
//! - [`ContainerMetadata`] -- Human-readable name/description applied at setup
//! - [`PublicName`] -- Normalized, validated public name
//! - [`SubName`] / [`ServiceKey`] -- Service lookup keys inside a services container
//! - [`IdentityProfile`] -- Validated identity payload handed over by profile tooling

pub mod address;
pub mod error;
pub mod name;
pub mod profile;
pub mod tag;

pub use address::ContainerAddress;
pub use error::TypeError;
pub use name::{PublicName, ServiceKey, SubName, HOSTING_SERVICE};
pub use profile::IdentityProfile;
pub use tag::{ContainerMetadata, TypeTag};
