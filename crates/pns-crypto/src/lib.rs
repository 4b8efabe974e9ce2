//! Cryptographic primitives for the Public Name System.
//!
//! Provides the deterministic name-to-address hash used to locate services
//! containers, and the per-container cipher used to encrypt entry keys and
//! values at rest.
//!
//! All crypto operations wrap established libraries.

pub mod cipher;
pub mod hasher;

pub use cipher::{CipherError, ContainerCipher};
pub use hasher::NameHasher;
