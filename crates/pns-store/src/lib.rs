//! Mutable-data network interface for the Public Name System.
//!
//! The network is treated as an opaque service of versioned key-value
//! containers. This crate defines that boundary and ships one backend.
//!
//! # Containers
//!
//! - A container lives at a [`ContainerAddress`](pns_types::ContainerAddress)
//!   and carries a [`TypeTag`](pns_types::TypeTag) chosen at creation.
//! - Entries are inserted at version 0. An update must name exactly the next
//!   version (`current + 1`) or the whole mutation batch is rejected.
//! - Entries are never removed.
//! - Each container owns a cipher; callers decide whether to seal keys and
//!   values before writing them.
//!
//! # Storage Backends
//!
//! All backends implement the [`MutableDataNetwork`] trait:
//!
//! - [`InMemoryNetwork`] -- `HashMap`-based simulator for tests, the CLI and
//!   the HTTP gateway, with JSON snapshot persistence

pub mod entry;
pub mod error;
pub mod memory;
pub mod session;
pub mod snapshot;
pub mod traits;

pub use entry::{ContainerInfo, Entry, EntryAction, EntryActions, Placement};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryNetwork, WELL_KNOWN_PUBLIC, WELL_KNOWN_PUBLIC_NAMES};
pub use session::{Session, SessionAuth};
pub use snapshot::NetworkSnapshot;
pub use traits::{MutableDataNetwork, SharedNetwork};
