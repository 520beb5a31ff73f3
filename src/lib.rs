//! # Dual-Key Registry
//!
//! A thread-safe in-memory collection where every entry is addressable both by
//! a globally unique identity key (typically a [`uuid::Uuid`]) and by a dense
//! integer index.
//!
//! The two keyspaces are kept in lockstep: an entry is visible under both of
//! its keys or under neither, and overwriting one key evicts whatever stale
//! mapping the other keyspace held.
//!
//! ## Quick Start
//!
//! ```rust
//! use dual_key_registry::{DualKeyRegistry, Identifiable};
//! use std::sync::Arc;
//! use uuid::Uuid;
//!
//! struct Item {
//!     id: Uuid,
//!     slot: i32,
//! }
//!
//! impl Identifiable<Uuid, i32> for Item {
//!     fn identity(&self) -> Uuid { self.id }
//!     fn index(&self) -> i32 { self.slot }
//! }
//!
//! let items = DualKeyRegistry::<Uuid, i32, Item>::with_label("items");
//! let id = Uuid::new_v4();
//!
//! assert!(items.insert(Item { id, slot: 0 }));
//! assert!(!items.insert(Item { id: Uuid::new_v4(), slot: 0 })); // index taken
//!
//! items.set_by_index(0, Arc::new(Item { id: Uuid::new_v4(), slot: 0 })).unwrap();
//! assert!(items.get_by_identity(id).is_none());
//! assert_eq!(items.count(), 1);
//! ```
//!
//! ## Features
//!
//! - **Thread-safe**: one lock guards both maps; snapshots are independent copies
//! - **Fail-loud**: internal inconsistencies panic instead of returning partial results
//! - **Heterogeneous values**: store `dyn Trait` values and narrow them with [`DualKeyRegistry::try_get_typed`]
//! - **Tracing support**: `tracing` diagnostics plus an optional per-registry event callback
//!
//! ## Main Types
//!
//! - [`DualKeyRegistry`] - The registry itself
//! - [`LookupApi`] / [`AnyLookup`] - Uniform views for generic code
//! - [`EntityFactory`] - Constructor table for runtime-selected entity kinds
//! - [`define_lookup!`] - Named process-global registries

mod entity;
mod factory;
mod keys;
mod macros;
mod registry;
mod registry_error;
mod registry_event;
mod registry_trait;

pub use entity::{AnyEntity, Identifiable, Named};
pub use factory::{Constructor, EntityFactory, EntityKind};
pub use keys::{GenerateIdentity, IdentityKey, IndexKey};
pub use registry::{DualKeyRegistry, TraceCallback};
pub use registry_error::RegistryError;
pub use registry_event::{LookupKey, RegistryEvent};
pub use registry_trait::{AnyLookup, LookupApi};
