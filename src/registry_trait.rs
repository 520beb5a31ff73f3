//! Uniform views over registries of any key and value types.
//!
//! [`LookupApi`] provides default implementations for the registry surface,
//! requiring only one accessor (`lookup`) from the implementor. It is
//! implemented by [`DualKeyRegistry`] itself and by every module generated by
//! [`define_lookup!`](crate::define_lookup).
//!
//! [`AnyLookup`] is the object-safe part of that surface, so registries of
//! different entity kinds can be handled side by side as `&dyn AnyLookup`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::Identifiable;
use crate::keys::{IdentityKey, IndexKey};
use crate::{DualKeyRegistry, RegistryError};

/// Core trait giving generic code access to a registry.
pub trait LookupApi {
    type Key: IdentityKey;
    type Index: IndexKey;
    type Value: ?Sized + Identifiable<Self::Key, Self::Index>;

    /// Access the backing registry.
    fn lookup(&self) -> &DualKeyRegistry<Self::Key, Self::Index, Self::Value>;

    fn key_type_name(&self) -> &'static str {
        std::any::type_name::<Self::Key>()
    }

    fn index_type_name(&self) -> &'static str {
        std::any::type_name::<Self::Index>()
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<Self::Value>()
    }

    fn count(&self) -> usize {
        self.lookup().count()
    }

    fn get(&self, identity: Self::Key) -> Option<Arc<Self::Value>> {
        self.lookup().get_by_identity(identity)
    }

    fn get_at(&self, index: Self::Index) -> Option<Arc<Self::Value>> {
        self.lookup().get_by_index(index)
    }

    /// Strict insert. See [`DualKeyRegistry::insert_arc`].
    fn insert_arc(&self, value: Arc<Self::Value>) -> bool {
        self.lookup().insert_arc(value)
    }

    /// Overwrite-set by identity. See [`DualKeyRegistry::set_by_identity`].
    fn set(&self, identity: Self::Key, value: Arc<Self::Value>) -> Result<(), RegistryError> {
        self.lookup().set_by_identity(identity, value)
    }

    /// Overwrite-set by index. See [`DualKeyRegistry::set_by_index`].
    fn set_at(&self, index: Self::Index, value: Arc<Self::Value>) -> Result<(), RegistryError> {
        self.lookup().set_by_index(index, value)
    }

    fn delete(&self, identity: Self::Key) -> bool {
        self.lookup().delete_by_identity(identity)
    }

    fn delete_at(&self, index: Self::Index) -> bool {
        self.lookup().delete_by_index(index)
    }

    fn next_free_index(&self) -> Result<Self::Index, RegistryError> {
        self.lookup().next_free_index()
    }

    fn snapshot(&self) -> HashMap<Self::Key, Arc<Self::Value>> {
        self.lookup().snapshot_by_identity()
    }

    fn index_snapshot(&self) -> HashMap<Self::Index, Arc<Self::Value>> {
        self.lookup().snapshot_by_index()
    }

    fn clear(&self) {
        self.lookup().clear()
    }
}

impl<K, I, V> LookupApi for DualKeyRegistry<K, I, V>
where
    K: IdentityKey,
    I: IndexKey,
    V: ?Sized + Identifiable<K, I>,
{
    type Key = K;
    type Index = I;
    type Value = V;

    fn lookup(&self) -> &DualKeyRegistry<K, I, V> {
        self
    }
}

/// Key-type-independent view of a registry.
pub trait AnyLookup {
    fn label(&self) -> &'static str;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn clear(&self);
    fn key_type_name(&self) -> &'static str;
    fn index_type_name(&self) -> &'static str;
    fn value_type_name(&self) -> &'static str;
}

impl<L: LookupApi> AnyLookup for L {
    fn label(&self) -> &'static str {
        self.lookup().label()
    }

    fn len(&self) -> usize {
        LookupApi::count(self)
    }

    fn clear(&self) {
        LookupApi::clear(self)
    }

    fn key_type_name(&self) -> &'static str {
        LookupApi::key_type_name(self)
    }

    fn index_type_name(&self) -> &'static str {
        LookupApi::index_type_name(self)
    }

    fn value_type_name(&self) -> &'static str {
        LookupApi::value_type_name(self)
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
