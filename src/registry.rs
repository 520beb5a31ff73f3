//! The dual-keyed registry.
//!
//! Every entry is filed under its identity key and its index key. Both maps
//! live behind one `Mutex` and every mutation goes through a single install
//! routine, so a reader can never observe an entry in one keyspace but not
//! the other.
//!
//! # Examples
//!
//! ```
//! use dual_key_registry::{DualKeyRegistry, Identifiable};
//!
//! #[derive(Debug, PartialEq)]
//! struct Spell {
//!     id: u64,
//!     slot: i32,
//! }
//!
//! impl Identifiable<u64, i32> for Spell {
//!     fn identity(&self) -> u64 { self.id }
//!     fn index(&self) -> i32 { self.slot }
//! }
//!
//! let spells = DualKeyRegistry::<u64, i32, Spell>::with_label("spells");
//! assert!(spells.insert(Spell { id: 10, slot: 0 }));
//!
//! assert_eq!(spells.get_by_index(0).unwrap().id, 10);
//! assert_eq!(spells.get_by_identity(10).unwrap().slot, 0);
//! assert_eq!(spells.next_free_index(), Ok(1));
//! ```

use std::any::Any;
use std::collections::{hash_map, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::entity::{AnyEntity, Identifiable, Named};
use crate::keys::{IdentityKey, IndexKey};
use crate::{LookupKey, RegistryError, RegistryEvent};

/// Type alias for the user-supplied tracing callback.
///
/// The callback receives every [`RegistryEvent`] the registry emits. It is
/// invoked after the state lock has been released, so it may read from or
/// mutate the registry that emitted the event.
pub type TraceCallback<K, I> = dyn Fn(&RegistryEvent<K, I>) + Send + Sync + 'static;

struct Slot<I, V: ?Sized> {
    index: I,
    value: Arc<V>,
}

/// Identity map holding `(index, value)` plus the index -> identity map.
///
/// The keys captured here are the ones the entry was installed with; the
/// value is never asked for its keys again while it is stored.
struct Maps<K, I, V: ?Sized> {
    by_identity: HashMap<K, Slot<I, V>>,
    by_index: HashMap<I, K>,
}

impl<K, I, V: ?Sized> Default for Maps<K, I, V> {
    fn default() -> Self {
        Self {
            by_identity: HashMap::new(),
            by_index: HashMap::new(),
        }
    }
}

#[cold]
#[track_caller]
fn invariant_violation(label: &str, detail: fmt::Arguments<'_>) -> ! {
    tracing::error!(registry = label, %detail, "registry invariant violation");
    panic!("registry `{label}` invariant violation: {detail}");
}

fn validate<K: IdentityKey, I: IndexKey>(identity: K, index: I) -> Result<(), RegistryError> {
    if !identity.is_valid() {
        return Err(RegistryError::invalid_identity(identity));
    }
    if !index.is_valid() {
        return Err(RegistryError::invalid_index(index));
    }
    Ok(())
}

fn narrow<V, T>(value: Arc<V>) -> Result<Arc<T>, RegistryError>
where
    V: ?Sized + AnyEntity,
    T: Any + Send + Sync,
{
    <V as AnyEntity>::into_any(value)
        .downcast::<T>()
        .map_err(|_| RegistryError::TypeMismatch {
            type_name: std::any::type_name::<T>(),
        })
}

impl<K: IdentityKey, I: IndexKey, V: ?Sized> Maps<K, I, V> {
    fn check_parity(&self, label: &str) {
        let (identities, indices) = (self.by_identity.len(), self.by_index.len());
        if identities != indices {
            invariant_violation(
                label,
                format_args!("{identities} identity slots but {indices} index slots"),
            );
        }
    }

    fn value_at(&self, label: &str, index: I) -> Option<Arc<V>> {
        let identity = self.by_index.get(&index)?;
        match self.by_identity.get(identity) {
            Some(slot) if slot.index == index => Some(Arc::clone(&slot.value)),
            _ => invariant_violation(
                label,
                format_args!("index {index:?} points at {identity:?}, which is not filed under it"),
            ),
        }
    }

    /// Installs `value` under both keys.
    ///
    /// In overwrite mode the entry currently holding `identity` loses its index
    /// slot and the entry currently holding `index` loses its identity slot
    /// before the new value is written. Every superseded `(identity, index)`
    /// pair is pushed onto `evicted`. Replacing a value under the same two
    /// keys evicts nothing.
    fn install(
        &mut self,
        label: &str,
        identity: K,
        index: I,
        value: Arc<V>,
        overwrite: bool,
        evicted: &mut Vec<(K, I)>,
    ) -> Result<(), RegistryError> {
        let previous_index = self.by_identity.get(&identity).map(|slot| slot.index);
        let previous_owner = self.by_index.get(&index).copied();

        if !overwrite {
            if previous_index.is_some() {
                return Err(RegistryError::IdentityOccupied {
                    key: format!("{identity:?}"),
                });
            }
            if previous_owner.is_some() {
                return Err(RegistryError::IndexOccupied {
                    index: format!("{index:?}"),
                });
            }
        }

        if let Some(old_index) = previous_index.filter(|old_index| *old_index != index) {
            if self.by_index.remove(&old_index) != Some(identity) {
                invariant_violation(
                    label,
                    format_args!("{identity:?} was filed under index {old_index:?} it did not own"),
                );
            }
            evicted.push((identity, old_index));
        }

        if let Some(owner) = previous_owner.filter(|owner| *owner != identity) {
            match self.by_identity.remove(&owner) {
                Some(slot) if slot.index == index => evicted.push((owner, index)),
                _ => invariant_violation(
                    label,
                    format_args!("index {index:?} pointed at {owner:?}, which was not filed under it"),
                ),
            }
        }

        self.by_identity.insert(identity, Slot { index, value });
        self.by_index.insert(index, identity);
        self.check_parity(label);
        Ok(())
    }

    fn remove(&mut self, label: &str, identity: K, index: I) -> Option<Arc<V>> {
        let filed = self.by_identity.get(&identity).map(|slot| slot.index) == Some(index);
        let owned = self.by_index.get(&index) == Some(&identity);

        match (filed, owned) {
            (true, true) => {}
            (false, false) => return None,
            _ => invariant_violation(
                label,
                format_args!("entry ({identity:?}, {index:?}) is present in only one map"),
            ),
        }

        self.by_index.remove(&index);
        let slot = self.by_identity.remove(&identity)?;
        self.check_parity(label);
        Some(slot.value)
    }

    fn remove_identity(&mut self, label: &str, identity: K) -> Option<I> {
        let index = self.by_identity.get(&identity)?.index;
        self.remove(label, identity, index).map(|_| index)
    }

    fn remove_index(&mut self, label: &str, index: I) -> Option<K> {
        let identity = *self.by_index.get(&index)?;
        self.remove(label, identity, index).map(|_| identity)
    }
}

/// A concurrency-safe collection addressing every entry by identity and by index.
///
/// `K` is the identity key, `I` the index key, and `V` the stored value, which
/// may be unsized (`dyn Trait`). Values are shared as `Arc<V>`.
pub struct DualKeyRegistry<K, I, V: ?Sized> {
    label: &'static str,
    state: Mutex<Maps<K, I, V>>,
    trace: Mutex<Option<Arc<TraceCallback<K, I>>>>,
}

impl<K, I, V: ?Sized> DualKeyRegistry<K, I, V> {
    /// Creates an empty registry labelled `"lookup"`.
    pub fn new() -> Self {
        Self::with_label("lookup")
    }

    /// Creates an empty registry. The label names it in logs and panics.
    pub fn with_label(label: &'static str) -> Self {
        Self {
            label,
            state: Mutex::new(Maps::default()),
            trace: Mutex::new(None),
        }
    }

    /// Name used in logs and panic messages.
    pub fn label(&self) -> &'static str {
        self.label
    }

    fn state(&self) -> MutexGuard<'_, Maps<K, I, V>> {
        // Only invariant checks panic while the lock is held.
        self.state.lock().unwrap_or_else(|_| {
            invariant_violation(
                self.label,
                format_args!("state lock poisoned by an earlier violation"),
            )
        })
    }

    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Sets a callback invoked for every registry operation.
    ///
    /// Replaces any previous callback. A poisoned trace lock is recovered.
    pub fn set_trace_callback(
        &self,
        callback: impl Fn(&RegistryEvent<K, I>) + Send + Sync + 'static,
    ) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = Some(Arc::new(callback));
    }

    /// Clears the tracing callback. Stored entries are unaffected.
    pub fn clear_trace_callback(&self) {
        let mut guard = self.trace.lock().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    fn emit_event(&self, event: RegistryEvent<K, I>) {
        let callback = self
            .trace
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone();
        if let Some(callback) = callback {
            callback(&event);
        }
    }
}

impl<K, I, V: ?Sized> Default for DualKeyRegistry<K, I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, I, V> DualKeyRegistry<K, I, V>
where
    K: IdentityKey,
    I: IndexKey,
    V: ?Sized + Identifiable<K, I>,
{
    // -------------------------------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------------------------------

    /// Returns the value filed under `identity`. Invalid keys are never found.
    pub fn get_by_identity(&self, identity: K) -> Option<Arc<V>> {
        let found = if identity.is_valid() {
            self.state()
                .by_identity
                .get(&identity)
                .map(|slot| Arc::clone(&slot.value))
        } else {
            None
        };

        tracing::trace!(registry = self.label, ?identity, found = found.is_some(), "get");
        self.emit_event(RegistryEvent::Get {
            key: LookupKey::Identity(identity),
            found: found.is_some(),
        });
        found
    }

    /// Returns the value filed under `index`. Negative indices are never found.
    pub fn get_by_index(&self, index: I) -> Option<Arc<V>> {
        let found = if index.is_valid() {
            self.state().value_at(self.label, index)
        } else {
            None
        };

        tracing::trace!(registry = self.label, ?index, found = found.is_some(), "get");
        self.emit_event(RegistryEvent::Get {
            key: LookupKey::Index(index),
            found: found.is_some(),
        });
        found
    }

    /// Whether an entry is filed under `identity`. Invalid keys are never present.
    pub fn contains_identity(&self, identity: K) -> bool {
        identity.is_valid() && self.state().by_identity.contains_key(&identity)
    }

    /// Whether an entry is filed under `index`. Invalid keys are never present.
    pub fn contains_index(&self, index: I) -> bool {
        index.is_valid() && self.state().by_index.contains_key(&index)
    }

    /// Looks up `identity` and narrows the value to `T`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::TypeMismatch`] if the stored value is not a `T`.
    ///
    /// An absent entry is `Ok(None)`.
    pub fn try_get_typed<T>(&self, identity: K) -> Result<Option<Arc<T>>, RegistryError>
    where
        V: AnyEntity,
        T: Any + Send + Sync,
    {
        self.get_by_identity(identity).map(narrow::<V, T>).transpose()
    }

    /// Looks up `index` and narrows the value to `T`. See [`Self::try_get_typed`].
    pub fn try_get_typed_at<T>(&self, index: I) -> Result<Option<Arc<T>>, RegistryError>
    where
        V: AnyEntity,
        T: Any + Send + Sync,
    {
        self.get_by_index(index).map(narrow::<V, T>).transpose()
    }

    /// Number of entries.
    ///
    /// # Panics
    ///
    /// If the two maps disagree in size, which means the registry is corrupt.
    pub fn count(&self) -> usize {
        let maps = self.state();
        maps.check_parity(self.label);
        maps.by_identity.len()
    }

    /// Whether the registry holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Walks every entry and checks both maps point at each other.
    ///
    /// # Panics
    ///
    /// On any size mismatch or orphaned cross-reference.
    pub fn assert_consistent(&self) {
        let maps = self.state();
        maps.check_parity(self.label);
        for (identity, slot) in &maps.by_identity {
            if maps.by_index.get(&slot.index) != Some(identity) {
                invariant_violation(
                    self.label,
                    format_args!("{identity:?} is filed under index {:?} it does not own", slot.index),
                );
            }
        }
    }

    /// Point-in-time copy of the identity map.
    pub fn snapshot_by_identity(&self) -> HashMap<K, Arc<V>> {
        self.state()
            .by_identity
            .iter()
            .map(|(identity, slot)| (*identity, Arc::clone(&slot.value)))
            .collect()
    }

    /// Point-in-time copy of the index map.
    pub fn snapshot_by_index(&self) -> HashMap<I, Arc<V>> {
        self.state()
            .by_identity
            .values()
            .map(|slot| (slot.index, Arc::clone(&slot.value)))
            .collect()
    }

    /// Every stored identity key, in no particular order.
    pub fn identities(&self) -> Vec<K> {
        self.state().by_identity.keys().copied().collect()
    }

    /// Every stored index key, in no particular order.
    pub fn indices(&self) -> Vec<I> {
        self.state().by_index.keys().copied().collect()
    }

    /// Every stored value, in no particular order.
    pub fn values(&self) -> Vec<Arc<V>> {
        self.state()
            .by_identity
            .values()
            .map(|slot| Arc::clone(&slot.value))
            .collect()
    }

    /// Display names of every entry, in identity-map order.
    pub fn names(&self) -> Vec<String>
    where
        V: Named,
    {
        self.values()
            .iter()
            .map(|value| value.name().to_owned())
            .collect()
    }

    /// One past the highest stored index, or [`IndexKey::FIRST`] when empty.
    ///
    /// Another writer may claim the returned index before the caller inserts
    /// it. Use [`Self::insert_with_next_index`] to allocate and insert in one
    /// step.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::IndexExhausted`] if the highest index has no successor.
    pub fn next_free_index(&self) -> Result<I, RegistryError> {
        let maps = self.state();
        maps.check_parity(self.label);
        match maps.by_index.keys().max() {
            None => Ok(I::FIRST),
            Some(last) => last.successor().ok_or_else(|| RegistryError::IndexExhausted {
                last: format!("{last:?}"),
            }),
        }
    }

    /// Iterates an identity snapshot.
    pub fn iter(&self) -> hash_map::IntoIter<K, Arc<V>> {
        self.snapshot_by_identity().into_iter()
    }

    /// Iterates an index snapshot.
    pub fn iter_by_index(&self) -> hash_map::IntoIter<I, Arc<V>> {
        self.snapshot_by_index().into_iter()
    }

    // -------------------------------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------------------------------

    /// Inserts a value unless either of its keys is invalid or occupied.
    pub fn insert(&self, value: V) -> bool
    where
        V: Sized,
    {
        self.insert_arc(Arc::new(value))
    }

    /// Inserts an `Arc`-wrapped value unless either of its keys is invalid or occupied.
    pub fn insert_arc(&self, value: Arc<V>) -> bool {
        self.try_insert_arc(value).is_ok()
    }

    /// Strict insert reporting why it was refused.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidIdentity`] / [`RegistryError::InvalidIndex`]
    /// - [`RegistryError::IdentityOccupied`] / [`RegistryError::IndexOccupied`]
    pub fn try_insert_arc(&self, value: Arc<V>) -> Result<(), RegistryError> {
        self.install(value, false)
    }

    /// Stores `value` under `identity`, replacing whatever occupies either of its keys.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::KeyMismatch`] if `identity` is not `value.identity()`
    /// - [`RegistryError::InvalidIdentity`] / [`RegistryError::InvalidIndex`]
    pub fn set_by_identity(&self, identity: K, value: Arc<V>) -> Result<(), RegistryError> {
        let own = value.identity();
        if own != identity {
            return Err(RegistryError::key_mismatch(identity, own));
        }
        self.install(value, true)
    }

    /// Stores `value` under `index`, replacing whatever occupies either of its keys.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::KeyMismatch`] if `index` is not `value.index()`
    /// - [`RegistryError::InvalidIdentity`] / [`RegistryError::InvalidIndex`]
    pub fn set_by_index(&self, index: I, value: Arc<V>) -> Result<(), RegistryError> {
        let own = value.index();
        if own != index {
            return Err(RegistryError::key_mismatch(index, own));
        }
        self.install(value, true)
    }

    /// Allocates the next free index, builds the value for it and inserts it.
    ///
    /// `make` runs outside the lock. If another writer takes the index first,
    /// a fresh index is allocated and `make` is called again.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::KeyMismatch`] if the built value reports another index
    /// - [`RegistryError::IdentityOccupied`] if its identity is already stored
    /// - [`RegistryError::IndexExhausted`], [`RegistryError::InvalidIdentity`]
    pub fn insert_with_next_index<F>(&self, mut make: F) -> Result<Arc<V>, RegistryError>
    where
        F: FnMut(I) -> Arc<V>,
    {
        self.try_insert_with_next_index(|index| Ok(make(index)))
    }

    /// Like [`Self::insert_with_next_index`], but `make` may refuse the index.
    ///
    /// An error returned by `make` is passed through and nothing is inserted.
    pub fn try_insert_with_next_index<F>(&self, mut make: F) -> Result<Arc<V>, RegistryError>
    where
        F: FnMut(I) -> Result<Arc<V>, RegistryError>,
    {
        loop {
            let index = self.next_free_index()?;
            let value = make(index)?;
            let own = value.index();
            if own != index {
                return Err(RegistryError::key_mismatch(index, own));
            }

            match self.try_insert_arc(Arc::clone(&value)) {
                Ok(()) => return Ok(value),
                Err(RegistryError::IndexOccupied { .. }) => {
                    tracing::debug!(registry = self.label, ?index, "index claimed concurrently, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn install(&self, value: Arc<V>, overwrite: bool) -> Result<(), RegistryError> {
        let identity = value.identity();
        let index = value.index();
        let mut evicted = Vec::new();

        let result = match validate(identity, index) {
            Ok(()) => self
                .state()
                .install(self.label, identity, index, value, overwrite, &mut evicted),
            Err(err) => Err(err),
        };

        for (old_identity, old_index) in evicted {
            tracing::debug!(
                registry = self.label,
                identity = ?old_identity,
                index = ?old_index,
                "superseded entry evicted"
            );
            self.emit_event(RegistryEvent::Evict {
                identity: old_identity,
                index: old_index,
            });
        }

        match &result {
            Ok(()) => tracing::debug!(registry = self.label, ?identity, ?index, overwrite, "entry installed"),
            Err(err) => tracing::debug!(registry = self.label, %err, overwrite, "entry rejected"),
        }
        self.emit_event(RegistryEvent::Insert {
            identity,
            index,
            overwrite,
            accepted: result.is_ok(),
        });

        result
    }

    /// Removes the entry filed under `value`'s keys.
    ///
    /// Returns `false` when no entry is filed under exactly those keys.
    ///
    /// # Panics
    ///
    /// If the entry is present under one key but not the other.
    pub fn delete(&self, value: &V) -> bool {
        let identity = value.identity();
        let index = value.index();
        let removed = validate(identity, index).is_ok()
            && self.state().remove(self.label, identity, index).is_some();

        tracing::debug!(registry = self.label, ?identity, ?index, removed, "delete");
        self.emit_event(RegistryEvent::Delete {
            key: LookupKey::Identity(identity),
            removed,
        });
        removed
    }

    /// Removes whatever is filed under `identity`.
    pub fn delete_by_identity(&self, identity: K) -> bool {
        let removed = identity.is_valid()
            && self
                .state()
                .remove_identity(self.label, identity)
                .is_some();

        tracing::debug!(registry = self.label, ?identity, removed, "delete");
        self.emit_event(RegistryEvent::Delete {
            key: LookupKey::Identity(identity),
            removed,
        });
        removed
    }

    /// Removes whatever is filed under `index`.
    pub fn delete_by_index(&self, index: I) -> bool {
        let removed = index.is_valid() && self.state().remove_index(self.label, index).is_some();

        tracing::debug!(registry = self.label, ?index, removed, "delete");
        self.emit_event(RegistryEvent::Delete {
            key: LookupKey::Index(index),
            removed,
        });
        removed
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let removed = {
            let mut maps = self.state();
            let removed = maps.by_identity.len();
            maps.by_identity.clear();
            maps.by_index.clear();
            removed
        };

        tracing::debug!(registry = self.label, removed, "cleared");
        self.emit_event(RegistryEvent::Clear { removed });
    }
}

impl<K, I, V> IntoIterator for &DualKeyRegistry<K, I, V>
where
    K: IdentityKey,
    I: IndexKey,
    V: ?Sized + Identifiable<K, I>,
{
    type Item = (K, Arc<V>);
    type IntoIter = hash_map::IntoIter<K, Arc<V>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: IdentityKey, I: IndexKey, V: ?Sized> fmt::Debug for DualKeyRegistry<K, I, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("DualKeyRegistry");
        out.field("label", &self.label);
        match self.state.lock() {
            Ok(maps) => out.field("len", &maps.by_identity.len()),
            Err(_) => out.field("len", &format_args!("<poisoned>")),
        };
        out.finish_non_exhaustive()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
