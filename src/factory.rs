//! Building entities of a runtime-selected kind straight into a registry.
//!
//! Each entity kind registers its constructors ahead of time, one per shape:
//! from an identity, from an index, or from both. An [`EntityKind`] is the
//! runtime descriptor used to pick the constructors, so callers holding only
//! a kind value (loaded from data, picked from a list) can still create
//! entries.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::entity::Identifiable;
use crate::keys::{GenerateIdentity, IdentityKey, IndexKey};
use crate::{DualKeyRegistry, RegistryError};

/// Runtime descriptor of a concrete entity type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKind {
    id: TypeId,
    name: &'static str,
}

impl EntityKind {
    /// Descriptor of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Type name of the described kind, as given by [`std::any::type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityKind({})", self.name)
    }
}

/// One constructor shape.
pub enum Constructor<K, I, V: ?Sized> {
    Identity(fn(K) -> Arc<V>),
    Index(fn(I) -> Arc<V>),
    IdentityAndIndex(fn(K, I) -> Arc<V>),
}

impl<K, I, V: ?Sized> Clone for Constructor<K, I, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, I, V: ?Sized> Copy for Constructor<K, I, V> {}

struct Constructors<K, I, V: ?Sized> {
    identity: Option<fn(K) -> Arc<V>>,
    index: Option<fn(I) -> Arc<V>>,
    both: Option<fn(K, I) -> Arc<V>>,
}

impl<K, I, V: ?Sized> Default for Constructors<K, I, V> {
    fn default() -> Self {
        Self {
            identity: None,
            index: None,
            both: None,
        }
    }
}

/// Constructor table keyed by entity kind.
pub struct EntityFactory<K, I, V: ?Sized> {
    kinds: HashMap<EntityKind, Constructors<K, I, V>>,
}

impl<K, I, V: ?Sized> Default for EntityFactory<K, I, V> {
    fn default() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }
}

impl<K, I, V> EntityFactory<K, I, V>
where
    K: IdentityKey,
    I: IndexKey,
    V: ?Sized + Identifiable<K, I>,
{
    /// An empty factory with no kinds registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for `kind`, replacing any earlier one of the same shape.
    pub fn register(&mut self, kind: EntityKind, constructor: Constructor<K, I, V>) -> &mut Self {
        let entry = self.kinds.entry(kind).or_default();
        match constructor {
            Constructor::Identity(make) => entry.identity = Some(make),
            Constructor::Index(make) => entry.index = Some(make),
            Constructor::IdentityAndIndex(make) => entry.both = Some(make),
        }
        tracing::debug!(kind = kind.name, "constructor registered");
        self
    }

    /// Every kind with at least one registered constructor.
    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.kinds.keys().copied()
    }

    /// Whether `kind` has any registered constructor.
    pub fn contains(&self, kind: EntityKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    fn constructors(&self, kind: EntityKind) -> Result<&Constructors<K, I, V>, RegistryError> {
        self.kinds
            .get(&kind)
            .ok_or(RegistryError::UnknownKind { kind: kind.name })
    }

    /// Creates a `kind` entry for `identity` and strictly inserts it.
    ///
    /// Kinds with an identity-and-index constructor get the next free index,
    /// allocated and inserted in one step. Otherwise the identity constructor
    /// decides the index.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnknownKind`], [`RegistryError::MissingConstructor`]
    /// - [`RegistryError::KeyMismatch`] if the built value reports another identity
    /// - any error of [`DualKeyRegistry::try_insert_arc`]
    pub fn add_new(
        &self,
        registry: &DualKeyRegistry<K, I, V>,
        kind: EntityKind,
        identity: K,
    ) -> Result<Arc<V>, RegistryError> {
        let constructors = self.constructors(kind)?;
        if !identity.is_valid() {
            return Err(RegistryError::invalid_identity(identity));
        }

        if let Some(make) = constructors.both {
            return registry.try_insert_with_next_index(|index| {
                let value = make(identity, index);
                check_identity::<K, I, V>(&*value, identity)?;
                Ok(value)
            });
        }

        let make = constructors.identity.ok_or(RegistryError::MissingConstructor {
            kind: kind.name,
            shape: "identity",
        })?;
        let value = make(identity);
        check_identity::<K, I, V>(&*value, identity)?;
        registry.try_insert_arc(Arc::clone(&value))?;
        Ok(value)
    }

    /// Creates a `kind` entry at `index` and strictly inserts it.
    ///
    /// Kinds with an identity-and-index constructor get a freshly generated
    /// identity. Otherwise the index constructor decides the identity.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_new`], with the index checked instead of the identity.
    pub fn add_new_at(
        &self,
        registry: &DualKeyRegistry<K, I, V>,
        kind: EntityKind,
        index: I,
    ) -> Result<Arc<V>, RegistryError>
    where
        K: GenerateIdentity,
    {
        let constructors = self.constructors(kind)?;
        if constructors.both.is_some() {
            return self.add_new_with(registry, kind, K::generate(), index);
        }

        if !index.is_valid() {
            return Err(RegistryError::invalid_index(index));
        }
        let make = constructors.index.ok_or(RegistryError::MissingConstructor {
            kind: kind.name,
            shape: "index",
        })?;
        let value = make(index);
        check_index::<K, I, V>(&*value, index)?;
        registry.try_insert_arc(Arc::clone(&value))?;
        Ok(value)
    }

    /// Creates a `kind` entry under both keys and strictly inserts it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::add_new`]; requires an identity-and-index constructor.
    pub fn add_new_with(
        &self,
        registry: &DualKeyRegistry<K, I, V>,
        kind: EntityKind,
        identity: K,
        index: I,
    ) -> Result<Arc<V>, RegistryError> {
        let make = self
            .constructors(kind)?
            .both
            .ok_or(RegistryError::MissingConstructor {
                kind: kind.name,
                shape: "identity, index",
            })?;
        if !identity.is_valid() {
            return Err(RegistryError::invalid_identity(identity));
        }
        if !index.is_valid() {
            return Err(RegistryError::invalid_index(index));
        }

        let value = make(identity, index);
        check_identity::<K, I, V>(&*value, identity)?;
        check_index::<K, I, V>(&*value, index)?;
        registry.try_insert_arc(Arc::clone(&value))?;
        Ok(value)
    }
}

fn check_identity<K, I, V>(value: &V, identity: K) -> Result<(), RegistryError>
where
    K: IdentityKey,
    V: ?Sized + Identifiable<K, I>,
{
    let own = value.identity();
    if own != identity {
        return Err(RegistryError::key_mismatch(identity, own));
    }
    Ok(())
}

fn check_index<K, I, V>(value: &V, index: I) -> Result<(), RegistryError>
where
    I: IndexKey,
    V: ?Sized + Identifiable<K, I>,
{
    let own = value.index();
    if own != index {
        return Err(RegistryError::key_mismatch(index, own));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    trait Npc: Identifiable<Uuid, i32> + Send + Sync {
        fn role(&self) -> &'static str;
    }

    struct Guard {
        id: Uuid,
        slot: i32,
    }

    struct Merchant {
        id: Uuid,
        slot: i32,
    }

    macro_rules! npc {
        ($ty:ident, $role:literal) => {
            impl Identifiable<Uuid, i32> for $ty {
                fn identity(&self) -> Uuid {
                    self.id
                }

                fn index(&self) -> i32 {
                    self.slot
                }
            }

            impl Npc for $ty {
                fn role(&self) -> &'static str {
                    $role
                }
            }
        };
    }

    npc!(Guard, "guard");
    npc!(Merchant, "merchant");

    fn guard(id: Uuid, slot: i32) -> Arc<dyn Npc> {
        Arc::new(Guard { id, slot })
    }

    fn merchant_by_identity(id: Uuid) -> Arc<dyn Npc> {
        Arc::new(Merchant { id, slot: 40 })
    }

    fn merchant_by_index(slot: i32) -> Arc<dyn Npc> {
        Arc::new(Merchant {
            id: Uuid::from_u128(slot as u128 + 1),
            slot,
        })
    }

    fn stray_by_identity(_: Uuid) -> Arc<dyn Npc> {
        Arc::new(Guard {
            id: Uuid::from_u128(99),
            slot: 0,
        })
    }

    fn stray_by_index(_: i32) -> Arc<dyn Npc> {
        Arc::new(Guard {
            id: Uuid::from_u128(7),
            slot: 42,
        })
    }

    fn stray_by_both(id: Uuid, _: i32) -> Arc<dyn Npc> {
        Arc::new(Guard { id, slot: 42 })
    }

    fn stray_factory(
        constructor: Constructor<Uuid, i32, dyn Npc>,
    ) -> EntityFactory<Uuid, i32, dyn Npc> {
        let mut factory = EntityFactory::new();
        factory.register(EntityKind::of::<Guard>(), constructor);
        factory
    }

    fn factory() -> EntityFactory<Uuid, i32, dyn Npc> {
        let mut factory = EntityFactory::new();
        factory
            .register(EntityKind::of::<Guard>(), Constructor::IdentityAndIndex(guard))
            .register(EntityKind::of::<Merchant>(), Constructor::Identity(merchant_by_identity))
            .register(EntityKind::of::<Merchant>(), Constructor::Index(merchant_by_index));
        factory
    }

    #[test]
    fn test_add_new_allocates_next_index() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::with_label("npcs");
        let factory = factory();

        let first = factory
            .add_new(&npcs, EntityKind::of::<Guard>(), Uuid::new_v4())
            .unwrap();
        let second = factory
            .add_new(&npcs, EntityKind::of::<Guard>(), Uuid::new_v4())
            .unwrap();

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(npcs.count(), 2);
    }

    #[test]
    fn test_add_new_uses_identity_constructor() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();
        let id = Uuid::new_v4();

        let merchant = factory()
            .add_new(&npcs, EntityKind::of::<Merchant>(), id)
            .unwrap();

        assert_eq!(merchant.role(), "merchant");
        assert_eq!(npcs.get_by_index(40).unwrap().identity(), id);
    }

    #[test]
    fn test_add_new_at_generates_identity() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();

        let guard = factory()
            .add_new_at(&npcs, EntityKind::of::<Guard>(), 12)
            .unwrap();

        assert!(!guard.identity().is_nil());
        assert_eq!(npcs.get_by_index(12).unwrap().role(), "guard");
    }

    #[test]
    fn test_add_new_at_uses_index_constructor() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();

        let merchant = factory()
            .add_new_at(&npcs, EntityKind::of::<Merchant>(), 3)
            .unwrap();

        assert_eq!(merchant.identity(), Uuid::from_u128(4));
        assert!(npcs.contains_identity(Uuid::from_u128(4)));
    }

    #[test]
    fn test_add_new_with_requires_both_shape() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();
        let result = factory().add_new_with(&npcs, EntityKind::of::<Merchant>(), Uuid::new_v4(), 0);

        assert!(matches!(
            result,
            Err(RegistryError::MissingConstructor {
                shape: "identity, index",
                ..
            })
        ));
        assert!(npcs.is_empty());
    }

    #[test]
    fn test_unknown_kind() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();
        let result = factory().add_new(&npcs, EntityKind::of::<String>(), Uuid::new_v4());

        assert_eq!(
            result.err(),
            Some(RegistryError::UnknownKind {
                kind: "alloc::string::String"
            })
        );
    }

    #[test]
    fn test_add_new_with_occupied_keys_fails() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();
        let factory = factory();
        let id = Uuid::new_v4();

        factory
            .add_new_with(&npcs, EntityKind::of::<Guard>(), id, 0)
            .unwrap();
        let again = factory.add_new_with(&npcs, EntityKind::of::<Guard>(), Uuid::new_v4(), 0);

        assert!(matches!(again, Err(RegistryError::IndexOccupied { .. })));
        assert_eq!(npcs.count(), 1);
    }

    #[test]
    fn test_invalid_keys_rejected_before_construction() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();
        let factory = factory();

        assert!(matches!(
            factory.add_new(&npcs, EntityKind::of::<Guard>(), Uuid::nil()),
            Err(RegistryError::InvalidIdentity { .. })
        ));
        assert!(matches!(
            factory.add_new_at(&npcs, EntityKind::of::<Merchant>(), -2),
            Err(RegistryError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn test_kinds_listing() {
        let factory = factory();
        assert_eq!(factory.kinds().count(), 2);
        assert!(factory.contains(EntityKind::of::<Guard>()));
        assert!(!factory.contains(EntityKind::of::<u8>()));
        assert!(format!("{:?}", EntityKind::of::<u8>()).contains("u8"));
    }

    #[test]
    fn test_identity_constructor_with_other_identity_is_refused() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();
        let requested = Uuid::from_u128(5);

        let result = stray_factory(Constructor::Identity(stray_by_identity)).add_new(
            &npcs,
            EntityKind::of::<Guard>(),
            requested,
        );

        assert_eq!(
            result.err(),
            Some(RegistryError::KeyMismatch {
                expected: format!("{requested:?}"),
                found: format!("{:?}", Uuid::from_u128(99)),
            })
        );
        assert!(npcs.is_empty());
    }

    #[test]
    fn test_index_constructor_with_other_index_is_refused() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();

        let result = stray_factory(Constructor::Index(stray_by_index)).add_new_at(
            &npcs,
            EntityKind::of::<Guard>(),
            1,
        );

        assert_eq!(
            result.err(),
            Some(RegistryError::KeyMismatch {
                expected: "1".to_string(),
                found: "42".to_string(),
            })
        );
        assert!(npcs.is_empty());
    }

    #[test]
    fn test_both_constructor_with_other_index_is_refused() {
        let npcs = DualKeyRegistry::<Uuid, i32, dyn Npc>::new();
        let factory = stray_factory(Constructor::IdentityAndIndex(stray_by_both));

        let explicit =
            factory.add_new_with(&npcs, EntityKind::of::<Guard>(), Uuid::from_u128(5), 1);
        assert_eq!(
            explicit.err(),
            Some(RegistryError::KeyMismatch {
                expected: "1".to_string(),
                found: "42".to_string(),
            })
        );

        let allocated = factory.add_new(&npcs, EntityKind::of::<Guard>(), Uuid::from_u128(5));
        assert!(matches!(allocated, Err(RegistryError::KeyMismatch { .. })));
        assert!(npcs.is_empty());
    }
}
