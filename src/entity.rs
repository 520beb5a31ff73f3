//! Capabilities a stored value exposes to the registry.

use std::any::Any;
use std::sync::Arc;

/// A value addressable by an identity key and an index key.
///
/// Both keys must stay fixed while the value is stored: the registry captures
/// them on insert and files the value under those keys until it is removed.
pub trait Identifiable<K, I> {
    fn identity(&self) -> K;
    fn index(&self) -> I;
}

/// A value with a human-readable display name.
pub trait Named {
    fn name(&self) -> &str;
}

/// Type-erased access used to narrow a stored value to its concrete type.
///
/// Implemented for every sized `Send + Sync + 'static` type. Make it a
/// supertrait of an entity trait to narrow `Arc<dyn Entity>` values:
///
/// ```rust
/// use dual_key_registry::{AnyEntity, Identifiable};
/// use std::sync::Arc;
///
/// trait Entity: Identifiable<u64, i32> + AnyEntity {}
///
/// struct Door { id: u64 }
///
/// impl Identifiable<u64, i32> for Door {
///     fn identity(&self) -> u64 { self.id }
///     fn index(&self) -> i32 { 0 }
/// }
///
/// impl Entity for Door {}
///
/// let erased: Arc<dyn Entity> = Arc::new(Door { id: 1 });
/// let door = AnyEntity::into_any(erased).downcast::<Door>().unwrap();
/// assert_eq!(door.id, 1);
/// ```
pub trait AnyEntity: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AnyEntity for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}
