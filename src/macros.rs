//! Macros for creating named, process-global lookups.

/// Creates a process-global dual-key lookup with a single macro invocation.
///
/// The macro generates a module containing:
/// - Storage static (hidden), a [`DualKeyRegistry`](crate::DualKeyRegistry)
///   labelled with the module name
/// - An `Api` struct that implements [`LookupApi`](crate::LookupApi)
/// - Free functions delegating to the registry
///
/// The generated module glob-imports its parent, so the key and value types
/// must be declared at module level, not inside a function body.
///
/// # Examples
///
/// ```rust
/// use dual_key_registry::{define_lookup, Identifiable};
/// use std::sync::Arc;
///
/// pub struct Sprite {
///     id: u64,
///     slot: i32,
/// }
///
/// impl Identifiable<u64, i32> for Sprite {
///     fn identity(&self) -> u64 { self.id }
///     fn index(&self) -> i32 { self.slot }
/// }
///
/// define_lookup!(sprites, u64, i32, Sprite);
///
/// fn main() {
///     assert!(sprites::insert(Arc::new(Sprite { id: 3, slot: 0 })));
///     assert_eq!(sprites::get(3).unwrap().slot, 0);
///     assert_eq!(sprites::get_at(0).unwrap().id, 3);
///     assert_eq!(sprites::count(), 1);
/// }
/// ```
///
/// # Multiple Lookups
///
/// Every invocation owns its own storage:
///
/// ```rust
/// use dual_key_registry::{define_lookup, Identifiable};
/// use std::sync::Arc;
///
/// pub struct Tile(u64, i32);
///
/// impl Identifiable<u64, i32> for Tile {
///     fn identity(&self) -> u64 { self.0 }
///     fn index(&self) -> i32 { self.1 }
/// }
///
/// define_lookup!(ground, u64, i32, Tile);
/// define_lookup!(overlay, u64, i32, Tile);
///
/// fn main() {
///     assert!(ground::insert(Arc::new(Tile(1, 0))));
///     assert!(overlay::get(1).is_none());
/// }
/// ```
#[macro_export]
macro_rules! define_lookup {
    ($name:ident, $key:ty, $index:ty, $value:ty) => {
        #[allow(dead_code)]
        pub mod $name {
            #[allow(unused_imports)]
            use super::*;

            use std::collections::HashMap;
            use std::sync::{Arc, LazyLock};

            use $crate::{DualKeyRegistry, LookupApi, RegistryError, RegistryEvent};

            static LOOKUP: LazyLock<DualKeyRegistry<$key, $index, $value>> =
                LazyLock::new(|| DualKeyRegistry::with_label(stringify!($name)));

            /// Zero-sized handle implementing the lookup API.
            pub struct Api;

            impl LookupApi for Api {
                type Key = $key;
                type Index = $index;
                type Value = $value;

                fn lookup(&self) -> &DualKeyRegistry<$key, $index, $value> {
                    &LOOKUP
                }
            }

            /// Convenient constant for trait-based access.
            pub const API: Api = Api;

            /// The backing registry.
            pub fn lookup() -> &'static DualKeyRegistry<$key, $index, $value> {
                &LOOKUP
            }

            pub fn get(identity: $key) -> Option<Arc<$value>> {
                LOOKUP.get_by_identity(identity)
            }

            pub fn get_at(index: $index) -> Option<Arc<$value>> {
                LOOKUP.get_by_index(index)
            }

            /// Strict insert.
            pub fn insert(value: Arc<$value>) -> bool {
                LOOKUP.insert_arc(value)
            }

            pub fn set(identity: $key, value: Arc<$value>) -> Result<(), RegistryError> {
                LOOKUP.set_by_identity(identity, value)
            }

            pub fn set_at(index: $index, value: Arc<$value>) -> Result<(), RegistryError> {
                LOOKUP.set_by_index(index, value)
            }

            pub fn delete(identity: $key) -> bool {
                LOOKUP.delete_by_identity(identity)
            }

            pub fn delete_at(index: $index) -> bool {
                LOOKUP.delete_by_index(index)
            }

            pub fn count() -> usize {
                LOOKUP.count()
            }

            pub fn next_free_index() -> Result<$index, RegistryError> {
                LOOKUP.next_free_index()
            }

            pub fn snapshot() -> HashMap<$key, Arc<$value>> {
                LOOKUP.snapshot_by_identity()
            }

            pub fn clear() {
                LOOKUP.clear()
            }

            pub fn set_trace_callback(
                callback: impl Fn(&RegistryEvent<$key, $index>) + Send + Sync + 'static,
            ) {
                LOOKUP.set_trace_callback(callback)
            }

            pub fn clear_trace_callback() {
                LOOKUP.clear_trace_callback()
            }
        }
    };
}
