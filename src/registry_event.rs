use std::fmt;

/// Either of the two keys an entry can be addressed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKey<K, I> {
    Identity(K),
    Index(I),
}

impl<K: fmt::Debug, I: fmt::Debug> fmt::Display for LookupKey<K, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupKey::Identity(key) => write!(f, "identity {key:?}"),
            LookupKey::Index(index) => write!(f, "index {index:?}"),
        }
    }
}

/// Events emitted by a registry during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use dual_key_registry::RegistryEvent;
///
/// let event: RegistryEvent<u64, i32> = RegistryEvent::Clear { removed: 3 };
/// assert_eq!(event.to_string(), "clear { removed: 3 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent<K, I> {
    /// An insert or overwrite-set was attempted.
    Insert {
        identity: K,
        index: I,
        /// Whether the overwrite protocol was requested.
        overwrite: bool,
        /// Whether the value was installed.
        accepted: bool,
    },

    /// An entry previously stored under these keys was superseded by an overwrite.
    Evict { identity: K, index: I },

    /// A value was requested.
    Get { key: LookupKey<K, I>, found: bool },

    /// A removal was attempted.
    Delete { key: LookupKey<K, I>, removed: bool },

    /// The registry was cleared.
    Clear {
        /// Number of entries dropped.
        removed: usize,
    },
}

impl<K: fmt::Debug, I: fmt::Debug> fmt::Display for RegistryEvent<K, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEvent::Insert {
                identity,
                index,
                overwrite,
                accepted,
            } => write!(
                f,
                "insert {{ identity: {identity:?}, index: {index:?}, overwrite: {overwrite}, accepted: {accepted} }}"
            ),
            RegistryEvent::Evict { identity, index } => {
                write!(f, "evict {{ identity: {identity:?}, index: {index:?} }}")
            }
            RegistryEvent::Get { key, found } => {
                write!(f, "get {{ key: {key}, found: {found} }}")
            }
            RegistryEvent::Delete { key, removed } => {
                write!(f, "delete {{ key: {key}, removed: {removed} }}")
            }
            RegistryEvent::Clear { removed } => write!(f, "clear {{ removed: {removed} }}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_event_display() {
        let event: RegistryEvent<u64, i32> = RegistryEvent::Insert {
            identity: 7,
            index: 2,
            overwrite: false,
            accepted: true,
        };
        assert_eq!(
            event.to_string(),
            "insert { identity: 7, index: 2, overwrite: false, accepted: true }"
        );

        let event: RegistryEvent<u64, i32> = RegistryEvent::Get {
            key: LookupKey::Index(4),
            found: false,
        };
        assert_eq!(event.to_string(), "get { key: index 4, found: false }");

        let event: RegistryEvent<u64, i32> = RegistryEvent::Delete {
            key: LookupKey::Identity(9),
            removed: true,
        };
        assert_eq!(event.to_string(), "delete { key: identity 9, removed: true }");

        let event: RegistryEvent<u64, i32> = RegistryEvent::Evict {
            identity: 1,
            index: 0,
        };
        assert_eq!(event.to_string(), "evict { identity: 1, index: 0 }");
    }

    #[test]
    fn test_registry_event_clone() {
        let event: RegistryEvent<u64, i32> = RegistryEvent::Clear { removed: 0 };
        let cloned = event.clone();
        assert_eq!(event, cloned);
    }
}
