use thiserror::Error;

/// Recoverable failures reported by registry operations.
///
/// Keys are rendered with their `Debug` form so the error stays independent of
/// the registry's key types. Absence is never an error: lookups return `None`.
/// Internal corruption is never an error either; it panics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid identity key: {key}")]
    InvalidIdentity { key: String },

    #[error("invalid index key: {index}")]
    InvalidIndex { index: String },

    /// The key passed to a keyed `set` differs from the value's own key.
    #[error("provided key {expected} does not match the value's key {found}")]
    KeyMismatch { expected: String, found: String },

    #[error("identity key {key} is already occupied")]
    IdentityOccupied { key: String },

    #[error("index key {index} is already occupied")]
    IndexOccupied { index: String },

    #[error("stored value is not a {type_name}")]
    TypeMismatch { type_name: &'static str },

    #[error("no index left after {last}")]
    IndexExhausted { last: String },

    #[error("entity kind {kind} has no registered constructors")]
    UnknownKind { kind: &'static str },

    #[error("entity kind {kind} has no ({shape}) constructor")]
    MissingConstructor {
        kind: &'static str,
        shape: &'static str,
    },
}

impl RegistryError {
    pub(crate) fn invalid_identity(key: impl std::fmt::Debug) -> Self {
        RegistryError::InvalidIdentity {
            key: format!("{key:?}"),
        }
    }

    pub(crate) fn invalid_index(index: impl std::fmt::Debug) -> Self {
        RegistryError::InvalidIndex {
            index: format!("{index:?}"),
        }
    }

    pub(crate) fn key_mismatch(expected: impl std::fmt::Debug, found: impl std::fmt::Debug) -> Self {
        RegistryError::KeyMismatch {
            expected: format!("{expected:?}"),
            found: format!("{found:?}"),
        }
    }
}
