//! Key capabilities for the two keyspaces of a registry.
//!
//! Both key kinds carry their own notion of validity: an identity key has an
//! "empty" sentinel (the nil UUID, `0` for numeric ids) and an index key is
//! invalid when negative. Invalid keys are never stored and never found.

use std::fmt::Debug;
use std::hash::Hash;

use uuid::Uuid;

/// A stable, globally unique key addressing one entry.
pub trait IdentityKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Returns `false` for the sentinel value that means "no identity".
    fn is_valid(&self) -> bool;
}

/// Identity keys that can mint fresh values on demand.
pub trait GenerateIdentity: IdentityKey {
    fn generate() -> Self;
}

/// An ordinal key addressing one entry.
///
/// Index keys need not be contiguous. The registry only relies on their
/// ordering to compute the next free index.
pub trait IndexKey: Copy + Ord + Hash + Debug + Send + Sync + 'static {
    /// The index handed out when the registry is empty.
    const FIRST: Self;

    /// Returns `false` for negative values.
    fn is_valid(&self) -> bool;

    /// The index directly after `self`, or `None` on overflow.
    fn successor(self) -> Option<Self>;
}

impl IdentityKey for Uuid {
    fn is_valid(&self) -> bool {
        !self.is_nil()
    }
}

impl GenerateIdentity for Uuid {
    fn generate() -> Self {
        Uuid::new_v4()
    }
}

macro_rules! numeric_identity {
    ($($ty:ty),*) => {
        $(
            impl IdentityKey for $ty {
                fn is_valid(&self) -> bool {
                    *self != 0
                }
            }
        )*
    };
}

numeric_identity!(u16, u32, u64, u128);

macro_rules! index_key {
    (signed: $($ty:ty),*) => {
        $(
            impl IndexKey for $ty {
                const FIRST: Self = 0;

                fn is_valid(&self) -> bool {
                    *self >= 0
                }

                fn successor(self) -> Option<Self> {
                    self.checked_add(1)
                }
            }
        )*
    };
    (unsigned: $($ty:ty),*) => {
        $(
            impl IndexKey for $ty {
                const FIRST: Self = 0;

                fn is_valid(&self) -> bool {
                    true
                }

                fn successor(self) -> Option<Self> {
                    self.checked_add(1)
                }
            }
        )*
    };
}

index_key!(signed: i8, i16, i32, i64, isize);
index_key!(unsigned: u8, u16, u32, u64, usize);

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
