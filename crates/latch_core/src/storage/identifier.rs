//! Bit-width constrained identifiers
//!
//! An identifier is a compact handle to a slot in a fixed-capacity,
//! identifier-indexed container. Each identifier domain is declared with
//! [`define_identifier!`](crate::define_identifier), which picks the storage
//! integer and the index width at compile time.
//!
//! Layout: `[reuse count | index]`
//! - Index: the low `INDEX_BITS` bits, 1-based. An index field of `0` is the
//!   invalid sentinel, so [`Identifier::INVALID`] is the all-zero value.
//! - Reuse count: the remaining high bits, bumped every time a slot is handed
//!   out again (see [`SaltedIdentifierStorage`](super::SaltedIdentifierStorage)).
//!
//! Example:
//! ```ignore
//! define_identifier!(pub ClientKind => ClientIdentifier, u16, 6);
//!
//! let client = ClientIdentifier::make_from_valid_index(3);
//! assert_eq!(client.first_valid_index(), 3);
//! assert_eq!(client.index(), 4);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Unsigned integer types usable as identifier storage.
pub trait IdentifierStorage:
    Copy + Eq + Ord + Hash + Default + fmt::Debug + Send + Sync + 'static
{
    /// Width of the integer in bits.
    const BITS: u32;

    const ZERO: Self;

    fn to_u64(self) -> u64;

    /// Truncating conversion.
    fn from_u64(value: u64) -> Self;
}

macro_rules! impl_identifier_storage {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl IdentifierStorage for $ty {
                const BITS: u32 = <$ty>::BITS;
                const ZERO: Self = 0;

                #[inline]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_u64(value: u64) -> Self {
                    value as $ty
                }
            }
        )+
    };
}

impl_identifier_storage!(u8, u16, u32, u64);

/// Describes one identifier domain.
///
/// Implemented by zero-sized marker types, normally through
/// [`define_identifier!`](crate::define_identifier).
pub trait IdentifierKind: 'static {
    type Storage: IdentifierStorage;

    /// Number of low bits holding the 1-based index.
    const INDEX_BITS: u32;

    /// Number of addressable slots. Index `0` is reserved for the invalid
    /// sentinel, so a full index field addresses `2^INDEX_BITS - 1` slots.
    const MAXIMUM_COUNT: usize = (1usize << Self::INDEX_BITS) - 1;
}

/// Handle to a slot in a `K`-indexed container.
pub struct Identifier<K: IdentifierKind> {
    value: K::Storage,
    _kind: PhantomData<fn() -> K>,
}

impl<K: IdentifierKind> Identifier<K> {
    /// Number of addressable slots in this domain.
    pub const MAXIMUM_COUNT: usize = K::MAXIMUM_COUNT;

    /// Bits left over for the reuse count.
    pub const REUSE_BITS: u32 = K::Storage::BITS - K::INDEX_BITS;

    /// Largest representable reuse count; counts wrap past it.
    pub const MAXIMUM_REUSE_COUNT: u64 = if Self::REUSE_BITS == 0 {
        0
    } else {
        u64::MAX >> (64 - Self::REUSE_BITS)
    };

    const INDEX_MASK: u64 = u64::MAX >> (64 - K::INDEX_BITS);

    /// The invalid sentinel.
    pub const INVALID: Self = Self {
        value: <K::Storage as IdentifierStorage>::ZERO,
        _kind: PhantomData,
    };

    /// Build the identifier for the zero-based slot `index`.
    #[inline]
    pub fn make_from_valid_index(index: usize) -> Self {
        Self::make_from_index_and_reuse_count(index, 0)
    }

    /// Build a salted identifier. `reuse_count` wraps within the reuse bits.
    #[inline]
    pub fn make_from_index_and_reuse_count(index: usize, reuse_count: u64) -> Self {
        debug_assert!(
            index < K::MAXIMUM_COUNT,
            "identifier index {index} out of range (maximum count {})",
            K::MAXIMUM_COUNT
        );
        let reuse = if Self::REUSE_BITS == 0 {
            0
        } else {
            (reuse_count & Self::MAXIMUM_REUSE_COUNT) << K::INDEX_BITS
        };
        Self::from_raw(K::Storage::from_u64(reuse | (index as u64 + 1)))
    }

    #[inline]
    pub fn from_raw(value: K::Storage) -> Self {
        Self {
            value,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn raw(self) -> K::Storage {
        self.value
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.index() != 0
    }

    /// 1-based index, `0` when invalid.
    #[inline]
    pub fn index(self) -> usize {
        (self.value.to_u64() & Self::INDEX_MASK) as usize
    }

    /// Zero-based slot index.
    #[inline]
    pub fn first_valid_index(self) -> usize {
        debug_assert!(self.is_valid(), "invalid identifier has no slot index");
        self.index().wrapping_sub(1)
    }

    #[inline]
    pub fn reuse_count(self) -> u64 {
        if Self::REUSE_BITS == 0 {
            0
        } else {
            self.value.to_u64() >> K::INDEX_BITS
        }
    }

    /// True if this identifier addresses a slot inside `[0, MAXIMUM_COUNT)`.
    #[inline]
    pub fn is_in_range(self) -> bool {
        self.is_valid() && self.index() <= K::MAXIMUM_COUNT
    }
}

impl<K: IdentifierKind> Clone for Identifier<K> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: IdentifierKind> Copy for Identifier<K> {}

impl<K: IdentifierKind> Default for Identifier<K> {
    fn default() -> Self {
        Self::INVALID
    }
}

impl<K: IdentifierKind> PartialEq for Identifier<K> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<K: IdentifierKind> Eq for Identifier<K> {}

impl<K: IdentifierKind> PartialOrd for Identifier<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: IdentifierKind> Ord for Identifier<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<K: IdentifierKind> Hash for Identifier<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<K: IdentifierKind> fmt::Debug for Identifier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<K: IdentifierKind> fmt::Display for Identifier<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}#{}", self.first_valid_index(), self.reuse_count())
        } else {
            f.write_str("invalid")
        }
    }
}

impl<K: IdentifierKind> Serialize for Identifier<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.value.to_u64())
    }
}

impl<'de, K: IdentifierKind> Deserialize<'de> for Identifier<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        let storage = K::Storage::from_u64(raw);
        if storage.to_u64() != raw {
            return Err(serde::de::Error::custom(format!(
                "identifier value {raw} does not fit in {} bits",
                K::Storage::BITS
            )));
        }
        Ok(Self::from_raw(storage))
    }
}

/// Declare an identifier domain.
///
/// ```ignore
/// // u16 storage, 10 index bits (1023 slots), 6 reuse bits
/// define_identifier!(pub ComponentTypeKind => ComponentTypeIdentifier, u16, 10);
///
/// // Explicit maximum count below the index field capacity
/// define_identifier!(pub ClientKind => ClientIdentifier, u8, 6, 48);
/// ```
///
/// Compilation fails if the storage type is narrower than the index field
/// or the maximum count does not fit the index field next to the sentinel.
#[macro_export]
macro_rules! define_identifier {
    (@define $vis:vis $kind:ident => $alias:ident, $storage:ty, $bits:expr, $maximum:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $kind {}

        impl $crate::storage::IdentifierKind for $kind {
            type Storage = $storage;
            const INDEX_BITS: u32 = $bits;
            const MAXIMUM_COUNT: usize = $maximum;
        }

        const _: () = {
            assert!($bits >= 1 && $bits <= 32, "index bits must be in 1..=32");
            assert!(
                $bits <= <$storage as $crate::storage::IdentifierStorage>::BITS,
                "storage type is narrower than the index field"
            );
            assert!(
                $maximum >= 1 && $maximum <= (1usize << ($bits)) - 1,
                "maximum count must leave room for the invalid sentinel"
            );
        };

        $vis type $alias = $crate::storage::Identifier<$kind>;
    };
    ($vis:vis $kind:ident => $alias:ident, $storage:ty, $bits:expr) => {
        $crate::define_identifier!(@define $vis $kind => $alias, $storage, $bits, (1usize << ($bits)) - 1);
    };
    ($vis:vis $kind:ident => $alias:ident, $storage:ty, $bits:expr, $maximum:expr) => {
        $crate::define_identifier!(@define $vis $kind => $alias, $storage, $bits, $maximum);
    };
}
