// array.rs - Dense storage addressed directly by identifier

use super::{Identifier, IdentifierKind, IdentifierMask};
use bytemuck::Zeroable;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Fixed-size array with one `T` per slot of identifier domain `K`.
///
/// Capacity is always `K::MAXIMUM_COUNT`; the array never grows, so
/// references into it stay valid for its whole lifetime. The array does not
/// track which slots are live. Pair it with an [`IdentifierMask`] or a
/// [`SaltedIdentifierStorage`](super::SaltedIdentifierStorage) for that.
pub struct IdentifierArray<T, K: IdentifierKind> {
    slots: Box<[T]>,
    _kind: PhantomData<fn() -> K>,
}

impl<T, K: IdentifierKind> IdentifierArray<T, K> {
    /// Value-initialize every slot.
    pub fn new() -> Self
    where
        T: Default,
    {
        Self::from_fn(|_| T::default())
    }

    /// Allocate every slot as all-zero bytes.
    ///
    /// For `Option<Box<_>>` payloads this is "nothing loaded".
    pub fn zeroed() -> Self
    where
        T: Zeroable,
    {
        Self {
            slots: bytemuck::zeroed_slice_box(K::MAXIMUM_COUNT),
            _kind: PhantomData,
        }
    }

    /// Initialize each slot from its zero-based index.
    pub fn from_fn(mut f: impl FnMut(usize) -> T) -> Self {
        Self {
            slots: (0..K::MAXIMUM_COUNT).map(&mut f).collect(),
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        K::MAXIMUM_COUNT
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        K::MAXIMUM_COUNT == 0
    }

    /// Checked lookup; `None` for invalid or out-of-range identifiers.
    #[inline]
    pub fn get(&self, identifier: Identifier<K>) -> Option<&T> {
        if identifier.is_in_range() {
            self.slots.get(identifier.first_valid_index())
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, identifier: Identifier<K>) -> Option<&mut T> {
        if identifier.is_in_range() {
            self.slots.get_mut(identifier.first_valid_index())
        } else {
            None
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.slots
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.slots
    }

    /// Iterate every slot with its identifier.
    pub fn iter(&self) -> impl Iterator<Item = (Identifier<K>, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(index, slot)| (Identifier::make_from_valid_index(index), slot))
    }

    /// Iterate the slots whose bit is set in `mask`.
    pub fn iter_mask<'a>(
        &'a self,
        mask: &'a IdentifierMask<K>,
    ) -> impl Iterator<Item = (Identifier<K>, &'a T)> + 'a {
        mask.iter()
            .map(|index| (Identifier::make_from_valid_index(index), &self.slots[index]))
    }
}

impl<T: Default, K: IdentifierKind> Default for IdentifierArray<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, K: IdentifierKind> Clone for IdentifierArray<T, K> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            _kind: PhantomData,
        }
    }
}

impl<T: fmt::Debug, K: IdentifierKind> fmt::Debug for IdentifierArray<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifierArray")
            .field("len", &self.slots.len())
            .finish_non_exhaustive()
    }
}

impl<T, K: IdentifierKind> Index<Identifier<K>> for IdentifierArray<T, K> {
    type Output = T;

    #[inline]
    fn index(&self, identifier: Identifier<K>) -> &T {
        debug_assert!(identifier.is_in_range(), "array index with {identifier:?}");
        &self.slots[identifier.first_valid_index()]
    }
}

impl<T, K: IdentifierKind> IndexMut<Identifier<K>> for IdentifierArray<T, K> {
    #[inline]
    fn index_mut(&mut self, identifier: Identifier<K>) -> &mut T {
        debug_assert!(identifier.is_in_range(), "array index with {identifier:?}");
        &mut self.slots[identifier.first_valid_index()]
    }
}
