// mask.rs - Presence bitset sized to an identifier domain

use super::bits::{self, SetBitsIterator};
use super::{Identifier, IdentifierKind};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{BitAndAssign, BitOrAssign};

/// One bit per slot of identifier domain `K`.
///
/// Bit `i` set means the slot with zero-based index `i` is occupied. Not
/// internally synchronized; see [`AtomicIdentifierMask`](super::AtomicIdentifierMask)
/// for concurrent use.
pub struct IdentifierMask<K: IdentifierKind> {
    words: Box<[u64]>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: IdentifierKind> IdentifierMask<K> {
    /// Create a mask with every bit cleared.
    pub fn new() -> Self {
        Self {
            words: vec![0u64; bits::word_count(K::MAXIMUM_COUNT)].into_boxed_slice(),
            _kind: PhantomData,
        }
    }

    pub(crate) fn from_words(words: Box<[u64]>) -> Self {
        debug_assert_eq!(words.len(), bits::word_count(K::MAXIMUM_COUNT));
        Self {
            words,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        K::MAXIMUM_COUNT
    }

    /// Mark `identifier` as present. Returns true if the bit was previously clear.
    #[inline]
    pub fn set(&mut self, identifier: Identifier<K>) -> bool {
        debug_assert!(identifier.is_in_range(), "mask set with {identifier:?}");
        self.set_index(identifier.first_valid_index())
    }

    /// Mark `identifier` as absent. Returns true if the bit was previously set.
    #[inline]
    pub fn clear(&mut self, identifier: Identifier<K>) -> bool {
        debug_assert!(identifier.is_in_range(), "mask clear with {identifier:?}");
        self.clear_index(identifier.first_valid_index())
    }

    #[inline]
    pub fn is_set(&self, identifier: Identifier<K>) -> bool {
        debug_assert!(identifier.is_in_range(), "mask test with {identifier:?}");
        self.is_index_set(identifier.first_valid_index())
    }

    #[inline]
    pub fn set_index(&mut self, index: usize) -> bool {
        debug_assert!(index < K::MAXIMUM_COUNT);
        let word = &mut self.words[bits::word_of(index)];
        let bit = bits::bit_of(index);
        let was_clear = *word & bit == 0;
        *word |= bit;
        was_clear
    }

    #[inline]
    pub fn clear_index(&mut self, index: usize) -> bool {
        debug_assert!(index < K::MAXIMUM_COUNT);
        let word = &mut self.words[bits::word_of(index)];
        let bit = bits::bit_of(index);
        let was_set = *word & bit != 0;
        *word &= !bit;
        was_set
    }

    #[inline]
    pub fn is_index_set(&self, index: usize) -> bool {
        debug_assert!(index < K::MAXIMUM_COUNT);
        self.words[bits::word_of(index)] & bits::bit_of(index) != 0
    }

    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Set every bit inside the domain's capacity.
    pub fn set_all(&mut self) {
        let end = K::MAXIMUM_COUNT;
        for (word_index, word) in self.words.iter_mut().enumerate() {
            *word = bits::range_mask(word_index, 0, end);
        }
    }

    /// Clear every bit that is set in `other`.
    pub fn clear_mask(&mut self, other: &Self) {
        for (word, other) in self.words.iter_mut().zip(other.words.iter()) {
            *word &= !*other;
        }
    }

    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn are_any_set(&self) -> bool {
        self.words.iter().any(|&word| word != 0)
    }

    pub fn is_empty(&self) -> bool {
        !self.are_any_set()
    }

    /// Iterate all set indices in ascending order.
    pub fn iter(&self) -> SetBitsIterator<'_, [u64]> {
        self.set_bits(0, K::MAXIMUM_COUNT)
    }

    /// Iterate the set indices inside `[start, end)` in ascending order.
    pub fn set_bits(&self, start: usize, end: usize) -> SetBitsIterator<'_, [u64]> {
        SetBitsIterator::new(&self.words[..], start, end.min(K::MAXIMUM_COUNT))
    }

    /// Iterate set bits as identifiers.
    pub fn identifiers(&self) -> impl Iterator<Item = Identifier<K>> + '_ {
        self.iter().map(Identifier::make_from_valid_index)
    }
}

impl<K: IdentifierKind> Default for IdentifierMask<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IdentifierKind> Clone for IdentifierMask<K> {
    fn clone(&self) -> Self {
        Self::from_words(self.words.clone())
    }
}

impl<K: IdentifierKind> PartialEq for IdentifierMask<K> {
    fn eq(&self, other: &Self) -> bool {
        self.words == other.words
    }
}

impl<K: IdentifierKind> Eq for IdentifierMask<K> {}

impl<K: IdentifierKind> BitOrAssign<&IdentifierMask<K>> for IdentifierMask<K> {
    fn bitor_assign(&mut self, rhs: &IdentifierMask<K>) {
        for (word, other) in self.words.iter_mut().zip(rhs.words.iter()) {
            *word |= *other;
        }
    }
}

impl<K: IdentifierKind> BitAndAssign<&IdentifierMask<K>> for IdentifierMask<K> {
    fn bitand_assign(&mut self, rhs: &IdentifierMask<K>) {
        for (word, other) in self.words.iter_mut().zip(rhs.words.iter()) {
            *word &= *other;
        }
    }
}

impl<K: IdentifierKind> fmt::Debug for IdentifierMask<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K: IdentifierKind> IntoIterator for &'a IdentifierMask<K> {
    type Item = usize;
    type IntoIter = SetBitsIterator<'a, [u64]>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::define_identifier!(SlotKind => SlotIdentifier, u16, 8);
    crate::define_identifier!(SmallKind => SmallIdentifier, u8, 7, 70);

    fn id(index: usize) -> SlotIdentifier {
        SlotIdentifier::make_from_valid_index(index)
    }

    #[test]
    fn set_then_clear() {
        let mut mask = IdentifierMask::<SlotKind>::new();
        assert!(!mask.is_set(id(42)));
        assert!(mask.set(id(42)));
        assert!(mask.is_set(id(42)));
        assert!(!mask.set(id(42)));
        assert!(mask.clear(id(42)));
        assert!(!mask.is_set(id(42)));
        assert!(!mask.clear(id(42)));
    }

    #[test]
    fn no_cross_talk_between_bits() {
        let mut mask = IdentifierMask::<SlotKind>::new();
        mask.set(id(63));
        for index in 0..SlotIdentifier::MAXIMUM_COUNT {
            if index == 63 {
                continue;
            }
            mask.set(id(index));
            mask.clear(id(index));
        }
        assert!(mask.is_set(id(63)));
        assert_eq!(mask.count(), 1);
    }

    #[test]
    fn salted_identifiers_share_a_bit() {
        let mut mask = IdentifierMask::<SlotKind>::new();
        mask.set(SlotIdentifier::make_from_index_and_reuse_count(5, 3));
        assert!(mask.is_set(id(5)));
    }

    #[test]
    fn set_bits_iterates_in_order_and_restarts() {
        let mut mask = IdentifierMask::<SlotKind>::new();
        for index in [200, 3, 64, 65, 127] {
            mask.set(id(index));
        }
        let first: Vec<usize> = mask.iter().collect();
        let second: Vec<usize> = mask.iter().collect();
        assert_eq!(first, vec![3, 64, 65, 127, 200]);
        assert_eq!(first, second);
        assert_eq!(mask.set_bits(64, 128).collect::<Vec<_>>(), vec![64, 65, 127]);
        assert_eq!(mask.identifiers().nth(1), Some(id(64)));
    }

    #[test]
    fn set_all_respects_capped_capacity() {
        let mut mask = IdentifierMask::<SmallKind>::new();
        mask.set_all();
        assert_eq!(mask.count(), 70);
        assert_eq!(mask.iter().last(), Some(69));
        mask.clear_all();
        assert!(mask.is_empty());
    }

    #[test]
    fn set_algebra() {
        let mut a = IdentifierMask::<SlotKind>::new();
        let mut b = IdentifierMask::<SlotKind>::new();
        a.set(id(1));
        a.set(id(2));
        b.set(id(2));
        b.set(id(3));

        let mut union = a.clone();
        union |= &b;
        assert_eq!(union.iter().collect::<Vec<_>>(), vec![1, 2, 3]);

        let mut intersection = a.clone();
        intersection &= &b;
        assert_eq!(intersection.iter().collect::<Vec<_>>(), vec![2]);

        a.clear_mask(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(format!("{a:?}"), "{1}");
    }
}
