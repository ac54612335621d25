// atomic_mask.rs - Lock-free presence bitset
//
// Every mutation is a single fetch_or/fetch_and or a bounded CAS retry on one
// word, so concurrent callers never lose an update and never block.

use super::bits::{self, SetBitsIterator};
use super::{Identifier, IdentifierKind, IdentifierMask};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrency-safe variant of [`IdentifierMask`].
///
/// `set` and `clear` report whether they performed the transition, so when
/// several threads race on the same bit exactly one of them observes `true`.
/// That makes the mask usable as a claim table ("is this asset already being
/// loaded?") without a lock.
pub struct AtomicIdentifierMask<K: IdentifierKind> {
    words: Box<[AtomicU64]>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: IdentifierKind> AtomicIdentifierMask<K> {
    pub fn new() -> Self {
        let words = (0..bits::word_count(K::MAXIMUM_COUNT))
            .map(|_| AtomicU64::new(0))
            .collect();
        Self {
            words,
            _kind: PhantomData,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        K::MAXIMUM_COUNT
    }

    /// Returns true if this call set the bit.
    #[inline]
    pub fn set(&self, identifier: Identifier<K>) -> bool {
        debug_assert!(identifier.is_in_range(), "mask set with {identifier:?}");
        self.set_index(identifier.first_valid_index())
    }

    /// Returns true if this call cleared the bit.
    #[inline]
    pub fn clear(&self, identifier: Identifier<K>) -> bool {
        debug_assert!(identifier.is_in_range(), "mask clear with {identifier:?}");
        self.clear_index(identifier.first_valid_index())
    }

    #[inline]
    pub fn is_set(&self, identifier: Identifier<K>) -> bool {
        debug_assert!(identifier.is_in_range(), "mask test with {identifier:?}");
        self.is_index_set(identifier.first_valid_index())
    }

    #[inline]
    pub fn set_index(&self, index: usize) -> bool {
        debug_assert!(index < K::MAXIMUM_COUNT);
        let bit = bits::bit_of(index);
        let previous = self.words[bits::word_of(index)].fetch_or(bit, Ordering::AcqRel);
        previous & bit == 0
    }

    #[inline]
    pub fn clear_index(&self, index: usize) -> bool {
        debug_assert!(index < K::MAXIMUM_COUNT);
        let bit = bits::bit_of(index);
        let previous = self.words[bits::word_of(index)].fetch_and(!bit, Ordering::AcqRel);
        previous & bit != 0
    }

    #[inline]
    pub fn is_index_set(&self, index: usize) -> bool {
        debug_assert!(index < K::MAXIMUM_COUNT);
        self.words[bits::word_of(index)].load(Ordering::Acquire) & bits::bit_of(index) != 0
    }

    /// Atomically claim the lowest clear bit in `[start, end)`.
    ///
    /// Returns the claimed index, or `None` if every bit in the range was set
    /// at the time it was inspected.
    pub fn claim_first_unset(&self, start: usize, end: usize) -> Option<usize> {
        let end = end.min(K::MAXIMUM_COUNT);
        if start >= end {
            return None;
        }
        for word_index in bits::word_of(start)..bits::word_count(end) {
            let word = &self.words[word_index];
            let range = bits::range_mask(word_index, start, end);
            let mut current = word.load(Ordering::Acquire);
            loop {
                let free = !current & range;
                if free == 0 {
                    break;
                }
                let bit = 1u64 << free.trailing_zeros();
                match word.compare_exchange_weak(
                    current,
                    current | bit,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => {
                        return Some(word_index * bits::WORD_BITS + bit.trailing_zeros() as usize)
                    }
                    Err(observed) => current = observed,
                }
            }
        }
        None
    }

    pub fn clear_all(&self) {
        for word in self.words.iter() {
            word.store(0, Ordering::Release);
        }
    }

    pub fn count(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    pub fn are_any_set(&self) -> bool {
        self.words
            .iter()
            .any(|word| word.load(Ordering::Acquire) != 0)
    }

    pub fn is_empty(&self) -> bool {
        !self.are_any_set()
    }

    pub fn iter(&self) -> SetBitsIterator<'_, [AtomicU64]> {
        self.set_bits(0, K::MAXIMUM_COUNT)
    }

    /// Iterate the set indices inside `[start, end)`. Each word is read when
    /// iteration reaches it.
    pub fn set_bits(&self, start: usize, end: usize) -> SetBitsIterator<'_, [AtomicU64]> {
        SetBitsIterator::new(&self.words[..], start, end.min(K::MAXIMUM_COUNT))
    }

    /// Copy the current state into a plain mask.
    pub fn load(&self) -> IdentifierMask<K> {
        IdentifierMask::from_words(
            self.words
                .iter()
                .map(|word| word.load(Ordering::Acquire))
                .collect(),
        )
    }
}

impl<K: IdentifierKind> Default for AtomicIdentifierMask<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: IdentifierKind> fmt::Debug for AtomicIdentifierMask<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
