// bits.rs - Word-level helpers shared by the plain and atomic masks

use std::sync::atomic::{AtomicU64, Ordering};

pub(crate) const WORD_BITS: usize = u64::BITS as usize;

#[inline]
pub(crate) const fn word_count(bit_count: usize) -> usize {
    bit_count.div_ceil(WORD_BITS)
}

#[inline]
pub(crate) const fn word_of(index: usize) -> usize {
    index / WORD_BITS
}

#[inline]
pub(crate) const fn bit_of(index: usize) -> u64 {
    1u64 << (index % WORD_BITS)
}

/// Bits of word `word` that fall inside `[start, end)`.
#[inline]
pub(crate) fn range_mask(word: usize, start: usize, end: usize) -> u64 {
    let word_start = word * WORD_BITS;
    let word_end = word_start + WORD_BITS;
    if end <= word_start || start >= word_end {
        return 0;
    }
    let low = start.saturating_sub(word_start);
    let high = end.min(word_end) - word_start;
    let upper = if high == WORD_BITS {
        u64::MAX
    } else {
        (1u64 << high) - 1
    };
    upper & (u64::MAX << low)
}

/// Read access to the words backing a mask.
pub trait BitWords {
    fn word_count(&self) -> usize;
    fn load_word(&self, index: usize) -> u64;
}

impl BitWords for [u64] {
    #[inline]
    fn word_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn load_word(&self, index: usize) -> u64 {
        self[index]
    }
}

impl BitWords for [AtomicU64] {
    #[inline]
    fn word_count(&self) -> usize {
        self.len()
    }

    #[inline]
    fn load_word(&self, index: usize) -> u64 {
        self[index].load(Ordering::Acquire)
    }
}

/// Lazy iterator over the set bit positions of a mask within `[start, end)`.
///
/// Words are loaded one at a time as iteration reaches them, so for atomic
/// masks each word reflects its state at the moment it was read.
pub struct SetBitsIterator<'a, W: ?Sized + BitWords> {
    words: &'a W,
    word: usize,
    current: u64,
    end: usize,
}

impl<'a, W: ?Sized + BitWords> SetBitsIterator<'a, W> {
    pub(crate) fn new(words: &'a W, start: usize, end: usize) -> Self {
        let end = end.min(words.word_count() * WORD_BITS);
        if start >= end {
            return Self {
                words,
                word: word_count(end),
                current: 0,
                end,
            };
        }
        let word = word_of(start);
        Self {
            words,
            word,
            current: words.load_word(word) & range_mask(word, start, end),
            end,
        }
    }
}

impl<W: ?Sized + BitWords> Iterator for SetBitsIterator<'_, W> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word * WORD_BITS + bit);
            }
            self.word += 1;
            if self.word * WORD_BITS >= self.end {
                return None;
            }
            self.current =
                self.words.load_word(self.word) & range_mask(self.word, 0, self.end);
        }
    }
}
