// salted.rs - Lock-free identifier allocation with stale-handle detection

use super::{AtomicIdentifierMask, Identifier, IdentifierArray, IdentifierKind};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Hands out identifiers of domain `K` and takes them back.
///
/// Each slot carries a reuse count that is baked into the identifiers it
/// produces. Releasing a slot bumps the count, so handles held across a
/// release/acquire cycle stop being current instead of silently aliasing the
/// new occupant.
///
/// `acquire`, `release` and `is_current` take `&self` and may be called from
/// any number of threads at once.
pub struct SaltedIdentifierStorage<K: IdentifierKind> {
    used: AtomicIdentifierMask<K>,
    reuse_counts: IdentifierArray<AtomicU64, K>,
    maximum_used: AtomicUsize,
}

impl<K: IdentifierKind> SaltedIdentifierStorage<K> {
    pub fn new() -> Self {
        Self {
            used: AtomicIdentifierMask::new(),
            reuse_counts: IdentifierArray::zeroed(),
            maximum_used: AtomicUsize::new(0),
        }
    }

    /// Claim the lowest free slot. Returns `None` when every slot is in use.
    pub fn acquire(&self) -> Option<Identifier<K>> {
        let index = self.used.claim_first_unset(0, K::MAXIMUM_COUNT)?;
        self.maximum_used.fetch_max(index + 1, Ordering::AcqRel);
        let reuse_count = self.reuse_counts.as_slice()[index].load(Ordering::Acquire);
        Some(Identifier::make_from_index_and_reuse_count(index, reuse_count))
    }

    /// Return `identifier` to the pool.
    ///
    /// Returns false if the identifier is invalid or no longer current; the
    /// slot is left untouched in that case.
    pub fn release(&self, identifier: Identifier<K>) -> bool {
        if !identifier.is_in_range() {
            return false;
        }
        let index = identifier.first_valid_index();
        if !self.used.is_index_set(index) {
            return false;
        }
        // Without reuse bits the count never moves, so the used bit decides.
        if Identifier::<K>::REUSE_BITS == 0 {
            return self.used.clear_index(index);
        }
        let reuse_count = identifier.reuse_count();
        let next = (reuse_count + 1) & Identifier::<K>::MAXIMUM_REUSE_COUNT;
        // Only one releaser can move the count forward.
        if self.reuse_counts.as_slice()[index]
            .compare_exchange(reuse_count, next, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        let was_set = self.used.clear_index(index);
        debug_assert!(was_set, "released slot {index} was not marked in use");
        was_set
    }

    /// True if `identifier` is the live handle for its slot.
    pub fn is_current(&self, identifier: Identifier<K>) -> bool {
        if !identifier.is_in_range() {
            return false;
        }
        let index = identifier.first_valid_index();
        self.used.is_index_set(index)
            && self.reuse_counts.as_slice()[index].load(Ordering::Acquire)
                == identifier.reuse_count()
    }

    /// The live identifier occupying zero-based slot `index`, if any.
    pub fn current_identifier(&self, index: usize) -> Option<Identifier<K>> {
        if index >= K::MAXIMUM_COUNT || !self.used.is_index_set(index) {
            return None;
        }
        let reuse_count = self.reuse_counts.as_slice()[index].load(Ordering::Acquire);
        Some(Identifier::make_from_index_and_reuse_count(index, reuse_count))
    }

    /// One past the highest slot index ever handed out. Bounds iteration
    /// over arrays of this domain.
    pub fn maximum_used_element_count(&self) -> usize {
        self.maximum_used.load(Ordering::Acquire)
    }

    /// Bound `elements` to the slots that have ever been handed out.
    ///
    /// Slots past [`maximum_used_element_count`](Self::maximum_used_element_count)
    /// were never acquired, so walks over a per-slot array can stop there.
    pub fn valid_element_view<'a, T>(&self, elements: &'a [T]) -> &'a [T] {
        let end = self.maximum_used_element_count().min(elements.len());
        &elements[..end]
    }

    pub fn valid_element_view_mut<'a, T>(&self, elements: &'a mut [T]) -> &'a mut [T] {
        let end = self.maximum_used_element_count().min(elements.len());
        &mut elements[..end]
    }

    pub fn used_mask(&self) -> &AtomicIdentifierMask<K> {
        &self.used
    }

    pub fn len(&self) -> usize {
        self.used.count()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Iterate the live identifiers.
    pub fn iter(&self) -> impl Iterator<Item = Identifier<K>> + '_ {
        self.used
            .set_bits(0, self.maximum_used_element_count())
            .filter_map(|index| self.current_identifier(index))
    }
}

impl<K: IdentifierKind> Default for SaltedIdentifierStorage<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::collections::HashSet;

    crate::define_identifier!(ClientKind => ClientIdentifier, u16, 6);
    crate::define_identifier!(FlatKind => FlatIdentifier, u8, 8, 4);

    #[test]
    fn acquire_hands_out_lowest_free_slot() {
        let storage = SaltedIdentifierStorage::<ClientKind>::new();
        let a = storage.acquire().unwrap();
        let b = storage.acquire().unwrap();
        assert_eq!(a.first_valid_index(), 0);
        assert_eq!(b.first_valid_index(), 1);
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.maximum_used_element_count(), 2);
    }

    #[test]
    fn released_handles_go_stale() {
        let storage = SaltedIdentifierStorage::<ClientKind>::new();
        let first = storage.acquire().unwrap();
        assert!(storage.is_current(first));
        assert!(storage.release(first));
        assert!(!storage.is_current(first));
        assert!(!storage.release(first));

        let second = storage.acquire().unwrap();
        assert_eq!(second.first_valid_index(), first.first_valid_index());
        assert_ne!(second, first);
        assert_eq!(second.reuse_count(), 1);
        assert!(storage.is_current(second));
        assert!(!storage.is_current(first));
        assert!(!storage.release(first));
        assert!(storage.is_current(second));
    }

    #[test]
    fn exhaustion_returns_none() {
        let storage = SaltedIdentifierStorage::<FlatKind>::new();
        let ids: Vec<_> = (0..4).map(|_| storage.acquire().unwrap()).collect();
        assert!(storage.acquire().is_none());
        assert!(storage.release(ids[2]));
        let again = storage.acquire().unwrap();
        assert_eq!(again.first_valid_index(), 2);
        // No reuse bits in this domain: the old handle reads as current again.
        assert_eq!(again, ids[2]);
    }

    #[test]
    fn invalid_identifier_is_never_current() {
        let storage = SaltedIdentifierStorage::<ClientKind>::new();
        assert!(!storage.is_current(ClientIdentifier::INVALID));
        assert!(!storage.release(ClientIdentifier::INVALID));
    }

    #[test]
    fn concurrent_connect_and_disconnect() {
        let storage = SaltedIdentifierStorage::<ClientKind>::new();
        let connected: Vec<ClientIdentifier> = (0..ClientIdentifier::MAXIMUM_COUNT)
            .into_par_iter()
            .map(|_| storage.acquire().unwrap())
            .collect();
        let unique: HashSet<_> = connected.iter().map(|id| id.first_valid_index()).collect();
        assert_eq!(unique.len(), ClientIdentifier::MAXIMUM_COUNT);
        assert!(storage.acquire().is_none());

        let released = connected
            .par_iter()
            .filter(|id| id.first_valid_index() % 2 == 0)
            .filter(|id| storage.release(**id))
            .count();
        assert_eq!(released, ClientIdentifier::MAXIMUM_COUNT.div_ceil(2));
        assert_eq!(storage.len(), ClientIdentifier::MAXIMUM_COUNT / 2);
        assert!(storage.iter().all(|id| id.first_valid_index() % 2 == 1));
    }

    #[test]
    fn racing_releases_without_reuse_bits_succeed_once() {
        for _ in 0..64 {
            let storage = SaltedIdentifierStorage::<FlatKind>::new();
            let id = storage.acquire().unwrap();
            let barrier = std::sync::Barrier::new(4);
            let successes = std::sync::atomic::AtomicUsize::new(0);
            std::thread::scope(|scope| {
                for _ in 0..4 {
                    scope.spawn(|| {
                        barrier.wait();
                        if storage.release(id) {
                            successes.fetch_add(1, Ordering::Relaxed);
                        }
                    });
                }
            });
            assert_eq!(successes.into_inner(), 1);
            assert!(storage.is_empty());
        }
    }

    #[test]
    fn valid_element_view_stops_at_high_water_mark() {
        let storage = SaltedIdentifierStorage::<ClientKind>::new();
        let mut values = IdentifierArray::<u32, ClientKind>::from_fn(|index| index as u32);
        assert!(storage.valid_element_view(values.as_slice()).is_empty());

        let ids: Vec<_> = (0..3).map(|_| storage.acquire().unwrap()).collect();
        assert!(storage.release(ids[2]));
        assert_eq!(storage.valid_element_view(values.as_slice()), &[0, 1, 2]);

        storage
            .valid_element_view_mut(values.as_mut_slice())
            .iter_mut()
            .for_each(|value| *value += 10);
        assert_eq!(values.as_slice()[..4], [10, 11, 12, 3]);
        assert_eq!(storage.valid_element_view(&[7u8]), &[7]);
    }

    #[test]
    fn racing_releases_succeed_once() {
        let storage = SaltedIdentifierStorage::<ClientKind>::new();
        let id = storage.acquire().unwrap();
        let successes = (0..16)
            .into_par_iter()
            .filter(|_| storage.release(id))
            .count();
        assert_eq!(successes, 1);
        assert!(storage.is_empty());
    }
}
