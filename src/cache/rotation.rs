//! Deduplicating, capacity-bounded rotation cache.
//!
//! Holds a small set of unique recommendation items that is refilled in
//! stages: the first request renders what is held and fetches only until
//! `target` fresh items exist; later requests top it up once the refill
//! cycle's time budget elapses, evicting the oldest items first.
//!
//! All operations are pure: they take a [`CacheState`] and return a new
//! one. The caller owns the state (see
//! [`DiscoveryCacheStore`](super::DiscoveryCacheStore)) and replaces it
//! with the result.
//!
//! # Layout
//!
//! ```text
//!   slots:  [ e4 | e5 | e2 | e3 ]     capacity = 4, full
//!   fresh:  [ T  | T  | F  | F  ]
//!                     ^ cursor = oldest slot, next to be overwritten
//! ```
//!
//! While the cache is filling, new entries are appended and `cursor`
//! stays at 0. Once full, a new unique item overwrites `slots[cursor]` and
//! the cursor advances, which is FIFO eviction in insertion order.

use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Derives the deduplication key of a cached item.
pub trait IdentityKey {
    fn identity_key(&self) -> String;
}

/// One held item.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub key: String,
    pub item: T,
    /// Monotonic insertion sequence number.
    pub inserted_at_slot: u64,
}

/// Ring buffer of unique items plus per-slot freshness.
#[derive(Debug, Clone)]
pub struct CacheState<T> {
    slots: Vec<CacheEntry<T>>,
    fresh: Vec<bool>,
    cursor: usize,
    capacity: usize,
    next_seq: u64,
    cycle_started: Option<Instant>,
}

impl<T> CacheState<T> {
    /// An empty cache holding at most `capacity` items.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            fresh: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
            next_seq: 0,
            cycle_started: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of items held.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of items written during the current refill cycle.
    pub fn fresh_count(&self) -> usize {
        self.fresh.iter().filter(|f| **f).count()
    }

    /// Items ever written, including evicted ones.
    pub fn written(&self) -> u64 {
        self.next_seq
    }

    /// When the current refill cycle wrote its first item.
    pub fn cycle_started(&self) -> Option<Instant> {
        self.cycle_started
    }

    /// Whether an item with this key is held.
    pub fn contains_key(&self, key: &str) -> bool {
        self.slots.iter().any(|e| e.key == key)
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry<T>> + '_ {
        let split = if self.slots.len() < self.capacity {
            0
        } else {
            self.cursor
        };
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    fn keys(&self) -> HashSet<String> {
        self.slots.iter().map(|e| e.key.clone()).collect()
    }

    /// Rebuild with a different capacity, keeping the newest entries.
    fn resized(self, capacity: usize) -> Self {
        let len = self.slots.len();
        let split = if len < self.capacity { 0 } else { self.cursor };
        let mut ordered: Vec<(CacheEntry<T>, bool)> =
            self.slots.into_iter().zip(self.fresh).collect();
        ordered.rotate_left(split);
        let skip = ordered.len().saturating_sub(capacity);

        let mut state = Self::new(capacity);
        state.next_seq = self.next_seq;
        state.cycle_started = self.cycle_started;
        for (entry, fresh) in ordered.into_iter().skip(skip) {
            state.slots.push(entry);
            state.fresh.push(fresh);
        }
        state
    }
}

/// Merge `incoming` into `current` at time `now`.
///
/// Items whose identity key is already held (or repeated within
/// `incoming`) are skipped. New items fill free slots first, then
/// overwrite the oldest slot. Every written slot is marked fresh; the
/// refill cycle starts at `now` if no cycle is running.
pub fn rotate_cache_at<T, I>(
    current: CacheState<T>,
    incoming: I,
    capacity: usize,
    now: Instant,
) -> CacheState<T>
where
    T: IdentityKey,
    I: IntoIterator<Item = T>,
{
    let mut state = if capacity == current.capacity {
        current
    } else {
        current.resized(capacity)
    };
    if state.capacity == 0 {
        return state;
    }

    let mut held = state.keys();
    for item in incoming {
        let key = item.identity_key();
        if held.contains(&key) {
            continue;
        }

        let entry = CacheEntry {
            key: key.clone(),
            item,
            inserted_at_slot: state.next_seq,
        };
        state.next_seq += 1;

        if state.slots.len() < state.capacity {
            state.slots.push(entry);
            state.fresh.push(true);
        } else {
            let evicted = std::mem::replace(&mut state.slots[state.cursor], entry);
            held.remove(&evicted.key);
            state.fresh[state.cursor] = true;
            state.cursor = (state.cursor + 1) % state.capacity;
        }
        held.insert(key);

        if state.cycle_started.is_none() {
            state.cycle_started = Some(now);
        }
    }
    state
}

/// [`rotate_cache_at`] with the current time.
pub fn rotate_cache<T, I>(current: CacheState<T>, incoming: I, capacity: usize) -> CacheState<T>
where
    T: IdentityKey,
    I: IntoIterator<Item = T>,
{
    rotate_cache_at(current, incoming, capacity, Instant::now())
}

/// Whether fewer than `target` items were written this cycle.
pub fn needs_more_items<T>(state: &CacheState<T>, target: usize) -> bool {
    state.fresh_count() < target
}

/// Whether the running refill cycle is older than `max_age`.
///
/// Once true, the fresh flags should be cleared (see
/// [`expire_fresh_slots`]) so held items stop suppressing refills.
pub fn is_fresh_slot_expired<T>(state: &CacheState<T>, max_age: Duration, now: Instant) -> bool {
    match state.cycle_started {
        Some(started) => state.fresh_count() > 0 && now.saturating_duration_since(started) >= max_age,
        None => false,
    }
}

/// Clear all fresh flags and end the cycle if it has expired.
pub fn expire_fresh_slots<T>(
    mut state: CacheState<T>,
    max_age: Duration,
    now: Instant,
) -> CacheState<T> {
    if is_fresh_slot_expired(&state, max_age, now) {
        state.fresh.iter_mut().for_each(|f| *f = false);
        state.cycle_started = None;
    }
    state
}

/// Held items, oldest first. Lazy and side-effect free.
pub fn get_all_items<T>(state: &CacheState<T>) -> impl Iterator<Item = &T> + '_ {
    state.entries().map(|e| &e.item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(u32);

    impl IdentityKey for Item {
        fn identity_key(&self) -> String {
            self.0.to_string()
        }
    }

    fn ids(state: &CacheState<Item>) -> Vec<u32> {
        get_all_items(state).map(|i| i.0).collect()
    }

    fn items(ids: &[u32]) -> Vec<Item> {
        ids.iter().copied().map(Item).collect()
    }

    #[test]
    fn fills_free_slots_in_order() {
        let state = rotate_cache(CacheState::new(4), items(&[1, 2, 3]), 4);
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(state.fresh_count(), 3);
    }

    #[test]
    fn second_batch_skips_held_keys() {
        let state = rotate_cache(CacheState::new(6), items(&[1, 2, 3]), 6);
        assert!(!needs_more_items(&state, 3));
        let state = rotate_cache(state, items(&[2, 4]), 6);
        assert_eq!(ids(&state), vec![1, 2, 3, 4]);
        assert_eq!(state.fresh_count(), 4);
    }

    #[test]
    fn duplicates_within_batch_are_skipped() {
        let state = rotate_cache(CacheState::new(4), items(&[1, 1, 2, 1]), 4);
        assert_eq!(ids(&state), vec![1, 2]);
    }

    #[test]
    fn eviction_overwrites_oldest() {
        let state = rotate_cache(CacheState::new(3), items(&[1, 2, 3]), 3);
        let state = rotate_cache(state, items(&[4]), 3);
        assert_eq!(ids(&state), vec![2, 3, 4]);
        let state = rotate_cache(state, items(&[5, 6]), 3);
        assert_eq!(ids(&state), vec![4, 5, 6]);
    }

    #[test]
    fn evicted_key_may_return() {
        let state = rotate_cache(CacheState::new(2), items(&[1, 2, 3]), 2);
        assert_eq!(ids(&state), vec![2, 3]);
        let state = rotate_cache(state, items(&[1]), 2);
        assert_eq!(ids(&state), vec![3, 1]);
    }

    #[test]
    fn inserted_at_slot_is_monotonic() {
        let state = rotate_cache(CacheState::new(2), items(&[1, 2, 3]), 2);
        let seqs: Vec<u64> = state.entries().map(|e| e.inserted_at_slot).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn zero_capacity_holds_nothing() {
        let state = rotate_cache(CacheState::new(0), items(&[1, 2]), 0);
        assert!(state.is_empty());
        assert!(needs_more_items(&state, 1));
    }

    #[test]
    fn shrinking_capacity_keeps_newest() {
        let state = rotate_cache(CacheState::new(4), items(&[1, 2, 3, 4]), 4);
        let state = rotate_cache(state, items(&[5]), 4);
        assert_eq!(ids(&state), vec![2, 3, 4, 5]);

        let state = rotate_cache(state, Vec::new(), 2);
        assert_eq!(ids(&state), vec![4, 5]);
        assert_eq!(state.capacity(), 2);

        let state = rotate_cache(state, items(&[6]), 2);
        assert_eq!(ids(&state), vec![5, 6]);
    }

    #[test]
    fn growing_capacity_appends_after_newest() {
        let state = rotate_cache(CacheState::new(2), items(&[1, 2, 3]), 2);
        let state = rotate_cache(state, items(&[4]), 3);
        assert_eq!(ids(&state), vec![2, 3, 4]);
    }

    #[test]
    fn cycle_starts_on_first_write_only() {
        let t0 = Instant::now();
        let state = rotate_cache_at(CacheState::new(4), items(&[1]), 4, t0);
        let later = t0 + Duration::from_secs(5);
        let state = rotate_cache_at(state, items(&[2]), 4, later);
        assert_eq!(state.cycle_started(), Some(t0));

        let state = rotate_cache_at(state, items(&[1, 2]), 4, later);
        assert_eq!(state.fresh_count(), 2);
    }

    #[test]
    fn expiry_clears_fresh_flags() {
        let t0 = Instant::now();
        let max_age = Duration::from_secs(60);
        let state = rotate_cache_at(CacheState::new(6), items(&[1, 2, 3]), 6, t0);

        assert!(!is_fresh_slot_expired(&state, max_age, t0 + Duration::from_secs(59)));
        assert!(is_fresh_slot_expired(&state, max_age, t0 + max_age));

        let state = expire_fresh_slots(state, max_age, t0 + max_age);
        assert_eq!(state.fresh_count(), 0);
        assert_eq!(state.cycle_started(), None);
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert!(!is_fresh_slot_expired(&state, max_age, t0 + max_age * 2));
    }

    #[test]
    fn empty_state_is_never_expired() {
        let state: CacheState<Item> = CacheState::new(6);
        assert!(!is_fresh_slot_expired(
            &state,
            Duration::ZERO,
            Instant::now()
        ));
    }

    #[test]
    fn get_all_items_is_restartable() {
        let state = rotate_cache(CacheState::new(3), items(&[1, 2, 3, 4]), 3);
        let first: Vec<_> = get_all_items(&state).collect();
        let second: Vec<_> = get_all_items(&state).collect();
        assert_eq!(first, second);
        assert_eq!(state.len(), 3);
    }
}
