//! LRU Index Module
//!
//! Implements the ordering index: a slab-backed doubly linked list giving the
//! recency order, paired with a hash map from key to slab slot.

use std::collections::HashMap;
use std::mem;
use std::time::{Duration, Instant};

use crate::cache::entry::{CacheEntry, NIL};

/// Slot of the head sentinel (most recently used side).
const HEAD: usize = 0;
/// Slot of the tail sentinel (least recently used side).
const TAIL: usize = 1;

// == LRU Index ==
/// Recency-ordered entry storage with O(1) lookup, promotion and eviction.
///
/// The list runs from `HEAD` (most recently used) to `TAIL` (least recently
/// used). Freed slots are chained through their `next` link and reused.
///
/// Every entry leaving the index, for whatever reason, is pushed to a
/// departures buffer that the owner drains with [`LruIndex::take_departures`].
///
/// Not thread-safe on its own; callers serialize access.
#[derive(Debug)]
pub struct LruIndex<V> {
    /// Maximum number of entries, 0 = unbounded
    capacity: usize,
    /// Key to slot lookup
    map: HashMap<String, usize>,
    /// Slab of entries, slots 0 and 1 are the sentinels
    slots: Vec<CacheEntry<V>>,
    /// First reusable slot
    free_head: usize,
    /// Entries removed since the last drain
    departures: Vec<(String, V)>,
}

impl<V> LruIndex<V> {
    // == Constructor ==
    /// Creates an empty index holding at most `capacity` entries (0 = unbounded).
    pub fn new(capacity: usize) -> Self {
        let mut head = CacheEntry::sentinel();
        let mut tail = CacheEntry::sentinel();
        head.next = TAIL;
        tail.prev = HEAD;

        Self {
            capacity,
            map: HashMap::new(),
            slots: vec![head, tail],
            free_head: NIL,
            departures: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of indexed entries, expired ones included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    // == Add ==
    /// Inserts or refreshes `key`, leaving it most recently used.
    ///
    /// A new key arriving at capacity evicts the least recently used entry.
    pub fn add(&mut self, key: String, value: V, ttl: Duration, now: Instant) {
        if let Some(&idx) = self.map.get(&key) {
            self.slots[idx].refresh(value, ttl, now);
            self.move_to_front(idx);
            return;
        }

        if self.capacity != 0 && self.map.len() >= self.capacity {
            self.remove_oldest();
        }

        let idx = self.alloc(CacheEntry::new(key.clone(), value, ttl, now));
        self.push_front(idx);
        self.map.insert(key, idx);
    }

    // == Get ==
    /// Returns the live value for `key` and promotes it to most recently used.
    ///
    /// An expired entry is removed and reported as absent.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<&V> {
        let idx = self.live_slot(key, now)?;
        self.move_to_front(idx);
        self.slots[idx].value.as_ref()
    }

    // == Peek ==
    /// Like [`LruIndex::get`] but leaves the recency order untouched.
    pub fn peek(&mut self, key: &str, now: Instant) -> Option<&V> {
        let idx = self.live_slot(key, now)?;
        self.slots[idx].value.as_ref()
    }

    // == Keys ==
    /// Returns live keys from most to least recently used.
    ///
    /// Expired entries met along the way are removed.
    pub fn keys(&mut self, now: Instant) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.map.len());
        let mut idx = self.slots[HEAD].next;
        while idx != TAIL {
            let next = self.slots[idx].next;
            if self.slots[idx].is_expired_at(now) {
                self.remove_slot(idx);
            } else {
                keys.push(self.slots[idx].key.clone());
            }
            idx = next;
        }
        keys
    }

    // == Remove ==
    /// Removes `key` if present. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.map.get(key) {
            Some(&idx) => {
                self.remove_slot(idx);
                true
            }
            None => false,
        }
    }

    // == Remove Oldest ==
    /// Removes the least recently used entry and returns its key.
    pub fn remove_oldest(&mut self) -> Option<String> {
        let idx = self.slots[TAIL].prev;
        if idx == HEAD {
            return None;
        }
        let key = self.slots[idx].key.clone();
        self.remove_slot(idx);
        Some(key)
    }

    /// Removes the least recently used entry only if it has expired.
    pub fn remove_oldest_if_expired(&mut self, now: Instant) -> bool {
        let idx = self.slots[TAIL].prev;
        if idx == HEAD || !self.slots[idx].is_expired_at(now) {
            return false;
        }
        self.remove_slot(idx);
        true
    }

    // == Remove Expired ==
    /// Removes every expired entry regardless of position, oldest first.
    ///
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        let mut idx = self.slots[TAIL].prev;
        while idx != HEAD {
            let prev = self.slots[idx].prev;
            if self.slots[idx].is_expired_at(now) {
                self.remove_slot(idx);
                removed += 1;
            }
            idx = prev;
        }
        removed
    }

    // == Remove Matching ==
    /// Removes every entry whose key satisfies `predicate`.
    ///
    /// The predicate sees all keys before anything is removed.
    pub fn remove_matching<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&str) -> bool,
    {
        let mut doomed = Vec::new();
        let mut idx = self.slots[HEAD].next;
        while idx != TAIL {
            if predicate(self.slots[idx].key.as_str()) {
                doomed.push(idx);
            }
            idx = self.slots[idx].next;
        }

        for &idx in &doomed {
            self.remove_slot(idx);
        }
        doomed.len()
    }

    // == Departures ==
    /// Drains the entries removed since the previous call.
    pub fn take_departures(&mut self) -> Vec<(String, V)> {
        mem::take(&mut self.departures)
    }

    /// Consumes the index, yielding undrained departures followed by every
    /// remaining entry from most to least recently used.
    pub fn into_entries(mut self) -> Vec<(String, V)> {
        let mut entries = mem::take(&mut self.departures);
        entries.reserve(self.map.len());

        let mut idx = self.slots[HEAD].next;
        while idx != TAIL {
            let slot = &mut self.slots[idx];
            if let Some(value) = slot.value.take() {
                entries.push((mem::take(&mut slot.key), value));
            }
            idx = slot.next;
        }
        entries
    }

    // == List Plumbing ==

    /// Slot of a live entry. Expired entries are removed on the way.
    fn live_slot(&mut self, key: &str, now: Instant) -> Option<usize> {
        let idx = *self.map.get(key)?;
        if self.slots[idx].is_expired_at(now) {
            self.remove_slot(idx);
            return None;
        }
        Some(idx)
    }

    /// Detaches a slot, frees it and records the departure.
    fn remove_slot(&mut self, idx: usize) {
        self.unlink(idx);

        let slot = &mut self.slots[idx];
        let key = mem::take(&mut slot.key);
        let value = slot.value.take();
        slot.expires_at = None;
        slot.next = self.free_head;
        self.free_head = idx;

        self.map.remove(&key);
        if let Some(value) = value {
            self.departures.push((key, value));
        }
    }

    fn alloc(&mut self, entry: CacheEntry<V>) -> usize {
        if self.free_head != NIL {
            let idx = self.free_head;
            self.free_head = self.slots[idx].next;
            self.slots[idx] = entry;
            idx
        } else {
            self.slots.push(entry);
            self.slots.len() - 1
        }
    }

    fn unlink(&mut self, idx: usize) {
        let prev = self.slots[idx].prev;
        let next = self.slots[idx].next;
        self.slots[prev].next = next;
        self.slots[next].prev = prev;
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        let first = self.slots[HEAD].next;
        self.slots[idx].prev = HEAD;
        self.slots[idx].next = first;
        self.slots[first].prev = idx;
        self.slots[HEAD].next = idx;
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.slots[HEAD].next == idx {
            return;
        }
        self.unlink(idx);
        self.push_front(idx);
    }

    /// Panics if the map and the list disagree.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut seen = 0;
        let mut prev = HEAD;
        let mut idx = self.slots[HEAD].next;
        while idx != TAIL {
            let slot = &self.slots[idx];
            assert_eq!(slot.prev, prev, "broken back link at slot {idx}");
            assert_eq!(self.map.get(&slot.key), Some(&idx), "unindexed slot {idx}");
            seen += 1;
            prev = idx;
            idx = slot.next;
        }
        assert_eq!(self.slots[TAIL].prev, prev);
        assert_eq!(seen, self.map.len(), "list and map lengths differ");
        if self.capacity != 0 {
            assert!(self.map.len() <= self.capacity);
        }
    }
}
