use std::hash::{BuildHasher, Hash};

use hashlink::linked_hash_map::Entry;
use hashlink::LinkedHashMap;

use crate::hash::KeyHashBuilder;
use crate::key::FlowKey;

pub mod direction;
pub mod flow;

/// Trait for types that have an intrinsic timestamp
pub trait Trackable {
    type Timestamp: PartialOrd + Clone;

    fn timestamp(&self) -> Self::Timestamp;
}

/// Insertion-ordered LRU table
///
/// Touching an entry through [`Tracker::get_or_insert_with`] moves it to the
/// back, so the front is always the least recently seen entry. Values carry
/// their own timestamp (see [`Trackable`]) instead of the table storing one.
pub struct Tracker<K, V: Trackable, S = KeyHashBuilder> {
    lru: LinkedHashMap<K, V, S>,
}

/// Flow table keyed by canonical flow keys and hashed with their digest
pub type FlowTable<V> = Tracker<FlowKey, V, KeyHashBuilder>;

impl<K, V, S> Tracker<K, V, S>
where
    K: Eq + Hash,
    V: Trackable,
    S: BuildHasher + Default,
{
    #[inline]
    pub fn new() -> Self {
        Tracker {
            lru: LinkedHashMap::with_hasher(S::default()),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Tracker {
            lru: LinkedHashMap::with_capacity_and_hasher(capacity, S::default()),
        }
    }
}

impl<K, V, S> Default for Tracker<K, V, S>
where
    K: Eq + Hash,
    V: Trackable,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> Tracker<K, V, S>
where
    K: Eq + Hash,
    V: Trackable,
    S: BuildHasher,
{
    /// Returns the entry for `key`, moved to the back, or inserts `create()`.
    #[inline]
    pub fn get_or_insert_with<F>(&mut self, key: K, create: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        match self.lru.entry(key) {
            Entry::Occupied(mut occupied) => {
                occupied.to_back();
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(create()),
        }
    }

    /// Evict entries from the front while `process` returns true
    pub fn process_and_evict<F>(&mut self, mut process: F) -> usize
    where
        F: FnMut(&K, &V) -> bool, // true: evict, false: keep and interrupt
    {
        let mut evicted = 0;
        loop {
            match self.lru.front() {
                Some((k, v)) if process(k, v) => {
                    self.lru.pop_front();
                    evicted += 1;
                }
                _ => break,
            }
        }
        evicted
    }

    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.lru.contains_key(key)
    }

    /// Oldest entry
    #[inline]
    pub fn front(&self) -> Option<(&K, &V)> {
        self.lru.front()
    }

    /// Newest entry
    #[inline]
    pub fn back(&self) -> Option<(&K, &V)> {
        self.lru.back()
    }

    #[inline]
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        self.lru.pop_front()
    }

    #[inline]
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.lru.remove(key)
    }

    #[inline]
    pub fn get_timestamp(&self, key: &K) -> Option<V::Timestamp> {
        self.lru.get(key).map(|v| v.timestamp())
    }

    /// Lookup without touching the LRU order
    #[inline]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.lru.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.lru.get_mut(key)
    }

    /// Entries from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.lru.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lru.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lru.is_empty()
    }
}
