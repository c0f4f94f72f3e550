//! Address-string LRU (§4.3): outbound addresses repeat heavily (`/n_set`,
//! `/s_new`, ...), so interning them avoids a fresh allocation per message
//! on the hot path.

use std::collections::HashMap;
use std::sync::Arc;

/// A small LRU cache mapping address strings to themselves, so a caller can
/// hand back a cheaply-cloned `Arc<str>` without re-allocating a string it
/// has already seen recently.
pub struct AddressCache {
    capacity: usize,
    entries: HashMap<Arc<str>, u64>,
    clock: u64,
}

impl AddressCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity),
            clock: 0,
        }
    }

    /// Interns `addr`, returning the cached copy. Evicts the least recently
    /// used entry if the cache is at capacity and `addr` is new. Only
    /// allocates on a miss; a hit just bumps the `Arc`'s refcount.
    pub fn intern(&mut self, addr: &str) -> Arc<str> {
        self.clock += 1;
        if let Some((key, _)) = self.entries.get_key_value(addr) {
            let interned = key.clone();
            *self.entries.get_mut(addr).unwrap() = self.clock;
            return interned;
        }

        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, &stamp)| stamp)
                .map(|(k, _)| k.clone())
            {
                self.entries.remove(&oldest);
            }
        }

        let interned: Arc<str> = Arc::from(addr);
        self.entries.insert(interned.clone(), self.clock);
        interned
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_up_to_capacity_then_evicts_lru() {
        let mut cache = AddressCache::new(2);
        cache.intern("/a");
        cache.intern("/b");
        assert_eq!(cache.len(), 2);
        cache.intern("/a"); // refresh /a, /b is now least recently used
        cache.intern("/c"); // evicts /b
        assert_eq!(cache.len(), 2);
        assert!(cache.entries.contains_key("/a"));
        assert!(cache.entries.contains_key("/c"));
        assert!(!cache.entries.contains_key("/b"));
    }
}
