//! Header-keeper cache: interns the key sequence observed on a CSV header
//! line so that every data record sharing that schema shares one key list.
//!
//! The original (`lrec_reader_mmap_csv.c`) stores the key sequence twice --
//! once as the hash map's key, once inside the `header_keeper_t` -- and
//! nullifies the map's keys before freeing the map to avoid a double free,
//! a code smell not worth repeating. Here a header keeper's key sequence is
//! a single `Arc<[Arc<str>]>` allocation; the
//! cache's `HashMap` holds a plain `Vec<Arc<str>>` as its lookup key (cheap
//! to construct from freshly parsed header fields, compared by content) and
//! the `Arc<HeaderKeeper>` as its value. There is exactly one owner of the
//! key bytes in the reference-counting sense, so there is nothing to
//! nullify and nothing that can double-free.

use std::collections::HashMap;
use std::sync::Arc;

/// An interned header schema: an ordered, immutable key sequence shared by
/// every data record with this schema.
#[derive(Debug)]
pub struct HeaderKeeper {
    pub keys: Arc<[Arc<str>]>,
}

impl HeaderKeeper {
    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

/// Maps key-sequence content to the one header keeper for that schema.
#[derive(Debug, Default)]
pub struct HeaderCache {
    map: HashMap<Vec<Arc<str>>, Arc<HeaderKeeper>>,
}

impl HeaderCache {
    pub fn new() -> Self {
        HeaderCache { map: HashMap::new() }
    }

    /// Returns the existing keeper for `keys` if one schema-matches, or
    /// installs and returns a new one. `keys` is consumed either way.
    pub fn intern(&mut self, keys: Vec<Arc<str>>) -> Arc<HeaderKeeper> {
        if let Some(existing) = self.map.get(&keys) {
            return Arc::clone(existing);
        }
        let keeper = Arc::new(HeaderKeeper { keys: Arc::from(keys.clone().into_boxed_slice()) });
        self.map.insert(keys, Arc::clone(&keeper));
        keeper
    }

    /// Number of distinct schemas interned so far.
    pub fn distinct_schema_count(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(names: &[&str]) -> Vec<Arc<str>> {
        names.iter().map(|s| Arc::from(*s)).collect()
    }

    #[test]
    fn repeated_schema_shares_one_keeper() {
        let mut cache = HeaderCache::new();
        let a = cache.intern(keys(&["a", "b", "c"]));
        let b = cache.intern(keys(&["a", "b", "c"]));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.distinct_schema_count(), 1);
    }

    #[test]
    fn distinct_schemas_get_distinct_keepers() {
        let mut cache = HeaderCache::new();
        let a = cache.intern(keys(&["a", "b"]));
        let b = cache.intern(keys(&["x", "y"]));
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.distinct_schema_count(), 2);
    }

    #[test]
    fn order_matters_for_schema_identity() {
        let mut cache = HeaderCache::new();
        let a = cache.intern(keys(&["a", "b"]));
        let b = cache.intern(keys(&["b", "a"]));
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
