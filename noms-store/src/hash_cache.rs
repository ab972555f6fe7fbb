// What the store knows about a hash without having fetched its chunk:
// whether it's present anywhere we've looked, the type it was last seen
// declared as, and a "provenance" hash — some chunk known to hold a
// reference to this one, used to pick a hint when we later write a
// parent that points at it. Absence of provenance (`Hash::EMPTY`) marks
// a hash we know about only because it was itself written or read
// top-level, not because we found it as somebody's child.

use std::collections::HashMap;
use std::sync::Mutex;

use noms_base::Hash;
use noms_types::Type;

#[derive(Clone, Debug)]
pub struct HashCacheEntry {
    pub present: bool,
    pub ty: Option<Type>,
    pub provenance: Hash,
}

pub struct HashCache {
    entries: Mutex<HashMap<Hash, HashCacheEntry>>,
}

impl HashCache {
    pub fn new() -> Self {
        HashCache { entries: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, hash: &Hash) -> Option<HashCacheEntry> {
        self.entries.lock().unwrap().get(hash).cloned()
    }

    pub fn mark_present(&self, hash: Hash, ty: Type, provenance: Hash) {
        let mut guard = self.entries.lock().unwrap();
        guard.insert(hash, HashCacheEntry { present: true, ty: Some(ty), provenance });
    }

    pub fn mark_absent(&self, hash: Hash) {
        let mut guard = self.entries.lock().unwrap();
        guard.insert(hash, HashCacheEntry { present: false, ty: None, provenance: Hash::EMPTY });
    }

    /// Record `{present: true, type, provenance: via}` for `hash` unless an
    /// existing entry already carries a non-empty provenance distinct from
    /// `via` — first hint wins, matching the read-time `cacheChunks` rule.
    pub fn hint(&self, hash: Hash, ty: Type, via: Hash) {
        let mut guard = self.entries.lock().unwrap();
        match guard.get(&hash) {
            Some(existing) if existing.provenance != Hash::EMPTY && existing.provenance != via => {}
            _ => {
                guard.insert(hash, HashCacheEntry { present: true, ty: Some(ty), provenance: via });
            }
        }
    }

    /// Record `hash` as present top-level (no provenance) unless an entry
    /// for it already exists.
    pub fn hint_top_level_if_absent(&self, hash: Hash, ty: Type) {
        let mut guard = self.entries.lock().unwrap();
        guard.entry(hash).or_insert(HashCacheEntry { present: true, ty: Some(ty), provenance: Hash::EMPTY });
    }
}

impl Default for HashCache {
    fn default() -> Self {
        HashCache::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn first_hint_wins() {
        let cache = HashCache::new();
        let target = Hash::of_bytes(b"target");
        let via_a = Hash::of_bytes(b"a");
        let via_b = Hash::of_bytes(b"b");
        cache.hint(target, noms_types::number_type(), via_a);
        cache.hint(target, noms_types::string_type(), via_b);
        let entry = cache.get(&target).unwrap();
        assert_eq!(entry.provenance, via_a);
    }

    #[test]
    fn absent_then_present_overwrites() {
        let cache = HashCache::new();
        let h = Hash::of_bytes(b"h");
        cache.mark_absent(h);
        assert!(!cache.get(&h).unwrap().present);
        cache.mark_present(h, noms_types::number_type(), Hash::EMPTY);
        assert!(cache.get(&h).unwrap().present);
    }
}
