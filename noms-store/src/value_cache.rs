// A size-bounded LRU of decoded values, keyed by hash and evicted by total
// encoded byte size rather than entry count — a large blob chunk should
// evict several small ones, not just the single oldest entry. The ordering
// structure is an intrusive doubly linked list over a slab of slots, which
// gets O(1) move-to-front on every touch instead of the O(n) shuffle a
// `VecDeque` would need.

use std::collections::HashMap;
use std::sync::Mutex;

use noms_base::Hash;
use noms_types::Value;

/// `get`/`add`/`drop` over decoded values. A cached entry may itself be
/// `None`, meaning "known absent" rather than "not in the cache at all".
pub trait ValueCache: Send + Sync {
    fn get(&self, hash: &Hash) -> Option<Option<Value>>;
    fn add(&self, hash: Hash, value: Option<Value>, encoded_len: u64);
    fn drop_entry(&self, hash: &Hash);
}

pub struct NoopValueCache;

impl ValueCache for NoopValueCache {
    fn get(&self, _hash: &Hash) -> Option<Option<Value>> {
        None
    }
    fn add(&self, _hash: Hash, _value: Option<Value>, _encoded_len: u64) {}
    fn drop_entry(&self, _hash: &Hash) {}
}

struct Slot {
    hash: Hash,
    value: Option<Value>,
    byte_len: u64,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Lru {
    slots: Vec<Slot>,
    free: Vec<usize>,
    index: HashMap<Hash, usize>,
    head: Option<usize>, // most recently used
    tail: Option<usize>, // least recently used
    capacity_bytes: u64,
    used_bytes: u64,
}

impl Lru {
    fn new(capacity_bytes: u64) -> Self {
        Lru {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            capacity_bytes,
            used_bytes: 0,
        }
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = None;
        self.slots[idx].next = self.head;
        if let Some(h) = self.head {
            self.slots[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }

    fn touch(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.detach(idx);
        self.push_front(idx);
    }

    fn evict_one(&mut self) {
        let Some(idx) = self.tail else { return };
        self.detach(idx);
        let slot = &self.slots[idx];
        self.used_bytes = self.used_bytes.saturating_sub(slot.byte_len);
        self.index.remove(&slot.hash);
        self.free.push(idx);
        self.slots[idx].value = None;
    }

    fn add(&mut self, hash: Hash, value: Option<Value>, byte_len: u64) {
        if let Some(&idx) = self.index.get(&hash) {
            self.used_bytes = self.used_bytes.saturating_sub(self.slots[idx].byte_len);
            self.slots[idx].value = value;
            self.slots[idx].byte_len = byte_len;
            self.used_bytes += byte_len;
            self.touch(idx);
        } else {
            let idx = match self.free.pop() {
                Some(idx) => {
                    self.slots[idx] = Slot { hash, value, byte_len, prev: None, next: None };
                    idx
                }
                None => {
                    self.slots.push(Slot { hash, value, byte_len, prev: None, next: None });
                    self.slots.len() - 1
                }
            };
            self.index.insert(hash, idx);
            self.push_front(idx);
            self.used_bytes += byte_len;
        }
        while self.used_bytes > self.capacity_bytes && self.tail.is_some() {
            self.evict_one();
        }
    }

    fn get(&mut self, hash: &Hash) -> Option<Option<Value>> {
        let idx = *self.index.get(hash)?;
        let value = self.slots[idx].value.clone();
        self.touch(idx);
        Some(value)
    }

    fn drop_entry(&mut self, hash: &Hash) {
        if let Some(idx) = self.index.remove(hash) {
            self.detach(idx);
            self.used_bytes = self.used_bytes.saturating_sub(self.slots[idx].byte_len);
            self.slots[idx].value = None;
            self.free.push(idx);
        }
    }
}

pub struct LruValueCache {
    inner: Mutex<Lru>,
}

impl LruValueCache {
    pub fn new(capacity_bytes: u64) -> Self {
        LruValueCache { inner: Mutex::new(Lru::new(capacity_bytes)) }
    }
}

impl ValueCache for LruValueCache {
    fn get(&self, hash: &Hash) -> Option<Option<Value>> {
        self.inner.lock().unwrap().get(hash)
    }

    fn add(&self, hash: Hash, value: Option<Value>, encoded_len: u64) {
        self.inner.lock().unwrap().add(hash, value, encoded_len);
    }

    fn drop_entry(&self, hash: &Hash) {
        self.inner.lock().unwrap().drop_entry(hash);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use noms_types::Number;
    use test_log::test;

    #[test]
    fn recently_touched_entries_survive_eviction() {
        let cache = LruValueCache::new(100);
        let a = Hash::of_bytes(b"a");
        let b = Hash::of_bytes(b"b");
        let c = Hash::of_bytes(b"c");
        cache.add(a, Some(Value::Number(Number::from_i64(1))), 40);
        cache.add(b, Some(Value::Number(Number::from_i64(2))), 40);
        // touch a so it's no longer the LRU entry
        assert!(cache.get(&a).is_some());
        // this push evicts the LRU entry (b), not a
        cache.add(c, Some(Value::Number(Number::from_i64(3))), 40);
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
        assert!(cache.get(&c).is_some());
    }

    #[test]
    fn noop_cache_never_remembers_anything() {
        let cache = NoopValueCache;
        let h = Hash::of_bytes(b"x");
        cache.add(h, Some(Value::Bool(true)), 1);
        assert!(cache.get(&h).is_none());
    }
}
