// The read-through/write-through caching layer. Everything above this
// (trees, datasets) talks to hashes and values; only this module knows
// about the hash cache, the value cache, and the pending-put map that
// make repeated access to the same chunk cheap and let a batch of writes
// coalesce before anything touches the backing store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use noms_base::{kind_err, Hash, Kind, Result};
use noms_codec::Chunk;
use noms_tree::ValueReader;
use noms_types::{Ref, Sequence, SequenceBody, Value};
use tracing::trace;

use crate::chunk_store::ChunkStore;
use crate::hash_cache::HashCache;
use crate::value_cache::ValueCache;

/// Walk `v`'s own structure (never crossing a `Ref` boundary, since the
/// ref's target isn't inline) and collect every `Ref` reachable from it.
/// These are exactly the children `writeValue` must have already seen
/// written, and the basis for both the written ref's height and its hints.
pub fn child_refs(v: &Value) -> Vec<Ref> {
    let mut out = Vec::new();
    collect_child_refs(v, &mut out);
    out
}

fn collect_child_refs(v: &Value, out: &mut Vec<Ref>) {
    match v {
        Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Type(_) => {}
        Value::Ref(r) => out.push(r.clone()),
        Value::Struct(s) => {
            for field in s.values() {
                collect_child_refs(field, out);
            }
        }
        Value::Blob(seq) => collect_sequence_refs(seq.as_ref(), out),
        Value::List(seq) | Value::Set(seq) => collect_sequence_refs(seq.as_ref(), out),
        Value::Map(seq) => collect_sequence_refs(seq.as_ref(), out),
    }
}

fn collect_sequence_refs(seq: &dyn Sequence, out: &mut Vec<Ref>) {
    match seq.body() {
        SequenceBody::Meta(tuples) => {
            for t in tuples {
                out.push(t.r#ref.clone());
            }
        }
        SequenceBody::Items(items) => {
            for item in items {
                collect_child_refs(item, out);
            }
        }
        SequenceBody::Entries(entries) => {
            for (k, v) in entries {
                collect_child_refs(k, out);
                collect_child_refs(v, out);
            }
        }
        SequenceBody::Bytes(_) => {}
    }
}

fn is_type_compatible(declared: &noms_types::Type, actual: &noms_types::Type) -> bool {
    noms_types::is_assignable(declared, actual)
}

pub struct ValueStore {
    backing: Arc<dyn ChunkStore>,
    hash_cache: HashCache,
    value_cache: Arc<dyn ValueCache>,
    pending: Mutex<HashMap<Hash, (Chunk, Vec<Hash>)>>,
}

impl ValueStore {
    pub fn new(backing: Arc<dyn ChunkStore>, value_cache: Arc<dyn ValueCache>) -> Self {
        ValueStore { backing, hash_cache: HashCache::new(), value_cache, pending: Mutex::new(HashMap::new()) }
    }

    fn pending_chunk(&self, hash: &Hash) -> Option<Chunk> {
        self.pending.lock().unwrap().get(hash).map(|(c, _)| c.clone())
    }

    /// Step 1-5 of `readValue`: cache hit, else pending/backing fetch,
    /// empty chunk means known-absent, otherwise decode and propagate
    /// hints to every child before caching the decoded value.
    pub fn read_value(&self, hash: &Hash) -> Result<Option<Value>> {
        if let Some(cached) = self.value_cache.get(hash) {
            trace!(%hash, "value cache hit");
            return Ok(cached);
        }

        let chunk = match self.pending_chunk(hash) {
            Some(c) => c,
            None => self.backing.get(hash)?,
        };

        if chunk.is_empty() {
            self.value_cache.add(*hash, None, 0);
            self.hash_cache.mark_absent(*hash);
            return Ok(None);
        }

        let value = noms_codec::decode(&chunk)?;
        for child in child_refs(&value) {
            self.hash_cache.hint(child.target_hash, child.target_type.clone(), *hash);
        }
        self.hash_cache.hint_top_level_if_absent(*hash, value.value_type());

        self.value_cache.add(*hash, Some(value.clone()), chunk.bytes().len() as u64);
        Ok(Some(value))
    }

    /// Step 1-5 of `writeValue`: compute the chunk and ref, short-circuit
    /// if the hash cache already knows this hash is present, otherwise
    /// assert every child's presence/type and stage the chunk as pending.
    pub fn write_value(&self, value: &Value) -> Result<Ref> {
        let chunk = noms_codec::encode(value)?;
        let hash = chunk.hash();
        let children = child_refs(value);
        let height = 1 + children.iter().map(|r| r.height).max().unwrap_or(0);
        let ref_ = Ref::new(hash, height, value.value_type());

        if let Some(entry) = self.hash_cache.get(&hash) {
            if entry.present {
                trace!(%hash, "writeValue coalesced against an already-present hash");
                return Ok(ref_);
            }
        }

        let mut hints: Vec<Hash> = Vec::new();
        for child in &children {
            let entry = self.hash_cache.get(&child.target_hash).ok_or_else(|| {
                kind_err(
                    Kind::Integrity,
                    format!("writeValue: child {} has no recorded presence", child.target_hash),
                )
            })?;
            if !entry.present {
                return Err(kind_err(
                    Kind::Integrity,
                    format!("writeValue: child {} is recorded absent", child.target_hash),
                ));
            }
            if let Some(actual) = &entry.ty {
                if !is_type_compatible(&child.target_type, actual) {
                    return Err(kind_err(
                        Kind::Type,
                        format!("writeValue: child {} type mismatch", child.target_hash),
                    ));
                }
            }
            if entry.provenance != Hash::EMPTY && !hints.contains(&entry.provenance) {
                hints.push(entry.provenance);
            }
        }

        self.pending.lock().unwrap().insert(hash, (chunk, hints));
        self.hash_cache.mark_present(hash, value.value_type(), Hash::EMPTY);
        Ok(ref_)
    }

    /// Drain pending puts to the backing store. Pending entries are
    /// topologically ordered by their recorded hints (a child's hint, if
    /// still pending, is flushed first), so a parent never reaches the
    /// backing store before the child it points at — the same causal
    /// guarantee `writeValue`'s per-write child promotion would give,
    /// applied once at flush time instead of on every write.
    pub fn flush(&self) -> Result<()> {
        let mut pending = self.pending.lock().unwrap();
        let mut remaining: HashMap<Hash, (Chunk, Vec<Hash>)> = std::mem::take(&mut *pending);
        let mut flushed_count = 0usize;
        while !remaining.is_empty() {
            let ready: Vec<Hash> = remaining
                .iter()
                .filter(|(_, (_, hints))| hints.iter().all(|h| !remaining.contains_key(h)))
                .map(|(h, _)| *h)
                .collect();
            if ready.is_empty() {
                // A hint cycle shouldn't occur for acyclic content-addressed
                // data; flush whatever is left in arbitrary order rather
                // than loop forever.
                let all: Vec<Hash> = remaining.keys().copied().collect();
                for h in all {
                    let (chunk, hints) = remaining.remove(&h).unwrap();
                    self.backing.put(chunk, hints)?;
                }
                break;
            }
            for h in ready {
                let (chunk, hints) = remaining.remove(&h).unwrap();
                self.backing.put(chunk, hints)?;
                flushed_count += 1;
            }
        }
        trace!(flushed_count, "flushed pending puts");
        self.backing.flush()
    }

    pub fn close(&self) -> Result<()> {
        self.backing.close()
    }
}

impl ValueReader for ValueStore {
    fn read_value(&self, hash: &Hash) -> Result<Value> {
        ValueStore::read_value(self, hash)?
            .ok_or_else(|| kind_err(Kind::NotFound, format!("{hash} not present")))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chunk_store::MemChunkStore;
    use crate::value_cache::{LruValueCache, NoopValueCache};
    use noms_types::Number;
    use std::sync::atomic::{AtomicBool, Ordering};
    use test_log::test;

    fn store_with(cache: Arc<dyn ValueCache>) -> (ValueStore, Arc<MemChunkStore>) {
        let backing = Arc::new(MemChunkStore::new());
        (ValueStore::new(backing.clone(), cache), backing)
    }

    #[test]
    fn round_trips_a_primitive() {
        let (store, _backing) = store_with(Arc::new(NoopValueCache));
        let r = store.write_value(&Value::Number(Number::from_i64(7))).unwrap();
        store.flush().unwrap();
        let back = store.read_value(&r.target_hash).unwrap().unwrap();
        assert_eq!(back.as_number().unwrap(), Number::from_i64(7));
    }

    #[test]
    fn unknown_hash_reads_as_none() {
        let (store, _backing) = store_with(Arc::new(NoopValueCache));
        assert!(store.read_value(&Hash::of_bytes(b"nope")).unwrap().is_none());
    }

    #[test]
    fn writing_a_ref_to_an_unwritten_child_is_rejected() {
        let (store, _backing) = store_with(Arc::new(NoopValueCache));
        let bogus_ref = Ref::new(Hash::of_bytes(b"ghost"), 0, noms_types::number_type());
        let ty = noms_types::make_struct_type("P", vec![("r".to_string(), noms_types::make_ref_type(noms_types::number_type()))]).unwrap();
        let s = noms_types::Struct::new(ty, vec![Value::Ref(bogus_ref)]).unwrap();
        assert!(store.write_value(&Value::Struct(s)).is_err());
    }

    #[test]
    fn writing_a_struct_whose_child_was_already_written_succeeds() {
        let (store, _backing) = store_with(Arc::new(NoopValueCache));
        let child_ref = store.write_value(&Value::Number(Number::from_i64(1))).unwrap();
        let ty = noms_types::make_struct_type("P", vec![("r".to_string(), noms_types::make_ref_type(noms_types::number_type()))]).unwrap();
        let s = noms_types::Struct::new(ty, vec![Value::Ref(child_ref.clone())]).unwrap();
        let parent_ref = store.write_value(&Value::Struct(s)).unwrap();
        assert_eq!(parent_ref.height, child_ref.height + 1);
    }

    /// S6: writing "hello", reading it (cache hit), then clobbering the
    /// backing `get` to throw, a second read still returns "hello" from
    /// the value cache; evicting by writing an oversized second value and
    /// re-reading the first must now throw.
    #[test]
    fn s6_cache_invalidation() {
        struct FlakyStore {
            inner: MemChunkStore,
            poisoned: AtomicBool,
        }
        impl ChunkStore for FlakyStore {
            fn get(&self, hash: &Hash) -> Result<Chunk> {
                if self.poisoned.load(Ordering::SeqCst) {
                    return Err(kind_err(Kind::Transport, "backing store unavailable"));
                }
                self.inner.get(hash)
            }
            fn put(&self, chunk: Chunk, hints: Vec<Hash>) -> Result<()> {
                self.inner.put(chunk, hints)
            }
            fn flush(&self) -> Result<()> {
                self.inner.flush()
            }
            fn close(&self) -> Result<()> {
                self.inner.close()
            }
        }

        let backing = Arc::new(FlakyStore { inner: MemChunkStore::new(), poisoned: AtomicBool::new(false) });
        // A tiny cache: one small value fits, but a second large one
        // evicts it.
        let cache: Arc<dyn ValueCache> = Arc::new(LruValueCache::new(20));
        let store = ValueStore::new(backing.clone(), cache);

        let hello_ref = store.write_value(&Value::String("hello".to_string())).unwrap();
        store.flush().unwrap();

        let first = store.read_value(&hello_ref.target_hash).unwrap().unwrap();
        assert_eq!(first.as_str().unwrap(), "hello");

        backing.poisoned.store(true, Ordering::SeqCst);
        let second = store.read_value(&hello_ref.target_hash).unwrap().unwrap();
        assert_eq!(second.as_str().unwrap(), "hello");

        backing.poisoned.store(false, Ordering::SeqCst);
        let big = "x".repeat(64);
        store.write_value(&Value::String(big)).unwrap();
        store.flush().unwrap();

        backing.poisoned.store(true, Ordering::SeqCst);
        assert!(store.read_value(&hello_ref.target_hash).is_err());
    }
}
