// The backing store a `ValueStore` writes through: something that can
// fetch a chunk by hash (an empty chunk meaning absence), accept a batch
// of puts with their hints, and flush/close. An HTTP-backed implementation
// of this trait lives downstream; an in-memory one here is enough to
// exercise the caching layer in tests without any transport.

use std::collections::HashMap;
use std::sync::Mutex;

use noms_base::{Hash, Result};
use noms_codec::Chunk;

pub trait ChunkStore: Send + Sync {
    fn get(&self, hash: &Hash) -> Result<Chunk>;
    fn put(&self, chunk: Chunk, hints: Vec<Hash>) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn close(&self) -> Result<()>;
}

/// An in-memory `ChunkStore`. Hints are accepted and discarded; there's no
/// remote peer here that needs them to find a root's dependents.
pub struct MemChunkStore {
    chunks: Mutex<HashMap<Hash, Vec<u8>>>,
}

impl MemChunkStore {
    pub fn new() -> Self {
        MemChunkStore { chunks: Mutex::new(HashMap::new()) }
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemChunkStore {
    fn default() -> Self {
        MemChunkStore::new()
    }
}

impl ChunkStore for MemChunkStore {
    fn get(&self, hash: &Hash) -> Result<Chunk> {
        match self.chunks.lock().unwrap().get(hash) {
            Some(bytes) => Ok(Chunk::from_hash_and_bytes(*hash, bytes.clone())?),
            None => Ok(Chunk::empty()),
        }
    }

    fn put(&self, chunk: Chunk, _hints: Vec<Hash>) -> Result<()> {
        self.chunks.lock().unwrap().insert(chunk.hash(), chunk.bytes().to_vec());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use noms_types::Value;
    use test_log::test;

    #[test]
    fn unknown_hash_reads_as_empty_chunk() {
        let store = MemChunkStore::new();
        let chunk = store.get(&Hash::of_bytes(b"nope")).unwrap();
        assert!(chunk.is_empty());
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = MemChunkStore::new();
        let chunk = noms_codec::encode(&Value::String("abc".to_string())).unwrap();
        store.put(chunk.clone(), Vec::new()).unwrap();
        let back = store.get(&chunk.hash()).unwrap();
        assert_eq!(back.bytes(), chunk.bytes());
    }
}
