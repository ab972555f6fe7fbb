// The `mem` dataset-spec backend: an in-process `ChunkStoreTransport` +
// `RootStore` with no actual network involved. Real deployments sit an
// HTTP client behind the same two traits; this is what a bare `mem` spec
// resolves to.

use std::collections::HashMap;
use std::sync::Mutex;

use noms_base::{Hash, Result};
use noms_codec::Chunk;

use crate::transport::{ChunkStoreTransport, RootStore};

pub struct MemTransport {
    chunks: Mutex<HashMap<Hash, Vec<u8>>>,
    root: Mutex<Hash>,
}

impl MemTransport {
    pub fn new() -> Self {
        MemTransport { chunks: Mutex::new(HashMap::new()), root: Mutex::new(Hash::EMPTY) }
    }
}

impl Default for MemTransport {
    fn default() -> Self {
        MemTransport::new()
    }
}

impl ChunkStoreTransport for MemTransport {
    fn get_batch(&self, hashes: &[Hash]) -> Result<Vec<Chunk>> {
        let guard = self.chunks.lock().unwrap();
        let mut out = Vec::with_capacity(hashes.len());
        for h in hashes {
            match guard.get(h) {
                Some(bytes) => out.push(Chunk::from_hash_and_bytes(*h, bytes.clone())?),
                None => out.push(Chunk::empty()),
            }
        }
        Ok(out)
    }

    fn put_batch(&self, chunks: Vec<Chunk>, _hints: Vec<Hash>) -> Result<()> {
        let mut guard = self.chunks.lock().unwrap();
        for c in chunks {
            guard.insert(c.hash(), c.bytes().to_vec());
        }
        Ok(())
    }
}

impl RootStore for MemTransport {
    fn root(&self) -> Result<Hash> {
        Ok(*self.root.lock().unwrap())
    }

    fn update_root(&self, current: Hash, last: Hash) -> Result<bool> {
        let mut guard = self.root.lock().unwrap();
        if *guard != last {
            return Ok(false);
        }
        *guard = current;
        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use noms_types::Value;
    use test_log::test;

    #[test]
    fn update_root_is_compare_and_set() {
        let t = MemTransport::new();
        assert_eq!(t.root().unwrap(), Hash::EMPTY);
        let a = Hash::of_bytes(b"a");
        assert!(t.update_root(a, Hash::EMPTY).unwrap());
        assert_eq!(t.root().unwrap(), a);
        // stale `last` loses the race
        let b = Hash::of_bytes(b"b");
        assert!(!t.update_root(b, Hash::EMPTY).unwrap());
        assert_eq!(t.root().unwrap(), a);
    }

    #[test]
    fn unknown_hash_reads_as_empty_chunk() {
        let t = MemTransport::new();
        let got = t.get_batch(&[Hash::of_bytes(b"nope")]).unwrap();
        assert_eq!(got.len(), 1);
        assert!(got[0].is_empty());
    }

    #[test]
    fn put_then_get_round_trips() {
        let t = MemTransport::new();
        let c = noms_codec::encode(&Value::String("abc".to_string())).unwrap();
        t.put_batch(vec![c.clone()], Vec::new()).unwrap();
        let got = t.get_batch(&[c.hash()]).unwrap();
        assert_eq!(got[0].bytes(), c.bytes());
    }
}
