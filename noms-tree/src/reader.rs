// Building and walking a prolly tree needs two things this crate
// deliberately doesn't own: a way to turn a `Value` into its hash (that's
// `noms-codec::encode`, used directly) and a way to fetch a child value
// that's only present as a hash somewhere else (that's this trait). The
// backing store implements it; this crate never depends on noms-store,
// so the two can be wired together without a cycle.

use std::collections::HashMap;

use noms_base::{kind_err, Hash, Kind, Result};
use noms_types::{OrderedKey, PrimitiveKey, Value};

pub trait ValueReader {
    fn read_value(&self, hash: &Hash) -> Result<Value>;
}

/// A reader that always fails. Useful for operations on values that are
/// known to be fully in memory (freshly built, not yet split across
/// fetched chunks), so a lookup miss is a bug rather than an I/O need.
pub struct NoReader;

impl ValueReader for NoReader {
    fn read_value(&self, hash: &Hash) -> Result<Value> {
        Err(kind_err(Kind::NotFound, format!("no reader available to fetch {hash}")))
    }
}

/// A `ValueReader` backed by an in-memory hash map of already-decoded
/// chunks. Built from a `build::BuiltTree`'s chunk list by whoever needs
/// to navigate a freshly built tree before it's gone through a real
/// store; also handy for tests.
pub struct MapReader(HashMap<Hash, Value>);

impl MapReader {
    pub fn new() -> Self {
        MapReader(HashMap::new())
    }

    pub fn from_chunks(chunks: &[noms_codec::Chunk]) -> Result<Self> {
        let mut map = HashMap::with_capacity(chunks.len());
        for c in chunks {
            map.insert(c.hash(), noms_codec::decode(c)?);
        }
        Ok(MapReader(map))
    }

    pub fn insert(&mut self, hash: Hash, value: Value) {
        self.0.insert(hash, value);
    }
}

impl Default for MapReader {
    fn default() -> Self {
        MapReader::new()
    }
}

impl ValueReader for MapReader {
    fn read_value(&self, hash: &Hash) -> Result<Value> {
        self.0
            .get(hash)
            .cloned()
            .ok_or_else(|| kind_err(Kind::NotFound, format!("chunk {hash} not present")))
    }
}

/// The key a value sorts by inside an ordered sequence: primitives compare
/// by value, everything else by the hash of its encoding. Two values with
/// the same ordering key are the same value, since content-addressing
/// means identical content always hashes identically.
pub fn ordering_key(v: &Value) -> Result<OrderedKey> {
    Ok(match v {
        Value::Bool(b) => OrderedKey::Primitive(PrimitiveKey::Bool(*b)),
        Value::Number(n) => OrderedKey::Primitive(PrimitiveKey::Number(*n)),
        Value::String(s) => OrderedKey::Primitive(PrimitiveKey::Str(s.clone())),
        other => OrderedKey::Hash(noms_codec::encode(other)?.hash()),
    })
}

pub fn value_eq(a: &Value, b: &Value) -> Result<bool> {
    Ok(ordering_key(a)? == ordering_key(b)?)
}
