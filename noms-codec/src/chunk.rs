use noms_base::{kind_err, Hash, Kind, Result};
use noms_types::Value;
use tracing::trace;

use crate::ioutil::{Reader, Writer};
use crate::value_codec::{decode_value, encode_value};

/// An immutable `(hash, bytes)` pair. `hash` is always recomputed or
/// verified against `bytes`; an empty chunk represents absence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    hash: Hash,
    bytes: Vec<u8>,
}

impl Chunk {
    pub fn empty() -> Self {
        Chunk { hash: Hash::EMPTY, bytes: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Build a chunk from bytes we already trust (our own encoder's
    /// output); recomputes the hash rather than taking one on faith.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let hash = Hash::of_bytes(&bytes);
        Chunk { hash, bytes }
    }

    /// Build a chunk from bytes that arrived over the wire, verifying
    /// the claimed hash matches.
    pub fn from_hash_and_bytes(hash: Hash, bytes: Vec<u8>) -> Result<Self> {
        let computed = Hash::of_bytes(&bytes);
        if computed != hash {
            return Err(kind_err(
                Kind::Integrity,
                format!("chunk hash mismatch: claimed {hash}, computed {computed}"),
            ));
        }
        Ok(Chunk { hash, bytes })
    }
}

/// Encode `v` into a chunk whose hash is `SHA512(bytes)[0..20]`.
pub fn encode(v: &Value) -> Result<Chunk> {
    let mut w = Writer::new();
    encode_value(&mut w, v)?;
    let chunk = Chunk::from_bytes(w.into_bytes());
    trace!(hash = %chunk.hash(), "encoded value to chunk");
    Ok(chunk)
}

/// Decode a chunk's bytes back into a value. The decoder must consume
/// every byte; a residual byte is an integrity error.
pub fn decode(chunk: &Chunk) -> Result<Value> {
    let mut r = Reader::new(chunk.bytes());
    let v = decode_value(&mut r)?;
    if !r.at_end() {
        return Err(kind_err(Kind::Integrity, "decode left unconsumed bytes"));
    }
    Ok(v)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn encode_decode_round_trips() {
        let v = Value::String("abc".to_string());
        let chunk = encode(&v).unwrap();
        let decoded = decode(&chunk).unwrap();
        assert!(matches!(decoded, Value::String(s) if s == "abc"));
    }

    #[test]
    fn hash_is_stable_across_repeated_encodes() {
        let v = Value::Number(noms_types::Number::from_i64(0));
        let a = encode(&v).unwrap();
        let b = encode(&v).unwrap();
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn wire_hash_mismatch_is_rejected() {
        let bad = Chunk::from_hash_and_bytes(Hash::EMPTY, b"not empty".to_vec());
        assert!(bad.is_err());
    }

    #[test]
    fn empty_chunk_represents_absence() {
        assert!(Chunk::empty().is_empty());
        assert_eq!(Chunk::empty().hash(), Hash::EMPTY);
    }
}
